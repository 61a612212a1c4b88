use crate::accounts::repo_types::{DoctorProfile, PatientProfile};
use crate::accounts::services::AccountView;
use crate::accounts::standing::Standing;
use crate::flash::paths;

pub const PENDING_NOTICE: &str = "Your account is pending admin approval.";
pub const NO_CONSOLE_MESSAGE: &str =
    "Your admin account has no console access. Please contact a staff administrator.";

/// Where a dashboard request ends up.
#[derive(Debug, Clone)]
pub enum Destination {
    Redirect(&'static str),
    PatientDashboard(PatientProfile),
    DoctorDashboard(DoctorProfile),
    PendingApproval,
    Deactivated,
    /// An ADMIN without staff rights; the console would bounce them back.
    NoConsole,
}

/// Role-keyed dispatch over the account's current standing. Staff admins skip
/// the profile states and go to the console.
pub fn route(view: AccountView, is_staff: bool) -> Destination {
    match view {
        AccountView::Admin if is_staff => Destination::Redirect(paths::ADMIN),
        AccountView::Admin => Destination::NoConsole,
        AccountView::Patient(standing) => match standing {
            Standing::NoProfile => Destination::Redirect(paths::CREATE_PATIENT_PROFILE),
            Standing::PendingApproval(_) => Destination::PendingApproval,
            Standing::Deactivated(_) => Destination::Deactivated,
            Standing::Active(profile) => Destination::PatientDashboard(profile),
        },
        AccountView::Doctor(standing) => match standing {
            Standing::NoProfile => Destination::Redirect(paths::CREATE_DOCTOR_PROFILE),
            Standing::PendingApproval(_) => Destination::PendingApproval,
            Standing::Deactivated(_) => Destination::Deactivated,
            Standing::Active(profile) => Destination::DoctorDashboard(profile),
        },
    }
}
