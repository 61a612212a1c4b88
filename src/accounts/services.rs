use crate::accounts::repo_types::{DoctorProfile, PatientProfile, Role, User};
use crate::accounts::standing::Standing;
use crate::store::{AccountStore, StoreResult};

/// A user's role together with the standing of its role profile.
#[derive(Debug, Clone)]
pub enum AccountView {
    Patient(Standing<PatientProfile>),
    Doctor(Standing<DoctorProfile>),
    Admin,
}

impl AccountView {
    pub fn standing_name(&self) -> Option<&'static str> {
        match self {
            AccountView::Patient(s) => Some(s.name()),
            AccountView::Doctor(s) => Some(s.name()),
            AccountView::Admin => None,
        }
    }
}

/// Loads the profile matching the user's role. Admins have none.
pub async fn load_account(store: &dyn AccountStore, user: &User) -> StoreResult<AccountView> {
    Ok(match user.role {
        Role::Patient => AccountView::Patient(Standing::evaluate(
            store.patient_profile(user.id).await?,
        )),
        Role::Doctor => AccountView::Doctor(Standing::evaluate(
            store.doctor_profile(user.id).await?,
        )),
        Role::Admin => AccountView::Admin,
    })
}
