use serde::Serialize;

use crate::accounts::repo_types::{DoctorProfile, PatientProfile};

/// Flags that decide whether a profile lets its owner in.
pub trait Gated {
    /// Patients need no approval.
    fn is_approved(&self) -> bool {
        true
    }
    fn is_active(&self) -> bool;
}

impl Gated for PatientProfile {
    fn is_active(&self) -> bool {
        self.is_active
    }
}

impl Gated for DoctorProfile {
    fn is_approved(&self) -> bool {
        self.is_approved
    }
    fn is_active(&self) -> bool {
        self.is_active
    }
}

/// Where an account stands, derived from its role profile on every request.
///
/// Existence is decided first: a missing profile is `NoProfile` and never
/// reaches the approval or activation checks. Approval is checked before
/// activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "profile", rename_all = "snake_case")]
pub enum Standing<P> {
    NoProfile,
    PendingApproval(P),
    Deactivated(P),
    Active(P),
}

impl<P: Gated> Standing<P> {
    pub fn evaluate(profile: Option<P>) -> Self {
        match profile {
            None => Standing::NoProfile,
            Some(p) if !p.is_approved() => Standing::PendingApproval(p),
            Some(p) if !p.is_active() => Standing::Deactivated(p),
            Some(p) => Standing::Active(p),
        }
    }
}

impl<P> Standing<P> {
    pub fn name(&self) -> &'static str {
        match self {
            Standing::NoProfile => "no_profile",
            Standing::PendingApproval(_) => "pending_approval",
            Standing::Deactivated(_) => "deactivated",
            Standing::Active(_) => "active",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Standing::Active(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn doctor(is_approved: bool, is_active: bool) -> DoctorProfile {
        let now = OffsetDateTime::now_utc();
        DoctorProfile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            clinic_id: None,
            specialization: "Cardiology".into(),
            qualification: "MD".into(),
            experience_years: 4,
            is_approved,
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    fn patient(is_active: bool) -> PatientProfile {
        let now = OffsetDateTime::now_utc();
        PatientProfile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            date_of_birth: None,
            gender: None,
            phone_number: None,
            address: None,
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn missing_profile_is_no_profile() {
        assert_eq!(Standing::<DoctorProfile>::evaluate(None).name(), "no_profile");
        assert_eq!(Standing::<PatientProfile>::evaluate(None).name(), "no_profile");
    }

    #[test]
    fn unapproved_doctor_is_pending_even_when_deactivated() {
        assert_eq!(Standing::evaluate(Some(doctor(false, true))).name(), "pending_approval");
        assert_eq!(Standing::evaluate(Some(doctor(false, false))).name(), "pending_approval");
    }

    #[test]
    fn approved_but_inactive_doctor_is_deactivated() {
        assert_eq!(Standing::evaluate(Some(doctor(true, false))).name(), "deactivated");
        assert!(Standing::evaluate(Some(doctor(true, true))).is_active());
    }

    #[test]
    fn patients_never_wait_for_approval() {
        assert!(Standing::evaluate(Some(patient(true))).is_active());
        assert_eq!(Standing::evaluate(Some(patient(false))).name(), "deactivated");
    }
}
