use tracing::{info, warn};
use uuid::Uuid;

use crate::accounts::repo_types::{Clinic, DoctorProfile, NewClinic, PatientProfile};
use crate::admin::dto::{BulkResult, ClinicForm, Overview};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::flash::Level;
use crate::forms::{
    check_max_len, check_required, is_valid_email, normalize_email, optional_text, EMAIL_MAX_LEN,
};
use crate::store::{AccountStore, ApprovalOutcome};

fn selection(ids: Vec<Uuid>) -> AppResult<Vec<Uuid>> {
    let mut ids = ids;
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Err(AppError::field(
            "ids",
            "Items must be selected in order to perform actions on them.",
        ));
    }
    Ok(ids)
}

/// Approves the whole selection, or nothing if any selected doctor lacks a
/// clinic.
pub async fn approve_doctors(store: &dyn AccountStore, ids: Vec<Uuid>) -> AppResult<BulkResult> {
    let ids = selection(ids)?;
    match store.approve_doctors(&ids).await? {
        ApprovalOutcome::MissingClinic { missing } => {
            warn!(selected = ids.len(), missing, "approval rejected: doctors without clinic");
            Err(AppError::ApprovalPrecondition { missing })
        }
        ApprovalOutcome::Approved { updated } => {
            info!(updated, "doctors approved");
            Ok(BulkResult {
                level: Level::Success,
                message: format!("{updated} doctor(s) approved successfully."),
                updated,
            })
        }
    }
}

pub async fn reject_doctors(store: &dyn AccountStore, ids: Vec<Uuid>) -> AppResult<BulkResult> {
    let ids = selection(ids)?;
    let updated = store.reject_doctors(&ids).await?;
    info!(updated, "doctors rejected");
    Ok(BulkResult {
        level: Level::Success,
        message: format!("{updated} doctor(s) rejected."),
        updated,
    })
}

pub fn validate_clinic(form: ClinicForm) -> AppResult<NewClinic> {
    let mut errors = FieldErrors::new();

    let name = form.name.trim().to_string();
    if check_required(&mut errors, "name", &name) {
        check_max_len(&mut errors, "name", &name, 200);
    }
    let phone_number = optional_text(form.phone_number);
    if let Some(phone) = &phone_number {
        check_max_len(&mut errors, "phone_number", phone, 20);
    }
    let email = optional_text(form.email).map(|e| normalize_email(&e));
    if let Some(email) = &email {
        if !is_valid_email(email) {
            errors.add("email", "Enter a valid email address.");
        }
        check_max_len(&mut errors, "email", email, EMAIL_MAX_LEN);
    }

    errors.into_result()?;
    Ok(NewClinic {
        name,
        address: optional_text(form.address),
        phone_number,
        email,
        is_active: form.is_active.unwrap_or(true),
    })
}

pub async fn create_clinic(store: &dyn AccountStore, form: ClinicForm) -> AppResult<Clinic> {
    let clinic = store.create_clinic(validate_clinic(form)?).await?;
    info!(clinic_id = %clinic.id, name = %clinic.name, "clinic created");
    Ok(clinic)
}

/// Sets or clears a doctor's clinic. The clinic must exist.
pub async fn assign_clinic(
    store: &dyn AccountStore,
    profile_id: Uuid,
    clinic_id: Option<Uuid>,
) -> AppResult<DoctorProfile> {
    if let Some(clinic_id) = clinic_id {
        if store.find_clinic(clinic_id).await?.is_none() {
            return Err(AppError::field(
                "clinic_id",
                "Select a valid choice. That choice is not one of the available choices.",
            ));
        }
    }
    let profile = store
        .assign_clinic(profile_id, clinic_id)
        .await?
        .ok_or(AppError::NotFound("doctor profile"))?;
    info!(profile_id = %profile.id, clinic_id = ?profile.clinic_id, "clinic assigned");
    Ok(profile)
}

pub async fn set_doctor_active(
    store: &dyn AccountStore,
    profile_id: Uuid,
    is_active: bool,
) -> AppResult<DoctorProfile> {
    let profile = store
        .set_doctor_active(profile_id, is_active)
        .await?
        .ok_or(AppError::NotFound("doctor profile"))?;
    info!(profile_id = %profile.id, is_active, "doctor profile activity changed");
    Ok(profile)
}

pub async fn set_patient_active(
    store: &dyn AccountStore,
    profile_id: Uuid,
    is_active: bool,
) -> AppResult<PatientProfile> {
    let profile = store
        .set_patient_active(profile_id, is_active)
        .await?
        .ok_or(AppError::NotFound("patient profile"))?;
    info!(profile_id = %profile.id, is_active, "patient profile activity changed");
    Ok(profile)
}

pub async fn overview(store: &dyn AccountStore) -> AppResult<Overview> {
    Ok(Overview {
        users: store.count_users().await?,
        clinics: store.count_clinics().await?,
        doctors_pending_approval: store.count_pending_doctors().await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::repo_types::{NewDoctorProfile, NewUser, Role};
    use crate::store::MemoryStore;

    async fn doctor(store: &MemoryStore, username: &str) -> DoctorProfile {
        let user = store
            .create_user(NewUser {
                username: username.into(),
                email: format!("{username}@x.com"),
                password_hash: "hash".into(),
                first_name: String::new(),
                last_name: String::new(),
                role: Role::Doctor,
                is_staff: false,
                is_superuser: false,
            })
            .await
            .unwrap();
        store
            .create_doctor_profile(
                user.id,
                NewDoctorProfile {
                    specialization: "Dermatology".into(),
                    qualification: "MD".into(),
                    experience_years: 2,
                },
                None,
            )
            .await
            .unwrap()
    }

    fn clinic_form(name: &str) -> ClinicForm {
        ClinicForm {
            name: name.into(),
            ..ClinicForm::default()
        }
    }

    #[tokio::test]
    async fn approve_without_clinic_names_the_count() {
        let store = MemoryStore::new();
        let a = doctor(&store, "a").await;
        let b = doctor(&store, "b").await;
        let err = approve_doctors(&store, vec![a.id, b.id]).await.unwrap_err();
        assert!(matches!(err, AppError::ApprovalPrecondition { missing: 2 }));
    }

    #[tokio::test]
    async fn approve_reports_batch_size() {
        let store = MemoryStore::new();
        let clinic = create_clinic(&store, clinic_form("Central")).await.unwrap();
        let a = doctor(&store, "a").await;
        let b = doctor(&store, "b").await;
        assign_clinic(&store, a.id, Some(clinic.id)).await.unwrap();
        assign_clinic(&store, b.id, Some(clinic.id)).await.unwrap();

        // duplicates in the selection count once
        let result = approve_doctors(&store, vec![a.id, b.id, a.id]).await.unwrap();
        assert_eq!(result.updated, 2);
        assert_eq!(result.message, "2 doctor(s) approved successfully.");
    }

    #[tokio::test]
    async fn reject_reports_count() {
        let store = MemoryStore::new();
        let a = doctor(&store, "a").await;
        let result = reject_doctors(&store, vec![a.id]).await.unwrap();
        assert_eq!(result.message, "1 doctor(s) rejected.");
    }

    #[tokio::test]
    async fn empty_selection_is_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(
            approve_doctors(&store, Vec::new()).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn assign_unknown_clinic_or_profile() {
        let store = MemoryStore::new();
        let a = doctor(&store, "a").await;
        assert!(matches!(
            assign_clinic(&store, a.id, Some(Uuid::new_v4())).await.unwrap_err(),
            AppError::Validation(_)
        ));
        assert!(matches!(
            assign_clinic(&store, Uuid::new_v4(), None).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[test]
    fn clinic_validation() {
        let err = validate_clinic(ClinicForm {
            name: String::new(),
            email: Some("nope".into()),
            ..ClinicForm::default()
        })
        .unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.has("name"));
        assert!(errors.has("email"));

        let err = validate_clinic(ClinicForm {
            name: "Riverside".into(),
            email: Some(format!("{}@clinic.org", "b".repeat(250))),
            ..ClinicForm::default()
        })
        .unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            errors.messages("email"),
            ["Ensure this value has at most 254 characters."]
        );

        let ok = validate_clinic(clinic_form("  Riverside  ")).unwrap();
        assert_eq!(ok.name, "Riverside");
        assert!(ok.is_active);
    }

    #[tokio::test]
    async fn overview_counts_pending_doctors() {
        let store = MemoryStore::new();
        doctor(&store, "a").await;
        create_clinic(&store, clinic_form("Central")).await.unwrap();
        let o = overview(&store).await.unwrap();
        assert_eq!(o.users, 1);
        assert_eq!(o.clinics, 1);
        assert_eq!(o.doctors_pending_approval, 1);
    }
}
