use time::{macros::format_description, Date, OffsetDateTime};
use tracing::info;

use crate::accounts::repo_types::{
    DoctorProfile, Gender, NewDoctorProfile, NewPatientProfile, PatientProfile, Role, User,
};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::forms::{check_max_len, check_required, optional_text};
use crate::profiles::dto::{DoctorProfileForm, PatientProfileForm};
use crate::store::AccountStore;
use uuid::Uuid;

pub const DOCTOR_CREATED_MESSAGE: &str = "Profile created successfully! Your account is pending admin approval. You will be able to login once approved.";
pub const PATIENT_CREATED_MESSAGE: &str = "Profile created successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Patient,
    Doctor,
}

impl ProfileKind {
    pub fn role(self) -> Role {
        match self {
            ProfileKind::Patient => Role::Patient,
            ProfileKind::Doctor => Role::Doctor,
        }
    }
}

/// Guards both the form and the submission. An existing profile wins over a
/// role mismatch so a finished user is never told "access denied".
pub async fn ensure_can_create(
    store: &dyn AccountStore,
    user: &User,
    kind: ProfileKind,
) -> AppResult<()> {
    let exists = match kind {
        ProfileKind::Patient => store.patient_profile(user.id).await?.is_some(),
        ProfileKind::Doctor => store.doctor_profile(user.id).await?.is_some(),
    };
    if exists {
        return Err(AppError::ProfileExists);
    }
    if user.role != kind.role() {
        return Err(AppError::AccessDenied);
    }
    Ok(())
}

fn parse_gender(raw: &str) -> Option<Gender> {
    match raw {
        "M" => Some(Gender::Male),
        "F" => Some(Gender::Female),
        "O" => Some(Gender::Other),
        _ => None,
    }
}

pub fn validate_patient(form: PatientProfileForm) -> AppResult<NewPatientProfile> {
    let mut errors = FieldErrors::new();

    let date_of_birth = match optional_text(form.date_of_birth) {
        None => None,
        Some(raw) => match Date::parse(&raw, format_description!("[year]-[month]-[day]")) {
            Ok(d) if d > OffsetDateTime::now_utc().date() => {
                errors.add("date_of_birth", "Date of birth cannot be in the future.");
                None
            }
            Ok(d) => Some(d),
            Err(_) => {
                errors.add("date_of_birth", "Enter a valid date.");
                None
            }
        },
    };

    let gender = match optional_text(form.gender) {
        None => None,
        Some(raw) => {
            let parsed = parse_gender(&raw.to_uppercase());
            if parsed.is_none() {
                errors.add(
                    "gender",
                    format!("Select a valid choice. {raw} is not one of the available choices."),
                );
            }
            parsed
        }
    };

    let phone_number = optional_text(form.phone_number);
    if let Some(phone) = &phone_number {
        check_max_len(&mut errors, "phone_number", phone, 20);
    }

    errors.into_result()?;
    Ok(NewPatientProfile {
        date_of_birth,
        gender,
        phone_number,
        address: optional_text(form.address),
    })
}

pub fn validate_doctor(form: DoctorProfileForm) -> AppResult<NewDoctorProfile> {
    let mut errors = FieldErrors::new();

    let specialization = form.specialization.trim().to_string();
    if check_required(&mut errors, "specialization", &specialization) {
        check_max_len(&mut errors, "specialization", &specialization, 100);
    }
    let qualification = form.qualification.trim().to_string();
    if check_required(&mut errors, "qualification", &qualification) {
        check_max_len(&mut errors, "qualification", &qualification, 100);
    }

    let experience_years = form.experience_years.unwrap_or(0);
    if experience_years < 0 {
        errors.add(
            "experience_years",
            "Ensure this value is greater than or equal to 0.",
        );
    } else if experience_years > i32::MAX as i64 {
        errors.add("experience_years", "Ensure this value is a realistic number of years.");
    }

    errors.into_result()?;
    Ok(NewDoctorProfile {
        specialization,
        qualification,
        experience_years: experience_years as i32,
    })
}

pub async fn create_patient_profile(
    store: &dyn AccountStore,
    user: &User,
    form: PatientProfileForm,
) -> AppResult<PatientProfile> {
    ensure_can_create(store, user, ProfileKind::Patient).await?;
    let new = validate_patient(form)?;
    let profile = store.create_patient_profile(user.id, new).await?;
    info!(user_id = %user.id, profile_id = %profile.id, "patient profile created");
    Ok(profile)
}

/// Creates the doctor profile and ends the session that submitted it; the
/// account stays unusable until an admin approves it.
pub async fn create_doctor_profile(
    store: &dyn AccountStore,
    user: &User,
    session_id: Uuid,
    form: DoctorProfileForm,
) -> AppResult<DoctorProfile> {
    ensure_can_create(store, user, ProfileKind::Doctor).await?;
    let new = validate_doctor(form)?;
    let profile = store
        .create_doctor_profile(user.id, new, Some(session_id))
        .await?;
    info!(user_id = %user.id, profile_id = %profile.id, "doctor profile created, session closed");
    Ok(profile)
}
