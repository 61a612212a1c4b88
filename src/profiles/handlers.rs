use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::CurrentUser,
    error::AppResult,
    flash::{paths, Level, Redirect},
    forms::{Choice, FormDescriptor, FormJson},
    profiles::{
        dto::{DoctorProfileForm, PatientProfileForm},
        services::{
            create_doctor_profile, create_patient_profile, ensure_can_create, ProfileKind,
            DOCTOR_CREATED_MESSAGE, PATIENT_CREATED_MESSAGE,
        },
    },
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route(
            paths::CREATE_PATIENT_PROFILE,
            get(patient_form).post(create_patient),
        )
        .route(
            paths::CREATE_DOCTOR_PROFILE,
            get(doctor_form).post(create_doctor),
        )
}

#[instrument(skip(state, current), fields(user_id = %current.user.id))]
pub async fn patient_form(
    State(state): State<AppState>,
    current: CurrentUser,
) -> AppResult<Json<FormDescriptor>> {
    ensure_can_create(state.store.as_ref(), &current.user, ProfileKind::Patient).await?;
    Ok(Json(FormDescriptor {
        form: "patient_profile",
        action: paths::CREATE_PATIENT_PROFILE,
        fields: &["date_of_birth", "gender", "phone_number", "address"],
        choices: vec![
            Choice { value: "M", label: "Male" },
            Choice { value: "F", label: "Female" },
            Choice { value: "O", label: "Other" },
        ],
    }))
}

#[instrument(skip(state, current, form), fields(user_id = %current.user.id))]
pub async fn create_patient(
    State(state): State<AppState>,
    current: CurrentUser,
    FormJson(form): FormJson<PatientProfileForm>,
) -> AppResult<Redirect> {
    create_patient_profile(state.store.as_ref(), &current.user, form).await?;
    Ok(Redirect::to(paths::DASHBOARD).flash(Level::Success, PATIENT_CREATED_MESSAGE))
}

#[instrument(skip(state, current), fields(user_id = %current.user.id))]
pub async fn doctor_form(
    State(state): State<AppState>,
    current: CurrentUser,
) -> AppResult<Json<FormDescriptor>> {
    ensure_can_create(state.store.as_ref(), &current.user, ProfileKind::Doctor).await?;
    Ok(Json(FormDescriptor {
        form: "doctor_profile",
        action: paths::CREATE_DOCTOR_PROFILE,
        fields: &["specialization", "qualification", "experience_years"],
        choices: Vec::new(),
    }))
}

#[instrument(skip(state, current, form), fields(user_id = %current.user.id))]
pub async fn create_doctor(
    State(state): State<AppState>,
    current: CurrentUser,
    FormJson(form): FormJson<DoctorProfileForm>,
) -> AppResult<Redirect> {
    create_doctor_profile(state.store.as_ref(), &current.user, current.session_id, form).await?;
    Ok(Redirect::to(paths::LOGIN).flash(Level::Success, DOCTOR_CREATED_MESSAGE))
}
