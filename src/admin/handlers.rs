use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    accounts::repo_types::{Clinic, DoctorProfile, PatientProfile},
    admin::{
        dto::{ActiveRequest, AssignClinicRequest, BulkResult, BulkSelection, ClinicForm,
              DoctorQuery, Overview},
        services,
    },
    auth::StaffUser,
    error::AppResult,
    forms::FormJson,
    state::AppState,
    store::DoctorFilter,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(console))
        .route("/admin/clinics", get(list_clinics).post(create_clinic))
        .route("/admin/doctors", get(list_doctors))
        .route("/admin/doctors/approve", post(approve_doctors))
        .route("/admin/doctors/reject", post(reject_doctors))
        .route("/admin/doctors/:id/clinic", put(assign_clinic))
        .route("/admin/doctors/:id/active", put(set_doctor_active))
        .route("/admin/patients/:id/active", put(set_patient_active))
}

#[instrument(skip(state, _staff))]
pub async fn console(
    State(state): State<AppState>,
    _staff: StaffUser,
) -> AppResult<Json<Overview>> {
    Ok(Json(services::overview(state.store.as_ref()).await?))
}

#[instrument(skip(state, _staff))]
pub async fn list_clinics(
    State(state): State<AppState>,
    _staff: StaffUser,
) -> AppResult<Json<Vec<Clinic>>> {
    Ok(Json(state.store.list_clinics().await?))
}

#[instrument(skip(state, _staff, form))]
pub async fn create_clinic(
    State(state): State<AppState>,
    _staff: StaffUser,
    FormJson(form): FormJson<ClinicForm>,
) -> AppResult<(StatusCode, Json<Clinic>)> {
    let clinic = services::create_clinic(state.store.as_ref(), form).await?;
    Ok((StatusCode::CREATED, Json(clinic)))
}

#[instrument(skip(state, _staff))]
pub async fn list_doctors(
    State(state): State<AppState>,
    _staff: StaffUser,
    Query(q): Query<DoctorQuery>,
) -> AppResult<Json<Vec<DoctorProfile>>> {
    let rows = state
        .store
        .list_doctor_profiles(DoctorFilter {
            approved: q.approved,
            clinic_id: q.clinic_id,
        })
        .await?;
    Ok(Json(rows))
}

#[instrument(skip(state, staff, body), fields(admin_id = %staff.0.user.id, selected = body.ids.len()))]
pub async fn approve_doctors(
    State(state): State<AppState>,
    staff: StaffUser,
    FormJson(body): FormJson<BulkSelection>,
) -> AppResult<Json<BulkResult>> {
    Ok(Json(
        services::approve_doctors(state.store.as_ref(), body.ids).await?,
    ))
}

#[instrument(skip(state, staff, body), fields(admin_id = %staff.0.user.id, selected = body.ids.len()))]
pub async fn reject_doctors(
    State(state): State<AppState>,
    staff: StaffUser,
    FormJson(body): FormJson<BulkSelection>,
) -> AppResult<Json<BulkResult>> {
    Ok(Json(
        services::reject_doctors(state.store.as_ref(), body.ids).await?,
    ))
}

#[instrument(skip(state, _staff, body))]
pub async fn assign_clinic(
    State(state): State<AppState>,
    _staff: StaffUser,
    Path(id): Path<Uuid>,
    FormJson(body): FormJson<AssignClinicRequest>,
) -> AppResult<Json<DoctorProfile>> {
    Ok(Json(
        services::assign_clinic(state.store.as_ref(), id, body.clinic_id).await?,
    ))
}

#[instrument(skip(state, _staff, body))]
pub async fn set_doctor_active(
    State(state): State<AppState>,
    _staff: StaffUser,
    Path(id): Path<Uuid>,
    FormJson(body): FormJson<ActiveRequest>,
) -> AppResult<Json<DoctorProfile>> {
    Ok(Json(
        services::set_doctor_active(state.store.as_ref(), id, body.is_active).await?,
    ))
}

#[instrument(skip(state, _staff, body))]
pub async fn set_patient_active(
    State(state): State<AppState>,
    _staff: StaffUser,
    Path(id): Path<Uuid>,
    FormJson(body): FormJson<ActiveRequest>,
) -> AppResult<Json<PatientProfile>> {
    Ok(Json(
        services::set_patient_active(state.store.as_ref(), id, body.is_active).await?,
    ))
}
