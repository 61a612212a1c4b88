use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::{debug, instrument};

use crate::{
    accounts::{repo_types::Role, services::load_account},
    auth::{dto::PublicUser, CurrentUser},
    dashboard::services::{route, Destination, NO_CONSOLE_MESSAGE, PENDING_NOTICE},
    error::{AppError, AppResult, DEACTIVATED_MESSAGE},
    flash::{paths, Flash, Level, Redirect},
    state::AppState,
};

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route(paths::DASHBOARD, get(dashboard))
        .route(paths::PATIENT_DASHBOARD, get(patient_dashboard))
        .route(paths::DOCTOR_DASHBOARD, get(doctor_dashboard))
}

fn render(destination: Destination, current: &CurrentUser) -> Response {
    let user = PublicUser::from(&current.user);
    match destination {
        Destination::Redirect(path) => Redirect::to(path).into_response(),
        Destination::PatientDashboard(profile) => Json(json!({
            "dashboard": "patient",
            "user": user,
            "profile": profile,
        }))
        .into_response(),
        Destination::DoctorDashboard(profile) => Json(json!({
            "dashboard": "doctor",
            "user": user,
            "profile": profile,
        }))
        .into_response(),
        Destination::PendingApproval => Json(json!({
            "dashboard": "pending_approval",
            "user": user,
            "flash": Flash::new(Level::Warning, PENDING_NOTICE),
        }))
        .into_response(),
        Destination::Deactivated => (
            StatusCode::FORBIDDEN,
            Json(json!({
                "dashboard": "deactivated",
                "error": DEACTIVATED_MESSAGE,
            })),
        )
            .into_response(),
        Destination::NoConsole => (
            StatusCode::FORBIDDEN,
            Json(json!({
                "dashboard": "admin",
                "user": user,
                "error": NO_CONSOLE_MESSAGE,
            })),
        )
            .into_response(),
    }
}

async fn resolve(state: &AppState, current: &CurrentUser) -> AppResult<Response> {
    let view = load_account(state.store.as_ref(), &current.user).await?;
    debug!(user_id = %current.user.id, standing = ?view.standing_name(), "dashboard routing");
    Ok(render(route(view, current.user.is_staff), current))
}

#[instrument(skip(state, current), fields(user_id = %current.user.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    current: CurrentUser,
) -> AppResult<Response> {
    resolve(&state, &current).await
}

#[instrument(skip(state, current), fields(user_id = %current.user.id))]
pub async fn patient_dashboard(
    State(state): State<AppState>,
    current: CurrentUser,
) -> AppResult<Response> {
    if current.role() != Role::Patient {
        return Err(AppError::AccessDenied);
    }
    resolve(&state, &current).await
}

#[instrument(skip(state, current), fields(user_id = %current.user.id))]
pub async fn doctor_dashboard(
    State(state): State<AppState>,
    current: CurrentUser,
) -> AppResult<Response> {
    if current.role() != Role::Doctor {
        return Err(AppError::AccessDenied);
    }
    resolve(&state, &current).await
}
