use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    accounts::repo_types::Role,
    auth::{
        dto::{LoginRequest, RegisterRequest},
        extractors::CurrentUser,
        jwt::JwtKeys,
        services::{
            after_registration, create_account, login as check_login, open_session,
            validate_registration, LoginDecision,
        },
    },
    error::AppResult,
    flash::{paths, Level, Redirect},
    forms::{Choice, FormDescriptor, FormJson},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(paths::REGISTER, get(register_form).post(register))
        .route(paths::LOGIN, get(login_form).post(login))
        .route(paths::LOGOUT, get(logout).post(logout))
}

fn already_logged_in() -> Response {
    Redirect::to(paths::DASHBOARD).into_response()
}

pub async fn register_form(current: Option<CurrentUser>) -> Response {
    if current.is_some() {
        return already_logged_in();
    }
    Json(FormDescriptor {
        form: "register",
        action: paths::REGISTER,
        fields: &[
            "username",
            "email",
            "password1",
            "password2",
            "role",
            "first_name",
            "last_name",
        ],
        choices: Role::ALL
            .iter()
            .map(|r| Choice {
                value: r.as_str(),
                label: r.label(),
            })
            .collect(),
    })
    .into_response()
}

#[instrument(skip(state, current, payload))]
pub async fn register(
    State(state): State<AppState>,
    current: Option<CurrentUser>,
    FormJson(payload): FormJson<RegisterRequest>,
) -> AppResult<Response> {
    if current.is_some() {
        return Ok(already_logged_in());
    }

    let valid = validate_registration(state.store.as_ref(), payload).await?;
    let user = create_account(state.store.as_ref(), valid, false).await?;

    let keys = JwtKeys::from_ref(&state);
    let token = open_session(state.store.as_ref(), &keys, &user).await?;

    Ok(Redirect::to(after_registration(user.role))
        .with_session(token)
        .into_response())
}

pub async fn login_form(current: Option<CurrentUser>) -> Response {
    if current.is_some() {
        return already_logged_in();
    }
    Json(FormDescriptor {
        form: "login",
        action: paths::LOGIN,
        fields: &["username", "password"],
        choices: Vec::new(),
    })
    .into_response()
}

#[instrument(skip(state, current, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    current: Option<CurrentUser>,
    FormJson(payload): FormJson<LoginRequest>,
) -> AppResult<Response> {
    if current.is_some() {
        return Ok(already_logged_in());
    }

    let (user, decision) =
        check_login(state.store.as_ref(), &payload.username, &payload.password).await?;

    match decision {
        LoginDecision::CompleteProfile(path) => {
            // Registration incomplete: no session, no denial.
            info!(user_id = %user.id, "login redirected to profile creation");
            Ok(Redirect::to(path).into_response())
        }
        LoginDecision::Admit => {
            let keys = JwtKeys::from_ref(&state);
            let token = open_session(state.store.as_ref(), &keys, &user).await?;
            info!(user_id = %user.id, role = %user.role, "user logged in");
            Ok(Redirect::to(paths::DASHBOARD)
                .with_session(token)
                .into_response())
        }
    }
}

#[instrument(skip(state, current), fields(user_id = %current.user.id))]
pub async fn logout(State(state): State<AppState>, current: CurrentUser) -> AppResult<Redirect> {
    state.store.delete_session(current.session_id).await?;
    info!(session_id = %current.session_id, "user logged out");
    Ok(Redirect::to(paths::LOGIN).flash(Level::Success, "You have been logged out successfully."))
}
