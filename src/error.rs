use std::collections::BTreeMap;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::flash::{paths, Level, Redirect};
use crate::store::StoreError;

pub const PENDING_APPROVAL_MESSAGE: &str =
    "Your account is pending admin approval. Please wait for approval before logging in.";
pub const DEACTIVATED_MESSAGE: &str = "Your account has been deactivated. Please contact admin.";

/// Key for errors that belong to the form as a whole.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Field name to messages, in the shape a form re-render expects.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.0.keys().copied().collect();
        write!(f, "{}", fields.join(", "))
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    Validation(FieldErrors),

    #[error("access denied")]
    AccessDenied,

    #[error("profile already exists")]
    ProfileExists,

    #[error("{missing} doctor(s) do not have a clinic assigned")]
    ApprovalPrecondition { missing: u64 },

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account pending approval")]
    PendingApproval,

    #[error("account deactivated")]
    Deactivated,

    #[error("authentication required")]
    Unauthenticated,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        AppError::Validation(errors)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict("username") => {
                AppError::field("username", "A user with that username already exists.")
            }
            StoreError::Conflict("email") => {
                AppError::field("email", "A user with this email already exists.")
            }
            StoreError::Conflict("profile") => AppError::ProfileExists,
            StoreError::Conflict(field) => AppError::field(field, "Already exists."),
            StoreError::Database(e) => AppError::Internal(e.into()),
        }
    }
}

/// A body that could not be read as the expected form. axum's message names
/// the offending path, e.g. `experience_years: invalid type: string "seven"`.
impl From<JsonRejection> for AppError {
    fn from(rej: JsonRejection) -> Self {
        warn!(status = %rej.status(), error = %rej.body_text(), "rejected request body");
        AppError::field(NON_FIELD_ERRORS, rej.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "errors": errors.0 })),
            )
                .into_response(),
            AppError::AccessDenied => Redirect::to(paths::DASHBOARD)
                .flash(Level::Error, "Access denied.")
                .into_response(),
            AppError::ProfileExists => Redirect::to(paths::DASHBOARD)
                .flash(Level::Info, "Profile already exists.")
                .into_response(),
            AppError::ApprovalPrecondition { missing } => (
                StatusCode::CONFLICT,
                Json(json!({
                    "level": "warning",
                    "message": format!(
                        "Warning: {missing} doctor(s) do not have a clinic assigned. \
                         Please assign clinics individually before approving."
                    ),
                    "missing_clinic": missing,
                })),
            )
                .into_response(),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid username or password." })),
            )
                .into_response(),
            AppError::PendingApproval => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": PENDING_APPROVAL_MESSAGE })),
            )
                .into_response(),
            AppError::Deactivated => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": DEACTIVATED_MESSAGE })),
            )
                .into_response(),
            AppError::Unauthenticated => Redirect::to(paths::LOGIN)
                .flash(Level::Info, "Please log in to continue.")
                .into_response(),
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("{what} not found") })),
            )
                .into_response(),
            AppError::Internal(e) => {
                error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn field_errors_collect_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("email", "bad");
        errors.add("email", "taken");
        errors.add("role", "missing");
        assert_eq!(errors.messages("email").len(), 2);
        assert!(errors.has("role"));
        assert!(errors.into_result().is_err());
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn store_conflicts_become_form_errors() {
        match AppError::from(StoreError::Conflict("email")) {
            AppError::Validation(errors) => {
                assert_eq!(errors.messages("email"), ["A user with this email already exists."])
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            AppError::from(StoreError::Conflict("profile")),
            AppError::ProfileExists
        ));
    }

    #[test]
    fn response_statuses() {
        assert_eq!(
            AppError::Validation(FieldErrors::new()).into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::ApprovalPrecondition { missing: 2 }.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InvalidCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::PendingApproval.into_response().status(),
            StatusCode::FORBIDDEN
        );
        let res = AppError::Unauthenticated.into_response();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/login");
    }
}
