use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Route paths that handlers redirect between.
pub mod paths {
    pub const REGISTER: &str = "/register";
    pub const LOGIN: &str = "/login";
    pub const LOGOUT: &str = "/logout";
    pub const CREATE_PATIENT_PROFILE: &str = "/profile/create/patient";
    pub const CREATE_DOCTOR_PROFILE: &str = "/profile/create/doctor";
    pub const DASHBOARD: &str = "/dashboard";
    pub const PATIENT_DASHBOARD: &str = "/dashboard/patient";
    pub const DOCTOR_DASHBOARD: &str = "/dashboard/doctor";
    pub const ADMIN: &str = "/admin";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

/// One-shot user-visible message attached to a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

impl Flash {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RedirectBody {
    redirect_to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    flash: Option<Flash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
}

/// `303 See Other` with a JSON body carrying the flash message and, when a
/// session was just opened, its token.
#[derive(Debug)]
pub struct Redirect {
    to: String,
    flash: Option<Flash>,
    access_token: Option<String>,
}

impl Redirect {
    pub fn to(path: impl Into<String>) -> Self {
        Self {
            to: path.into(),
            flash: None,
            access_token: None,
        }
    }

    pub fn flash(mut self, level: Level, message: impl Into<String>) -> Self {
        self.flash = Some(Flash::new(level, message));
        self
    }

    pub fn with_session(mut self, token: String) -> Self {
        self.access_token = Some(token);
        self
    }
}

impl IntoResponse for Redirect {
    fn into_response(self) -> Response {
        let location = self.to.clone();
        (
            StatusCode::SEE_OTHER,
            [(header::LOCATION, location)],
            Json(RedirectBody {
                redirect_to: self.to,
                flash: self.flash,
                access_token: self.access_token,
            }),
        )
            .into_response()
    }
}
