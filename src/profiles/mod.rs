mod dto;
pub mod handlers;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use dto::{DoctorProfileForm, PatientProfileForm};

pub fn router() -> Router<AppState> {
    handlers::profile_routes()
}
