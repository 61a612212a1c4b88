use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::flash::Level;

/// Doctor profiles picked for a bulk action.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BulkSelection {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct BulkResult {
    pub level: Level,
    pub message: String,
    pub updated: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClinicForm {
    pub name: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AssignClinicRequest {
    pub clinic_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct DoctorQuery {
    pub approved: Option<bool>,
    pub clinic_id: Option<Uuid>,
}

/// Landing data for the administrative console.
#[derive(Debug, Serialize)]
pub struct Overview {
    pub users: u64,
    pub clinics: u64,
    pub doctors_pending_approval: u64,
}
