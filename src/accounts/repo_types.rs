use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Account role, fixed when the user is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[serde(alias = "patient", alias = "Patient")]
    Patient,
    #[serde(alias = "doctor", alias = "Doctor")]
    Doctor,
    #[serde(alias = "admin", alias = "Admin")]
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Patient, Role::Doctor, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "PATIENT",
            Role::Doctor => "DOCTOR",
            Role::Admin => "ADMIN",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Patient => "Patient",
            Role::Doctor => "Doctor",
            Role::Admin => "Admin",
        }
    }

    pub fn parse(raw: &str) -> Option<Role> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR")]
pub enum Gender {
    #[sqlx(rename = "M")]
    #[serde(rename = "M")]
    Male,
    #[sqlx(rename = "F")]
    #[serde(rename = "F")]
    Female,
    #[sqlx(rename = "O")]
    #[serde(rename = "O")]
    Other,
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: OffsetDateTime,
}

/// Fields required to insert a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_staff: bool,
    pub is_superuser: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Clinic {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewClinic {
    pub name: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PatientProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date_of_birth: Option<Date>,
    pub gender: Option<Gender>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct NewPatientProfile {
    pub date_of_birth: Option<Date>,
    pub gender: Option<Gender>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub clinic_id: Option<Uuid>,
    pub specialization: String,
    pub qualification: String,
    pub experience_years: i32,
    pub is_approved: bool,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewDoctorProfile {
    pub specialization: String,
    pub qualification: String,
    pub experience_years: i32,
}

/// Server-side half of a login session; the client holds a JWT naming it.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!(Role::parse("doctor"), Some(Role::Doctor));
        assert_eq!(Role::parse(" PATIENT "), Some(Role::Patient));
        assert_eq!(Role::parse("nurse"), None);
    }

    #[test]
    fn role_serializes_uppercase_and_accepts_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let role: Role = serde_json::from_str("\"doctor\"").unwrap();
        assert_eq!(role, Role::Doctor);
    }

    #[test]
    fn gender_uses_single_letter_codes() {
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"F\"");
        let g: Gender = serde_json::from_str("\"O\"").unwrap();
        assert_eq!(g, Gender::Other);
        assert!(serde_json::from_str::<Gender>("\"X\"").is_err());
    }
}
