use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::accounts::repo_types::{
    Clinic, DoctorProfile, NewClinic, NewDoctorProfile, NewPatientProfile, NewUser,
    PatientProfile, Session, User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write; names the offending field.
    #[error("{0} already exists")]
    Conflict(&'static str),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of a bulk approval attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    Approved { updated: u64 },
    /// Nothing was written; `missing` selected profiles have no clinic.
    MissingClinic { missing: u64 },
}

#[derive(Debug, Clone, Default)]
pub struct DoctorFilter {
    pub approved: Option<bool>,
    pub clinic_id: Option<Uuid>,
}

/// Persistence for accounts, sessions, clinics and role profiles.
#[async_trait]
pub trait AccountStore: Send + Sync {
    // users
    async fn create_user(&self, new: NewUser) -> StoreResult<User>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn username_exists(&self, username: &str) -> StoreResult<bool>;
    async fn email_exists(&self, email: &str) -> StoreResult<bool>;
    async fn count_users(&self) -> StoreResult<u64>;

    // sessions
    async fn create_session(&self, user_id: Uuid) -> StoreResult<Session>;
    async fn find_session(&self, id: Uuid) -> StoreResult<Option<Session>>;
    async fn delete_session(&self, id: Uuid) -> StoreResult<()>;

    // profiles
    async fn patient_profile(&self, user_id: Uuid) -> StoreResult<Option<PatientProfile>>;
    async fn doctor_profile(&self, user_id: Uuid) -> StoreResult<Option<DoctorProfile>>;
    async fn create_patient_profile(
        &self,
        user_id: Uuid,
        new: NewPatientProfile,
    ) -> StoreResult<PatientProfile>;
    /// Inserts the profile and, in the same write, deletes `ending_session`.
    /// On failure neither change is applied.
    async fn create_doctor_profile(
        &self,
        user_id: Uuid,
        new: NewDoctorProfile,
        ending_session: Option<Uuid>,
    ) -> StoreResult<DoctorProfile>;
    async fn set_patient_active(
        &self,
        profile_id: Uuid,
        is_active: bool,
    ) -> StoreResult<Option<PatientProfile>>;
    async fn set_doctor_active(
        &self,
        profile_id: Uuid,
        is_active: bool,
    ) -> StoreResult<Option<DoctorProfile>>;

    // clinics
    async fn create_clinic(&self, new: NewClinic) -> StoreResult<Clinic>;
    async fn find_clinic(&self, id: Uuid) -> StoreResult<Option<Clinic>>;
    async fn list_clinics(&self) -> StoreResult<Vec<Clinic>>;
    async fn count_clinics(&self) -> StoreResult<u64>;

    // doctor administration
    async fn list_doctor_profiles(&self, filter: DoctorFilter) -> StoreResult<Vec<DoctorProfile>>;
    async fn count_pending_doctors(&self) -> StoreResult<u64>;
    async fn assign_clinic(
        &self,
        profile_id: Uuid,
        clinic_id: Option<Uuid>,
    ) -> StoreResult<Option<DoctorProfile>>;
    /// All-or-nothing: approves every selected profile or none of them.
    async fn approve_doctors(&self, profile_ids: &[Uuid]) -> StoreResult<ApprovalOutcome>;
    async fn reject_doctors(&self, profile_ids: &[Uuid]) -> StoreResult<u64>;
}
