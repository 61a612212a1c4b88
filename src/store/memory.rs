use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AccountStore, ApprovalOutcome, DoctorFilter, StoreError, StoreResult};
use crate::accounts::repo_types::{
    Clinic, DoctorProfile, NewClinic, NewDoctorProfile, NewPatientProfile, NewUser,
    PatientProfile, Session, User,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    sessions: HashMap<Uuid, Session>,
    clinics: HashMap<Uuid, Clinic>,
    patients: HashMap<Uuid, PatientProfile>,
    doctors: HashMap<Uuid, DoctorProfile>,
}

/// Process-local store with the same uniqueness rules as the Postgres schema.
/// Every write holds the single table lock, so batch updates are atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let mut t = self.tables.write().await;
        if t.users.values().any(|u| u.username == new.username) {
            return Err(StoreError::Conflict("username"));
        }
        if t.users.values().any(|u| u.email == new.email) {
            return Err(StoreError::Conflict("email"));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            first_name: new.first_name,
            last_name: new.last_name,
            role: new.role,
            is_staff: new.is_staff,
            is_superuser: new.is_superuser,
            is_active: true,
            date_joined: OffsetDateTime::now_utc(),
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.username == username).cloned())
    }

    async fn username_exists(&self, username: &str) -> StoreResult<bool> {
        let t = self.tables.read().await;
        Ok(t.users.values().any(|u| u.username == username))
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let t = self.tables.read().await;
        Ok(t.users.values().any(|u| u.email == email))
    }

    async fn count_users(&self) -> StoreResult<u64> {
        Ok(self.tables.read().await.users.len() as u64)
    }

    async fn create_session(&self, user_id: Uuid) -> StoreResult<Session> {
        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            created_at: OffsetDateTime::now_utc(),
        };
        self.tables
            .write()
            .await
            .sessions
            .insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_session(&self, id: Uuid) -> StoreResult<Option<Session>> {
        Ok(self.tables.read().await.sessions.get(&id).cloned())
    }

    async fn delete_session(&self, id: Uuid) -> StoreResult<()> {
        self.tables.write().await.sessions.remove(&id);
        Ok(())
    }

    async fn patient_profile(&self, user_id: Uuid) -> StoreResult<Option<PatientProfile>> {
        let t = self.tables.read().await;
        Ok(t.patients.values().find(|p| p.user_id == user_id).cloned())
    }

    async fn doctor_profile(&self, user_id: Uuid) -> StoreResult<Option<DoctorProfile>> {
        let t = self.tables.read().await;
        Ok(t.doctors.values().find(|p| p.user_id == user_id).cloned())
    }

    async fn create_patient_profile(
        &self,
        user_id: Uuid,
        new: NewPatientProfile,
    ) -> StoreResult<PatientProfile> {
        let mut t = self.tables.write().await;
        if t.patients.values().any(|p| p.user_id == user_id) {
            return Err(StoreError::Conflict("profile"));
        }
        let now = OffsetDateTime::now_utc();
        let profile = PatientProfile {
            id: Uuid::new_v4(),
            user_id,
            date_of_birth: new.date_of_birth,
            gender: new.gender,
            phone_number: new.phone_number,
            address: new.address,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        t.patients.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn create_doctor_profile(
        &self,
        user_id: Uuid,
        new: NewDoctorProfile,
        ending_session: Option<Uuid>,
    ) -> StoreResult<DoctorProfile> {
        let mut t = self.tables.write().await;
        if t.doctors.values().any(|p| p.user_id == user_id) {
            return Err(StoreError::Conflict("profile"));
        }
        let now = OffsetDateTime::now_utc();
        let profile = DoctorProfile {
            id: Uuid::new_v4(),
            user_id,
            clinic_id: None,
            specialization: new.specialization,
            qualification: new.qualification,
            experience_years: new.experience_years,
            is_approved: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        t.doctors.insert(profile.id, profile.clone());
        if let Some(sid) = ending_session {
            t.sessions.remove(&sid);
        }
        Ok(profile)
    }

    async fn set_patient_active(
        &self,
        profile_id: Uuid,
        is_active: bool,
    ) -> StoreResult<Option<PatientProfile>> {
        let mut t = self.tables.write().await;
        Ok(t.patients.get_mut(&profile_id).map(|p| {
            p.is_active = is_active;
            p.updated_at = OffsetDateTime::now_utc();
            p.clone()
        }))
    }

    async fn set_doctor_active(
        &self,
        profile_id: Uuid,
        is_active: bool,
    ) -> StoreResult<Option<DoctorProfile>> {
        let mut t = self.tables.write().await;
        Ok(t.doctors.get_mut(&profile_id).map(|p| {
            p.is_active = is_active;
            p.updated_at = OffsetDateTime::now_utc();
            p.clone()
        }))
    }

    async fn create_clinic(&self, new: NewClinic) -> StoreResult<Clinic> {
        let now = OffsetDateTime::now_utc();
        let clinic = Clinic {
            id: Uuid::new_v4(),
            name: new.name,
            address: new.address,
            phone_number: new.phone_number,
            email: new.email,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };
        self.tables
            .write()
            .await
            .clinics
            .insert(clinic.id, clinic.clone());
        Ok(clinic)
    }

    async fn find_clinic(&self, id: Uuid) -> StoreResult<Option<Clinic>> {
        Ok(self.tables.read().await.clinics.get(&id).cloned())
    }

    async fn list_clinics(&self) -> StoreResult<Vec<Clinic>> {
        let t = self.tables.read().await;
        let mut rows: Vec<Clinic> = t.clinics.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn count_clinics(&self) -> StoreResult<u64> {
        Ok(self.tables.read().await.clinics.len() as u64)
    }

    async fn count_pending_doctors(&self) -> StoreResult<u64> {
        let t = self.tables.read().await;
        Ok(t.doctors.values().filter(|p| !p.is_approved).count() as u64)
    }

    async fn list_doctor_profiles(&self, filter: DoctorFilter) -> StoreResult<Vec<DoctorProfile>> {
        let t = self.tables.read().await;
        let mut rows: Vec<DoctorProfile> = t
            .doctors
            .values()
            .filter(|p| filter.approved.map_or(true, |a| p.is_approved == a))
            .filter(|p| filter.clinic_id.map_or(true, |c| p.clinic_id == Some(c)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn assign_clinic(
        &self,
        profile_id: Uuid,
        clinic_id: Option<Uuid>,
    ) -> StoreResult<Option<DoctorProfile>> {
        let mut t = self.tables.write().await;
        Ok(t.doctors.get_mut(&profile_id).map(|p| {
            p.clinic_id = clinic_id;
            p.updated_at = OffsetDateTime::now_utc();
            p.clone()
        }))
    }

    async fn approve_doctors(&self, profile_ids: &[Uuid]) -> StoreResult<ApprovalOutcome> {
        let mut t = self.tables.write().await;
        let missing = profile_ids
            .iter()
            .filter_map(|id| t.doctors.get(id))
            .filter(|p| p.clinic_id.is_none())
            .count() as u64;
        if missing > 0 {
            return Ok(ApprovalOutcome::MissingClinic { missing });
        }

        let now = OffsetDateTime::now_utc();
        let mut updated = 0;
        for p in t.doctors.values_mut().filter(|p| profile_ids.contains(&p.id)) {
            p.is_approved = true;
            p.updated_at = now;
            updated += 1;
        }
        Ok(ApprovalOutcome::Approved { updated })
    }

    async fn reject_doctors(&self, profile_ids: &[Uuid]) -> StoreResult<u64> {
        let mut t = self.tables.write().await;
        let now = OffsetDateTime::now_utc();
        let mut updated = 0;
        for p in t.doctors.values_mut().filter(|p| profile_ids.contains(&p.id)) {
            p.is_approved = false;
            p.updated_at = now;
            updated += 1;
        }
        Ok(updated)
    }
}
