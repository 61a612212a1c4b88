use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use super::{AccountStore, ApprovalOutcome, DoctorFilter, StoreError, StoreResult};
use crate::accounts::repo_types::{
    Clinic, DoctorProfile, NewClinic, NewDoctorProfile, NewPatientProfile, NewUser,
    PatientProfile, Session, User,
};

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, role, \
                            is_staff, is_superuser, is_active, date_joined";
const PATIENT_COLUMNS: &str = "id, user_id, date_of_birth, gender, phone_number, address, \
                               is_active, created_at, updated_at";
const DOCTOR_COLUMNS: &str = "id, user_id, clinic_id, specialization, qualification, \
                              experience_years, is_approved, is_active, created_at, updated_at";
const CLINIC_COLUMNS: &str =
    "id, name, address, phone_number, email, is_active, created_at, updated_at";

/// Maps unique violations onto the field they guard.
fn conflict_or(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let field = match db.constraint() {
                Some("users_username_key") => "username",
                Some("users_email_key") => "email",
                Some("patient_profiles_user_id_key") | Some("doctor_profiles_user_id_key") => {
                    "profile"
                }
                _ => "record",
            };
            return StoreError::Conflict(field);
        }
    }
    StoreError::Database(err)
}

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, first_name, last_name,
                               role, is_staff, is_superuser)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(new.role)
        .bind(new.is_staff)
        .bind(new.is_superuser)
        .fetch_one(&self.db)
        .await
        .map_err(conflict_or)?;
        debug!(user_id = %user.id, role = %user.role, "user inserted");
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn username_exists(&self, username: &str) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.db)
                .await?;
        Ok(exists)
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.db)
                .await?;
        Ok(exists)
    }

    async fn count_users(&self) -> StoreResult<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;
        Ok(n as u64)
    }

    async fn create_session(&self, user_id: Uuid) -> StoreResult<Session> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (user_id)
            VALUES ($1)
            RETURNING id, user_id, created_at
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(session)
    }

    async fn find_session(&self, id: Uuid) -> StoreResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT id, user_id, created_at FROM sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(session)
    }

    async fn delete_session(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn patient_profile(&self, user_id: Uuid) -> StoreResult<Option<PatientProfile>> {
        let profile = sqlx::query_as::<_, PatientProfile>(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patient_profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(profile)
    }

    async fn doctor_profile(&self, user_id: Uuid) -> StoreResult<Option<DoctorProfile>> {
        let profile = sqlx::query_as::<_, DoctorProfile>(&format!(
            "SELECT {DOCTOR_COLUMNS} FROM doctor_profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(profile)
    }

    async fn create_patient_profile(
        &self,
        user_id: Uuid,
        new: NewPatientProfile,
    ) -> StoreResult<PatientProfile> {
        let profile = sqlx::query_as::<_, PatientProfile>(&format!(
            r#"
            INSERT INTO patient_profiles (user_id, date_of_birth, gender, phone_number, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PATIENT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(new.date_of_birth)
        .bind(new.gender)
        .bind(new.phone_number)
        .bind(new.address)
        .fetch_one(&self.db)
        .await
        .map_err(conflict_or)?;
        Ok(profile)
    }

    async fn create_doctor_profile(
        &self,
        user_id: Uuid,
        new: NewDoctorProfile,
        ending_session: Option<Uuid>,
    ) -> StoreResult<DoctorProfile> {
        let mut tx = self.db.begin().await?;

        let profile = sqlx::query_as::<_, DoctorProfile>(&format!(
            r#"
            INSERT INTO doctor_profiles (user_id, specialization, qualification, experience_years)
            VALUES ($1, $2, $3, $4)
            RETURNING {DOCTOR_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(new.specialization)
        .bind(new.qualification)
        .bind(new.experience_years)
        .fetch_one(&mut *tx)
        .await
        .map_err(conflict_or)?;

        if let Some(sid) = ending_session {
            sqlx::query("DELETE FROM sessions WHERE id = $1")
                .bind(sid)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(profile)
    }

    async fn set_patient_active(
        &self,
        profile_id: Uuid,
        is_active: bool,
    ) -> StoreResult<Option<PatientProfile>> {
        let profile = sqlx::query_as::<_, PatientProfile>(&format!(
            r#"
            UPDATE patient_profiles
               SET is_active = $2, updated_at = now()
             WHERE id = $1
            RETURNING {PATIENT_COLUMNS}
            "#
        ))
        .bind(profile_id)
        .bind(is_active)
        .fetch_optional(&self.db)
        .await?;
        Ok(profile)
    }

    async fn set_doctor_active(
        &self,
        profile_id: Uuid,
        is_active: bool,
    ) -> StoreResult<Option<DoctorProfile>> {
        let profile = sqlx::query_as::<_, DoctorProfile>(&format!(
            r#"
            UPDATE doctor_profiles
               SET is_active = $2, updated_at = now()
             WHERE id = $1
            RETURNING {DOCTOR_COLUMNS}
            "#
        ))
        .bind(profile_id)
        .bind(is_active)
        .fetch_optional(&self.db)
        .await?;
        Ok(profile)
    }

    async fn create_clinic(&self, new: NewClinic) -> StoreResult<Clinic> {
        let clinic = sqlx::query_as::<_, Clinic>(&format!(
            r#"
            INSERT INTO clinics (name, address, phone_number, email, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CLINIC_COLUMNS}
            "#
        ))
        .bind(new.name)
        .bind(new.address)
        .bind(new.phone_number)
        .bind(new.email)
        .bind(new.is_active)
        .fetch_one(&self.db)
        .await?;
        Ok(clinic)
    }

    async fn find_clinic(&self, id: Uuid) -> StoreResult<Option<Clinic>> {
        let clinic = sqlx::query_as::<_, Clinic>(&format!(
            "SELECT {CLINIC_COLUMNS} FROM clinics WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(clinic)
    }

    async fn list_clinics(&self) -> StoreResult<Vec<Clinic>> {
        let rows = sqlx::query_as::<_, Clinic>(&format!(
            "SELECT {CLINIC_COLUMNS} FROM clinics ORDER BY name ASC"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn count_clinics(&self) -> StoreResult<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clinics")
            .fetch_one(&self.db)
            .await?;
        Ok(n as u64)
    }

    async fn count_pending_doctors(&self) -> StoreResult<u64> {
        let n: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM doctor_profiles WHERE NOT is_approved")
                .fetch_one(&self.db)
                .await?;
        Ok(n as u64)
    }

    async fn list_doctor_profiles(&self, filter: DoctorFilter) -> StoreResult<Vec<DoctorProfile>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {DOCTOR_COLUMNS} FROM doctor_profiles WHERE TRUE"));
        if let Some(approved) = filter.approved {
            qb.push(" AND is_approved = ").push_bind(approved);
        }
        if let Some(clinic_id) = filter.clinic_id {
            qb.push(" AND clinic_id = ").push_bind(clinic_id);
        }
        qb.push(" ORDER BY created_at DESC");

        let rows = qb
            .build_query_as::<DoctorProfile>()
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn assign_clinic(
        &self,
        profile_id: Uuid,
        clinic_id: Option<Uuid>,
    ) -> StoreResult<Option<DoctorProfile>> {
        let profile = sqlx::query_as::<_, DoctorProfile>(&format!(
            r#"
            UPDATE doctor_profiles
               SET clinic_id = $2, updated_at = now()
             WHERE id = $1
            RETURNING {DOCTOR_COLUMNS}
            "#
        ))
        .bind(profile_id)
        .bind(clinic_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(profile)
    }

    async fn approve_doctors(&self, profile_ids: &[Uuid]) -> StoreResult<ApprovalOutcome> {
        let mut tx = self.db.begin().await?;

        // Lock the batch so a concurrent clinic change cannot slip in between
        // the check and the update.
        let selected: Vec<(Uuid, Option<Uuid>)> = sqlx::query_as(
            r#"
            SELECT id, clinic_id
              FROM doctor_profiles
             WHERE id = ANY($1)
             FOR UPDATE
            "#,
        )
        .bind(profile_ids)
        .fetch_all(&mut *tx)
        .await?;

        let missing = selected.iter().filter(|(_, clinic)| clinic.is_none()).count() as u64;
        if missing > 0 {
            tx.rollback().await?;
            return Ok(ApprovalOutcome::MissingClinic { missing });
        }

        let updated = sqlx::query(
            r#"
            UPDATE doctor_profiles
               SET is_approved = TRUE, updated_at = now()
             WHERE id = ANY($1)
            "#,
        )
        .bind(profile_ids)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok(ApprovalOutcome::Approved { updated })
    }

    async fn reject_doctors(&self, profile_ids: &[Uuid]) -> StoreResult<u64> {
        let updated = sqlx::query(
            r#"
            UPDATE doctor_profiles
               SET is_approved = FALSE, updated_at = now()
             WHERE id = ANY($1)
            "#,
        )
        .bind(profile_ids)
        .execute(&self.db)
        .await?
        .rows_affected();
        Ok(updated)
    }
}
