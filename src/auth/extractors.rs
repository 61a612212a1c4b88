use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use crate::accounts::repo_types::{Role, User};
use crate::auth::jwt::JwtKeys;
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated caller and the session its token names.
/// Missing, invalid or revoked tokens reject with a redirect to login.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub session_id: Uuid,
}

impl CurrentUser {
    pub fn role(&self) -> Role {
        self.user.role
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::Unauthenticated)?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(AppError::Unauthenticated)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            AppError::Unauthenticated
        })?;

        let session = state
            .store
            .find_session(claims.sid)
            .await?
            .filter(|s| s.user_id == claims.sub)
            .ok_or_else(|| {
                warn!(session_id = %claims.sid, "session revoked or unknown");
                AppError::Unauthenticated
            })?;

        let user = state
            .store
            .find_user(claims.sub)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::Unauthenticated)?;

        Ok(CurrentUser {
            user,
            session_id: session.id,
        })
    }
}

/// A caller allowed into the administrative API.
#[derive(Debug, Clone)]
pub struct StaffUser(pub CurrentUser);

#[async_trait]
impl FromRequestParts<AppState> for StaffUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state).await?;
        if !current.user.is_staff {
            warn!(user_id = %current.user.id, "non-staff user on admin route");
            return Err(AppError::AccessDenied);
        }
        Ok(StaffUser(current))
    }
}
