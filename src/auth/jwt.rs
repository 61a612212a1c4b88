use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::accounts::repo_types::{Session, User};
use crate::auth::claims::Claims;
use crate::config::JwtConfig;
use crate::state::AppState;

/// Signing and verification keys plus the claims they stamp.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            ttl: Duration::from_secs((ttl_minutes.max(1) as u64) * 60),
        }
    }
}

impl JwtKeys {
    pub fn sign(&self, user: &User, session: &Session) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user.id,
            sid: session.id,
            role: user.role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user.id, session_id = %session.id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, session_id = %data.claims.sid, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::repo_types::Role;
    use std::sync::Arc;
    use uuid::Uuid;

    fn keys_with(issuer: &str, audience: &str) -> JwtKeys {
        let mut state = AppState::fake();
        let mut config = (*state.config).clone();
        config.jwt.issuer = issuer.into();
        config.jwt.audience = audience.into();
        state.config = Arc::new(config);
        JwtKeys::from_ref(&state)
    }

    fn user_and_session() -> (User, Session) {
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            username: "drsmith".into(),
            email: "doctor@x.com".into(),
            password_hash: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            role: Role::Doctor,
            is_staff: false,
            is_superuser: false,
            is_active: true,
            date_joined: now,
        };
        let session = Session {
            id: Uuid::new_v4(),
            user_id: user.id,
            created_at: now,
        };
        (user, session)
    }

    #[test]
    fn sign_and_verify_session_token() {
        let keys = JwtKeys::from_ref(&AppState::fake());
        let (user, session) = user_and_session();
        let token = keys.sign(&user, &session).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.sid, session.id);
        assert_eq!(claims.role, Role::Doctor);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good = keys_with("good-iss", "good-aud");
        let bad = keys_with("bad-iss", "bad-aud");
        let (user, session) = user_and_session();
        let token = good.sign(&user, &session).expect("sign");
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = JwtKeys::from_ref(&AppState::fake());
        assert!(keys.verify("not.a.jwt").is_err());
    }
}
