use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::repo_types::Role;

/// JWT payload naming a server-side session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,   // user ID
    pub sid: Uuid,   // session ID
    pub role: Role,  // role at login time, informational
    pub iat: usize,  // issued at (unix timestamp)
    pub exp: usize,  // expires at (unix timestamp)
    pub iss: String, // issuer
    pub aud: String, // audience
}
