use thiserror::Error;
use tracing::info;

use crate::accounts::repo_types::{Role, User};
use crate::auth::services::{create_account, ValidRegistration};
use crate::error::AppError;
use crate::forms::normalize_email;
use crate::store::{AccountStore, StoreError};

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Username, email, and password are required.")]
    MissingFields,

    #[error("User with username \"{0}\" already exists.")]
    UsernameTaken(String),

    #[error("User with email \"{0}\" already exists.")]
    EmailTaken(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("could not create admin: {0}")]
    Create(#[from] AppError),
}

/// Credentials for a new administrator.
#[derive(Debug, Clone, Default)]
pub struct NewAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Creates an ADMIN user with staff and superuser flags. Refuses when the
/// username or email is already registered.
pub async fn provision_admin(
    store: &dyn AccountStore,
    admin: NewAdmin,
) -> Result<User, ProvisionError> {
    let username = admin.username.trim().to_string();
    let email = normalize_email(&admin.email);
    if username.is_empty() || email.is_empty() || admin.password.is_empty() {
        return Err(ProvisionError::MissingFields);
    }

    if store.username_exists(&username).await? {
        return Err(ProvisionError::UsernameTaken(username));
    }
    if store.email_exists(&email).await? {
        return Err(ProvisionError::EmailTaken(email));
    }

    let user = create_account(
        store,
        ValidRegistration {
            username,
            email,
            password: admin.password,
            role: Role::Admin,
            first_name: String::new(),
            last_name: String::new(),
        },
        true,
    )
    .await?;
    info!(user_id = %user.id, username = %user.username, "admin provisioned");
    Ok(user)
}
