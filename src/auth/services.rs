use tracing::{info, warn};

use crate::accounts::repo_types::{NewUser, Role, User};
use crate::accounts::services::{load_account, AccountView};
use crate::accounts::standing::Standing;
use crate::auth::dto::RegisterRequest;
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::flash::paths;
use crate::forms::{
    check_max_len, check_required, is_valid_email, is_valid_username, normalize_email,
    optional_text, EMAIL_MAX_LEN,
};
use crate::store::AccountStore;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Registration input after normalization, ready to hash and insert.
#[derive(Debug)]
pub struct ValidRegistration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
}

/// Checks a registration form, including username and email availability.
/// Reports every failing field at once.
pub async fn validate_registration(
    store: &dyn AccountStore,
    req: RegisterRequest,
) -> AppResult<ValidRegistration> {
    let mut errors = FieldErrors::new();

    let username = req.username.trim().to_string();
    if check_required(&mut errors, "username", &username) {
        check_max_len(&mut errors, "username", &username, 150);
        if !is_valid_username(&username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        } else if store.username_exists(&username).await? {
            errors.add("username", "A user with that username already exists.");
        }
    }

    let email = normalize_email(&req.email);
    if check_required(&mut errors, "email", &email) {
        if !is_valid_email(&email) {
            errors.add("email", "Enter a valid email address.");
        } else if email.chars().count() > EMAIL_MAX_LEN {
            check_max_len(&mut errors, "email", &email, EMAIL_MAX_LEN);
        } else if store.email_exists(&email).await? {
            errors.add("email", "A user with this email already exists.");
        }
    }

    if check_required(&mut errors, "password1", &req.password1) {
        if req.password1.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "password1",
                format!("This password is too short. It must contain at least {MIN_PASSWORD_LEN} characters."),
            );
        }
    }
    if check_required(&mut errors, "password2", &req.password2)
        && req.password1 != req.password2
    {
        errors.add("password2", "The two password fields didn't match.");
    }

    let role = match req.role.as_deref().map(str::trim) {
        None | Some("") => {
            errors.add("role", "This field is required.");
            None
        }
        Some(raw) => {
            let parsed = Role::parse(raw);
            if parsed.is_none() {
                errors.add(
                    "role",
                    format!("Select a valid choice. {raw} is not one of the available choices."),
                );
            }
            parsed
        }
    };

    let first_name = optional_text(req.first_name).unwrap_or_default();
    let last_name = optional_text(req.last_name).unwrap_or_default();
    check_max_len(&mut errors, "first_name", &first_name, 150);
    check_max_len(&mut errors, "last_name", &last_name, 150);

    errors.into_result()?;
    let role = role.ok_or_else(|| AppError::field("role", "This field is required."))?;

    Ok(ValidRegistration {
        username,
        email,
        password: req.password1,
        role,
        first_name,
        last_name,
    })
}

/// Hashes the password and inserts the user. A unique-constraint race with a
/// concurrent registration surfaces as the same form error as the pre-check.
pub async fn create_account(
    store: &dyn AccountStore,
    valid: ValidRegistration,
    is_staff: bool,
) -> AppResult<User> {
    let password_hash = hash_password(&valid.password)?;
    let user = store
        .create_user(NewUser {
            username: valid.username,
            email: valid.email,
            password_hash,
            first_name: valid.first_name,
            last_name: valid.last_name,
            role: valid.role,
            is_staff,
            is_superuser: is_staff,
        })
        .await?;
    info!(user_id = %user.id, username = %user.username, role = %user.role, "user registered");
    Ok(user)
}

/// Matches credentials. Unknown users, wrong passwords and disabled users
/// all fail the same way.
pub async fn authenticate(
    store: &dyn AccountStore,
    username: &str,
    password: &str,
) -> AppResult<User> {
    let Some(user) = store.find_user_by_username(username.trim()).await? else {
        warn!(username = %username, "login unknown username");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    if !user.is_active {
        warn!(user_id = %user.id, "login inactive user");
        return Err(AppError::InvalidCredentials);
    }

    Ok(user)
}

/// What a successful credential match leads to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginDecision {
    /// Open a session and go to the dashboard.
    Admit,
    /// Registration is incomplete: send to profile creation without
    /// opening a session.
    CompleteProfile(&'static str),
}

/// Decides admission from the account's standing. Profile existence is
/// checked before approval and activation.
pub fn login_decision(view: &AccountView) -> AppResult<LoginDecision> {
    match view {
        AccountView::Admin => Ok(LoginDecision::Admit),
        AccountView::Patient(standing) => gate(standing, paths::CREATE_PATIENT_PROFILE),
        AccountView::Doctor(standing) => gate(standing, paths::CREATE_DOCTOR_PROFILE),
    }
}

fn gate<P>(standing: &Standing<P>, create_path: &'static str) -> AppResult<LoginDecision> {
    match standing {
        Standing::NoProfile => Ok(LoginDecision::CompleteProfile(create_path)),
        Standing::PendingApproval(_) => Err(AppError::PendingApproval),
        Standing::Deactivated(_) => Err(AppError::Deactivated),
        Standing::Active(_) => Ok(LoginDecision::Admit),
    }
}

/// Authenticates and applies the role gate in one step.
pub async fn login(
    store: &dyn AccountStore,
    username: &str,
    password: &str,
) -> AppResult<(User, LoginDecision)> {
    let user = authenticate(store, username, password).await?;
    let view = load_account(store, &user).await?;
    let decision = login_decision(&view)?;
    Ok((user, decision))
}

/// Creates a session row and signs a token naming it.
pub async fn open_session(
    store: &dyn AccountStore,
    keys: &JwtKeys,
    user: &User,
) -> AppResult<String> {
    let session = store.create_session(user.id).await?;
    let token = keys.sign(user, &session)?;
    info!(user_id = %user.id, session_id = %session.id, "session opened");
    Ok(token)
}

/// Where a freshly registered user goes next.
pub fn after_registration(role: Role) -> &'static str {
    match role {
        Role::Patient => paths::CREATE_PATIENT_PROFILE,
        Role::Doctor => paths::CREATE_DOCTOR_PROFILE,
        Role::Admin => paths::DASHBOARD,
    }
}
