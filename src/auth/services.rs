//! Registration, login and profile rules. Handlers stay thin; everything
//! here works against the store traits so it runs on either backend.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    dto::{AuthResponse, LoginRequest, RegisterRequest, UpdateProfileRequest},
    jwt::JwtKeys,
    password::{hash_password, verify_dummy, verify_password},
};
use crate::{
    error::{AppError, AppResult},
    store::{CredentialStore, NewUser, ProfileUpdate, User},
};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 128;
pub const MAX_CONTACT_LEN: usize = 128;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").unwrap();
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn validate_password(password: &str) -> AppResult<()> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at most {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_username(raw: &str) -> AppResult<String> {
    let name = raw.trim();
    if !USERNAME_RE.is_match(name) {
        return Err(AppError::validation(
            "Username must be 3-32 characters of letters, digits, '_', '.' or '-'",
        ));
    }
    Ok(name.to_string())
}

fn validate_contact(raw: &str) -> AppResult<String> {
    let contact = raw.trim();
    if contact.chars().count() > MAX_CONTACT_LEN || contact.chars().any(char::is_control) {
        return Err(AppError::validation(format!(
            "Contact must be at most {MAX_CONTACT_LEN} printable characters"
        )));
    }
    Ok(contact.to_string())
}

pub async fn register<S>(store: &S, keys: &JwtKeys, req: RegisterRequest) -> AppResult<AuthResponse>
where
    S: CredentialStore + ?Sized,
{
    let email = normalize_email(&req.email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }
    validate_password(&req.password)?;
    let username = match req.username.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(name) => Some(validate_username(name)?),
    };

    let hash = hash_password(&req.password)?;

    // No pre-check: the store's unique constraint decides duplicate races.
    let user = store
        .insert_user(NewUser {
            email: &email,
            username: username.as_deref(),
            password_hash: &hash,
        })
        .await
        .map_err(|e| {
            warn!(email = %email, error = %e, "register rejected by store");
            AppError::from(e)
        })?;

    let token = keys.sign(user.id)?;
    info!(user_id = %user.id, "user registered");
    Ok(AuthResponse {
        token,
        user_id: user.id,
    })
}

pub async fn login<S>(store: &S, keys: &JwtKeys, req: LoginRequest) -> AppResult<AuthResponse>
where
    S: CredentialStore + ?Sized,
{
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::validation("Email and password are required"));
    }
    if !is_valid_email(&email) {
        return Err(AppError::validation("Invalid email"));
    }

    let Some(user) = store.find_by_email(&email).await? else {
        verify_dummy(&req.password);
        warn!("login for unknown email");
        return Err(AppError::InvalidCredentials);
    };

    match verify_password(&req.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            warn!(user_id = %user.id, "login with wrong password");
            return Err(AppError::InvalidCredentials);
        }
        Err(e) => {
            error!(user_id = %user.id, error = %e, "stored password hash unreadable");
            return Err(AppError::InvalidCredentials);
        }
    }

    let token = keys.sign(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(AuthResponse {
        token,
        user_id: user.id,
    })
}

pub async fn profile<S>(store: &S, user_id: Uuid) -> AppResult<User>
where
    S: CredentialStore + ?Sized,
{
    store
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::InvalidToken)
}

pub async fn update_profile<S>(store: &S, user_id: Uuid, req: UpdateProfileRequest) -> AppResult<User>
where
    S: CredentialStore + ?Sized,
{
    let update = ProfileUpdate {
        username: req.username.as_deref().map(validate_username).transpose()?,
        contact: req.contact.as_deref().map(validate_contact).transpose()?,
    };

    let user = store
        .update_profile(user_id, update)
        .await?
        .ok_or(AppError::InvalidToken)?;
    info!(user_id = %user.id, "profile updated");
    Ok(user)
}
