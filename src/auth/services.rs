use lazy_static::lazy_static;
use regex::Regex;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo_types::User;
use crate::error::{AppError, RepoError};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Password must be at least 8 characters")]
    PasswordTooShort,

    #[error("Error! Email already exists")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<RepoError> for AuthError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::EmailTaken => AuthError::EmailTaken,
            other => AuthError::Internal(other.into()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => AppError::Unauthorized,
            AuthError::Internal(inner) => AppError::Internal(inner),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate the form input, hash the password and insert the user.
pub async fn register(db: &SqlitePool, email: &str, password: &str) -> Result<User, AuthError> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AuthError::InvalidEmail);
    }
    if password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AuthError::PasswordTooShort);
    }

    let hash = hash_password(password)?;
    let user = User::create(db, &email, &hash).await.map_err(|e| {
        if matches!(e, RepoError::EmailTaken) {
            warn!(email = %email, "email already registered");
        }
        AuthError::from(e)
    })?;
    debug!(user_id = user.id, "user created");
    Ok(user)
}

/// Look up the user and check the password. Unknown emails and wrong
/// passwords are indistinguishable to the caller.
pub async fn authenticate(db: &SqlitePool, email: &str, password: &str) -> Result<User, AuthError> {
    let email = normalize_email(email);
    let Some(user) = User::find_by_email(db, &email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AuthError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }
    Ok(user)
}
