//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong password, unknown user, or malformed username.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Username already provisioned.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Username rejected before provisioning.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] fooapp_core::UsernameError),

    /// Password rejected before provisioning.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/store error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
