//! Authentication service.
//!
//! Verifies submitted credentials against pre-provisioned user documents and
//! provisions new accounts for the CLI. Submitted passwords are normalized
//! by the configured [`PasswordPolicy`] on both paths.

mod error;

pub use error::AuthError;

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use fooapp_core::Username;

use crate::config::PasswordPolicy;
use crate::db::{DocumentStore, RepositoryError, UserRepository};
use crate::models::User;

/// Hash verified when the username is unknown, so that path costs the same
/// as a wrong password.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("fooapp-dummy-credential").ok());

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    policy: PasswordPolicy,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore, policy: PasswordPolicy) -> Self {
        Self {
            users: UserRepository::new(store),
            policy,
        }
    }

    /// Check a username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for any mismatch, without
    /// saying whether the user exists. A user record that cannot be read
    /// counts as a mismatch.
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let password = self.policy.normalize(password);

        let found = match Username::parse(username) {
            Ok(username) => match self.users.get_password_hash(&username).await {
                Ok(found) => found,
                Err(RepositoryError::DataCorruption(reason)) => {
                    tracing::warn!(username = %username, %reason, "Unusable user record at login");
                    None
                }
                Err(e) => return Err(e.into()),
            },
            Err(_) => None,
        };

        let Some((user, stored)) = found else {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_login(dummy, &password);
            }
            return Err(AuthError::InvalidCredentials);
        };

        if verify_login(&stored, &password) {
            Ok(user)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Provision a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` or `AuthError::WeakPassword` for
    /// unusable input.
    /// Returns `AuthError::UserAlreadyExists` if the username is taken.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = Username::parse(username)?;

        let password = self.policy.normalize(password);
        if password.is_empty() {
            return Err(AuthError::WeakPassword(
                "password must not be empty".to_string(),
            ));
        }

        let password_hash = hash_password(&password)?;

        self.users
            .create(&username, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Compare a submitted password with a stored PHC hash.
///
/// Unparseable stored hashes never verify.
#[must_use]
pub fn verify_login(stored: &str, submitted: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(stored) else {
        return false;
    };

    Argon2::default()
        .verify_password(submitted.as_bytes(), &parsed_hash)
        .is_ok()
}
