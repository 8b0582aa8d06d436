//! User repository for store operations.
//!
//! User documents look like `{"username": "alice", "password": "$argon2id$..."}`.
//! The web application only reads them; provisioning goes through the CLI.

use serde::Deserialize;
use serde_json::{Value, json};

use fooapp_core::Username;

use super::RepositoryError;
use super::store::{Collection, Document, DocumentStore, Filter};
use crate::models::User;

/// Field holding the username in user documents.
const USERNAME_FIELD: &str = "username";

#[derive(Deserialize)]
struct UserDocument {
    username: String,
    password: String,
}

/// The part of a user document needed to resolve a session.
#[derive(Deserialize)]
struct UserIdentity {
    username: String,
}

/// Repository for user documents.
pub struct UserRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Get a user by their username.
    ///
    /// Only the `username` field is read, so a record with a damaged
    /// password still resolves.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored username is invalid.
    pub async fn get_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError> {
        self.find(username).await?.map(parse_identity).transpose()
    }

    /// Get a user together with their stored password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored document is invalid.
    pub async fn get_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        self.find(username).await?.map(parse_user).transpose()
    }

    async fn find(&self, username: &Username) -> Result<Option<Document>, RepositoryError> {
        Ok(self
            .store
            .find_one(
                Collection::Users,
                Filter::Field {
                    name: USERNAME_FIELD,
                    value: username.as_str(),
                },
            )
            .await?)
    }

    /// Insert a new user with an already-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    /// Returns `RepositoryError::Store` for other store errors.
    pub async fn create(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        if self.get_password_hash(username).await?.is_some() {
            return Err(RepositoryError::Conflict(format!(
                "username {username} already exists"
            )));
        }

        let Value::Object(fields) = json!({
            USERNAME_FIELD: username.as_str(),
            "password": password_hash,
        }) else {
            return Err(RepositoryError::DataCorruption(
                "user document is not an object".to_owned(),
            ));
        };

        self.store
            .insert_one(Collection::Users, fields)
            .await
            .map_err(|e| {
                if let super::StoreError::Database(sqlx::Error::Database(ref db_err)) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::Conflict(format!(
                        "username {username} already exists"
                    ));
                }
                RepositoryError::Store(e)
            })?;

        Ok(User {
            username: username.clone(),
        })
    }
}

fn parse_identity(doc: Document) -> Result<User, RepositoryError> {
    let id = doc.id;
    let raw: UserIdentity = serde_json::from_value(Value::Object(doc.fields))
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid user {id}: {e}")))?;

    let username = Username::parse(&raw.username).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid username in user {id}: {e}"))
    })?;

    Ok(User { username })
}

fn parse_user(doc: Document) -> Result<(User, String), RepositoryError> {
    let id = doc.id;
    let raw: UserDocument = serde_json::from_value(Value::Object(doc.fields))
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid user {id}: {e}")))?;

    let username = Username::parse(&raw.username).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid username in user {id}: {e}"))
    })?;

    Ok((User { username }, raw.password))
}
