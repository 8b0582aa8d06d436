//! Subcommand implementations.

pub mod migrate;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use fooapp_web::config::{MEMORY_URL_SCHEME, PasswordPolicy};
use fooapp_web::services::auth::AuthError;

/// Errors shared by every command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Environment variable has an unusable value.
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(&'static str, String),

    /// The in-memory store has nothing to migrate or provision.
    #[error("FOOAPP_DATABASE_URL points at the in-memory store; use a PostgreSQL URL")]
    MemoryStore,

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Session table migration failure.
    #[error("Session store error: {0}")]
    SessionStore(String),

    /// Account provisioning failure.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Read `FOOAPP_DATABASE_URL` (or `DATABASE_URL`) and connect.
pub async fn connect() -> Result<PgPool, CommandError> {
    let url = std::env::var("FOOAPP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CommandError::MissingEnvVar("FOOAPP_DATABASE_URL"))?;

    if url.starts_with(MEMORY_URL_SCHEME) {
        return Err(CommandError::MemoryStore);
    }

    tracing::info!("Connecting to database...");
    Ok(fooapp_web::db::create_pool(&SecretString::from(url)).await?)
}

/// Document namespace shared with the web server.
pub fn database_name() -> String {
    std::env::var("FOOAPP_DATABASE_NAME").unwrap_or_else(|_| "fooapp".to_string())
}

/// Password policy shared with the web server, so provisioning matches login.
pub fn password_policy() -> Result<PasswordPolicy, CommandError> {
    std::env::var("FOOAPP_PASSWORD_CASE_FOLDING").map_or_else(
        |_| Ok(PasswordPolicy::default()),
        |flag| {
            PasswordPolicy::from_flag(&flag)
                .map_err(|e| CommandError::InvalidEnvVar("FOOAPP_PASSWORD_CASE_FOLDING", e))
        },
    )
}
