//! Persistence for the catalog.
//!
//! # Collections
//!
//! - `users` - Pre-provisioned login accounts (`username`, `password` hash)
//! - `products` - The product catalog (`name`, `description`, `price`)
//!
//! Both live behind the [`DocumentStore`] trait. Two backends exist:
//!
//! - [`PostgresDocumentStore`] - JSONB rows in the `documents` table
//! - [`MemoryDocumentStore`] - process memory, for development and tests
//!
//! Sessions are stored separately by tower-sessions.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p fooapp-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;
pub mod products;
pub mod store;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use memory::MemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use products::ProductRepository;
pub use store::{Collection, Document, DocumentStore, Fields, Filter, StoreError};
pub use users::UserRepository;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The underlying store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A model could not be converted to a document.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored document does not match the expected shape.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., duplicate username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
