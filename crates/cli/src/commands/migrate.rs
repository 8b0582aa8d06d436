//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! fooapp-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `FOOAPP_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Document tables: `crates/web/migrations/`. The session table is created
//! by `tower-sessions-sqlx-store` itself.

use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, connect};

/// Create the document tables and the session table.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running document migrations...");
    sqlx::migrate!("../web/migrations").run(&pool).await?;

    tracing::info!("Running session store migration...");
    PostgresStore::new(pool)
        .migrate()
        .await
        .map_err(|e| CommandError::SessionStore(e.to_string()))?;

    tracing::info!("Migrations complete!");
    Ok(())
}
