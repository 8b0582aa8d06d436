//! Account provisioning.
//!
//! The web application has no registration page; this is the only way
//! accounts come into existence.
//!
//! # Usage
//!
//! ```bash
//! fooapp-cli user create --username alice --password 'correct horse'
//! ```
//!
//! # Environment Variables
//!
//! - `FOOAPP_DATABASE_URL` - `PostgreSQL` connection string
//! - `FOOAPP_DATABASE_NAME` - Document namespace (default: fooapp)
//! - `FOOAPP_PASSWORD_CASE_FOLDING` - Must match the web server's setting

use fooapp_web::db::PostgresDocumentStore;
use fooapp_web::services::auth::AuthService;

use super::{CommandError, connect, database_name, password_policy};

/// Hash the password and insert a new user document.
///
/// The username is trimmed and lower-cased; the password is normalized the
/// same way login normalizes it. Existing usernames are refused.
pub async fn create(username: &str, password: &str) -> Result<(), CommandError> {
    let policy = password_policy()?;
    let pool = connect().await?;
    let store = PostgresDocumentStore::new(pool, database_name());

    let user = AuthService::new(&store, policy)
        .register(username, password)
        .await?;

    tracing::info!(username = %user.username, ?policy, "User created");
    Ok(())
}
