//! Session middleware configuration.
//!
//! Sessions use signed cookies and are stored either in `PostgreSQL`
//! (tower-sessions-sqlx-store) or, for `memory://` deployments and tests,
//! in process memory.

use secrecy::ExposeSecret;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::WebConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "fooapp_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// The signing key could not be derived from the configured secret.
#[derive(Debug, thiserror::Error)]
#[error("session secret cannot be used as a signing key: {0}")]
pub struct SessionKeyError(String);

/// Create the session layer over any session store.
///
/// # Arguments
///
/// * `store` - Where session records live
/// * `config` - Web configuration (for session secret and cookie security)
///
/// # Errors
///
/// Returns `SessionKeyError` if the secret is too short to sign cookies.
pub fn create_session_layer<Store>(
    store: Store,
    config: &WebConfig,
) -> Result<SessionManagerLayer<Store, SignedCookie>, SessionKeyError>
where
    Store: SessionStore + Clone,
{
    let key = Key::try_from(config.session_secret.expose_secret().as_bytes())
        .map_err(|e| SessionKeyError(e.to_string()))?;

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.secure_cookies())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}
