//! Web application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FOOAPP_DATABASE_URL` - `PostgreSQL` connection string, or `memory://`
//!   for the in-process store (falls back to `DATABASE_URL`)
//! - `FOOAPP_SESSION_SECRET` - Session signing secret (min 64 chars, high entropy)
//!
//! ## Optional
//! - `FOOAPP_DATABASE_NAME` - Namespace for stored documents (default: fooapp)
//! - `FOOAPP_SESSION_PROTECTION` - `off`, `basic` or `strong` (default: basic)
//! - `FOOAPP_PASSWORD_CASE_FOLDING` - Lower-case submitted passwords (default: true)
//! - `FOOAPP_HOST` - Bind address (default: 127.0.0.1)
//! - `FOOAPP_PORT` - Listen port (default: 5000)
//! - `FOOAPP_BASE_URL` - Public URL (default: <http://127.0.0.1:5000>)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Signed cookies need a 64-byte key.
pub const MIN_SESSION_SECRET_LENGTH: usize = 64;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// URL scheme selecting the in-memory store.
pub const MEMORY_URL_SCHEME: &str = "memory://";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// How strictly a session is tied to the client that logged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionProtection {
    /// No fingerprint check.
    Off,
    /// A changed fingerprint marks the session as not fresh.
    #[default]
    Basic,
    /// A changed fingerprint logs the user out.
    Strong,
}

impl FromStr for SessionProtection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "basic" => Ok(Self::Basic),
            "strong" => Ok(Self::Strong),
            other => Err(format!("expected off, basic or strong, got '{other}'")),
        }
    }
}

impl fmt::Display for SessionProtection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "off",
            Self::Basic => "basic",
            Self::Strong => "strong",
        })
    }
}

/// How submitted passwords are normalized before hashing or verifying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordPolicy {
    /// Trim and lower-case, as existing accounts were provisioned.
    #[default]
    CaseFolded,
    /// Compare the password exactly as typed.
    Exact,
}

impl PasswordPolicy {
    /// Normalize a submitted password under this policy.
    #[must_use]
    pub fn normalize(self, password: &str) -> String {
        match self {
            Self::CaseFolded => password.trim().to_lowercase(),
            Self::Exact => password.to_owned(),
        }
    }

    /// Parse the `FOOAPP_PASSWORD_CASE_FOLDING` flag.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if `value` is not a boolean.
    pub fn from_flag(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Self::CaseFolded),
            "0" | "false" | "no" | "off" => Ok(Self::Exact),
            other => Err(format!("expected a boolean, got '{other}'")),
        }
    }
}

/// Where documents are stored.
#[derive(Clone)]
pub enum StoreBackend {
    /// Process memory; contents are lost on restart.
    Memory,
    /// `PostgreSQL`, via a connection string.
    Postgres(SecretString),
}

impl StoreBackend {
    /// Pick a backend from a connection string.
    #[must_use]
    pub fn from_url(url: SecretString) -> Self {
        if url.expose_secret().starts_with(MEMORY_URL_SCHEME) {
            Self::Memory
        } else {
            Self::Postgres(url)
        }
    }
}

impl fmt::Debug for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("Memory"),
            Self::Postgres(_) => f.write_str("Postgres([REDACTED])"),
        }
    }
}

/// Web application configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Document store backend
    pub store: StoreBackend,
    /// Namespace for stored documents
    pub database_name: String,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    pub session_protection: SessionProtection,
    pub password_policy: PasswordPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

impl WebConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let store = StoreBackend::from_url(get_database_url("FOOAPP_DATABASE_URL")?);
        let database_name = get_env_or_default("FOOAPP_DATABASE_NAME", "fooapp");
        let host = parse_env("FOOAPP_HOST", "127.0.0.1")?;
        let port = parse_env("FOOAPP_PORT", "5000")?;
        let base_url = get_env_or_default("FOOAPP_BASE_URL", "http://127.0.0.1:5000");

        let session_secret = get_validated_secret("FOOAPP_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "FOOAPP_SESSION_SECRET")?;

        let session_protection = parse_env("FOOAPP_SESSION_PROTECTION", "basic")?;
        let password_policy = PasswordPolicy::from_flag(&get_env_or_default(
            "FOOAPP_PASSWORD_CASE_FOLDING",
            "true",
        ))
        .map_err(|e| ConfigError::InvalidEnvVar("FOOAPP_PASSWORD_CASE_FOLDING".to_string(), e))?;

        Ok(Self {
            store,
            database_name,
            host,
            port,
            base_url,
            session_secret,
            session_protection,
            password_policy,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration for tests and local experiments: in-memory store,
    /// default policies, and the given session secret.
    #[must_use]
    pub fn in_memory(session_secret: SecretString) -> Self {
        Self {
            store: StoreBackend::Memory,
            database_name: "fooapp".to_string(),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 5000,
            base_url: "http://127.0.0.1:5000".to_string(),
            session_secret,
            session_protection: SessionProtection::default(),
            password_policy: PasswordPolicy::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
