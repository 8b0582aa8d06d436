//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Security headers
//! 4. Session layer (tower-sessions, signed cookie)
//! 5. Identity (session protection, user reload, `RequestContext`)

pub mod auth;
pub mod identity;
pub mod security_headers;
pub mod session;

pub use auth::{AuthRejection, CurrentUser, LOGIN_PATH, RequireAuth, is_safe_redirect};
pub use identity::{ClientFingerprint, clear_identity, establish_session, identity_middleware};
pub use security_headers::security_headers_middleware;
pub use session::{SESSION_COOKIE_NAME, SessionKeyError, create_session_layer};
