//! Session-related types.
//!
//! Only the username is kept in the session. The matching [`User`] is
//! reloaded from the store on every request and handed to handlers through
//! [`RequestContext`].

use crate::models::User;

/// Per-request authentication context.
///
/// Inserted into request extensions by the identity middleware before any
/// handler runs. Handlers read it through the `CurrentUser` and
/// `RequireAuth` extractors.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// The authenticated user, or `None` for anonymous requests.
    pub user: Option<User>,
    /// `false` once session protection has flagged the session as possibly
    /// replayed from another client.
    pub fresh: bool,
}

impl RequestContext {
    /// An anonymous request.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            user: None,
            fresh: false,
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Username of the logged-in user.
    pub const USERNAME: &str = "username";

    /// Client fingerprint recorded at login (session protection).
    pub const FINGERPRINT: &str = "fingerprint";

    /// Whether the session is still trusted as a fresh login.
    pub const FRESH: &str = "fresh";
}
