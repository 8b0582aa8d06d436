//! User domain types.

use serde::{Deserialize, Serialize};

use fooapp_core::Username;

/// A login account.
///
/// Users are provisioned out of band (see `fooapp-cli user create`); the web
/// application only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique, normalized username. Also the session identity.
    pub username: Username,
}
