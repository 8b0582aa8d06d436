//! Business logic services.
//!
//! - `auth` - Password verification and account provisioning

pub mod auth;
