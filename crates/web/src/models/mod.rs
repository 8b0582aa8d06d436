//! Domain models for the catalog.
//!
//! These types are validated domain objects, separate from the raw
//! documents persisted by the store.

pub mod product;
pub mod session;
pub mod user;

pub use product::{Product, ProductData};
pub use session::{RequestContext, keys as session_keys};
pub use user::User;
