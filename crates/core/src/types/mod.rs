//! Core types for fooapp.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod username;

pub use id::*;
pub use price::{Price, PriceError};
pub use username::{Username, UsernameError};
