//! Non-negative product price.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum PriceError {
    /// The amount is NaN or infinite.
    #[error("price must be a finite number")]
    NotFinite,
    /// The amount is below zero.
    #[error("price must be at least {min}, got {value}")]
    Negative {
        /// Smallest allowed amount.
        min: f64,
        /// The rejected amount.
        value: f64,
    },
}

/// A product price.
///
/// Stored as a plain floating point amount (no currency). Always finite and
/// never below [`Price::MIN`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Price(f64);

impl Price {
    /// Smallest allowed price.
    pub const MIN: f64 = 0.0;

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns `PriceError` if `amount` is not finite or is negative.
    pub fn new(amount: f64) -> Result<Self, PriceError> {
        if !amount.is_finite() {
            return Err(PriceError::NotFinite);
        }
        if amount < Self::MIN {
            return Err(PriceError::Negative {
                min: Self::MIN,
                value: amount,
            });
        }
        Ok(Self(amount))
    }

    /// The raw amount.
    #[must_use]
    pub const fn amount(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Price {
    type Error = PriceError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for f64 {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
