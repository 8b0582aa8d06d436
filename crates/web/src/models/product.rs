//! Product domain types.

use serde::{Deserialize, Serialize};

use fooapp_core::{Price, ProductId};

/// Validated, storable product fields.
///
/// Produced by the product form and persisted as the document body. This is
/// everything about a product except its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductData {
    /// Display name (1-255 characters).
    pub name: String,
    /// Free-form description, possibly empty.
    #[serde(default)]
    pub description: String,
    /// Non-negative price.
    pub price: Price,
}

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Store-assigned id, immutable after creation.
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
}

impl Product {
    /// Combine an id with its stored fields.
    #[must_use]
    pub fn from_parts(id: ProductId, data: ProductData) -> Self {
        Self {
            id,
            name: data.name,
            description: data.description,
            price: data.price,
        }
    }

    /// The editable fields of this product.
    #[must_use]
    pub fn data(&self) -> ProductData {
        ProductData {
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
        }
    }
}
