//! Product repository.
//!
//! Maps [`Product`] values to documents in the `products` collection.

use serde_json::Value;

use fooapp_core::{DocumentId, ProductId};

use super::RepositoryError;
use super::store::{Collection, Document, DocumentStore, Fields, Filter};
use crate::models::{Product, ProductData};

/// Repository for product documents.
pub struct ProductRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// List every product in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a document is not a valid product.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        self.store
            .find(Collection::Products)
            .await?
            .into_iter()
            .map(to_product)
            .collect()
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the document is not a valid product.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.store
            .find_one(Collection::Products, Filter::Id(id.into()))
            .await?
            .map(to_product)
            .transpose()
    }

    /// Insert a new product and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the insert fails.
    pub async fn create(&self, data: &ProductData) -> Result<ProductId, RepositoryError> {
        let id = self
            .store
            .insert_one(Collection::Products, to_fields(data)?)
            .await?;
        Ok(id.into())
    }

    /// Overwrite the editable fields of an existing product.
    ///
    /// Returns `None` if no product has that id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the update fails.
    pub async fn update(
        &self,
        id: ProductId,
        data: &ProductData,
    ) -> Result<Option<Product>, RepositoryError> {
        self.store
            .find_one_and_update(Collection::Products, id.into(), to_fields(data)?)
            .await?
            .map(to_product)
            .transpose()
    }

    /// Delete a product.
    ///
    /// # Returns
    ///
    /// Returns `true` if the product was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the delete fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let deleted = self
            .store
            .delete_one(Collection::Products, DocumentId::from(id))
            .await?;
        Ok(deleted > 0)
    }
}

fn to_fields(data: &ProductData) -> Result<Fields, RepositoryError> {
    match serde_json::to_value(data)? {
        Value::Object(fields) => Ok(fields),
        other => Err(RepositoryError::DataCorruption(format!(
            "product serialized to non-object: {other}"
        ))),
    }
}

fn to_product(doc: Document) -> Result<Product, RepositoryError> {
    let data: ProductData = serde_json::from_value(Value::Object(doc.fields)).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid product {}: {e}", doc.id))
    })?;
    Ok(Product::from_parts(doc.id.into(), data))
}
