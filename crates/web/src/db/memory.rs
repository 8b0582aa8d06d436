//! In-memory document store.
//!
//! Selected with `FOOAPP_DATABASE_URL=memory://`. Contents live for the
//! lifetime of the process; used for local development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use fooapp_core::DocumentId;

use super::store::{Collection, Document, DocumentStore, Fields, Filter, StoreError};

/// Document store backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).cloned().unwrap_or_default())
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: Filter<'_>,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|doc| filter.matches(doc)))
            .cloned())
    }

    async fn insert_one(
        &self,
        collection: Collection,
        fields: Fields,
    ) -> Result<DocumentId, StoreError> {
        let id = DocumentId::new_random();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection)
            .or_default()
            .push(Document { id, fields });
        Ok(id)
    }

    async fn find_one_and_update(
        &self,
        collection: Collection,
        id: DocumentId,
        fields: Fields,
    ) -> Result<Option<Document>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
        else {
            return Ok(None);
        };

        doc.fields.extend(fields);
        Ok(Some(doc.clone()))
    }

    async fn delete_one(
        &self,
        collection: Collection,
        id: DocumentId,
    ) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(0);
        };

        let before = docs.len();
        docs.retain(|doc| doc.id != id);
        Ok((before - docs.len()) as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
