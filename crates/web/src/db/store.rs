//! Document store interface.
//!
//! The catalog treats persistence as a schemaless document store: each
//! collection holds JSON objects identified by an opaque [`DocumentId`]
//! assigned on insert. Every call is atomic for the single document it
//! touches; nothing here spans documents.

use async_trait::async_trait;
use serde_json::{Map, Value};

use fooapp_core::DocumentId;

/// Top-level fields of a document, excluding its id.
pub type Fields = Map<String, Value>;

/// Collections known to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Pre-provisioned login accounts.
    Users,
    /// The product catalog.
    Products,
}

impl Collection {
    /// Collection name as persisted.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Products => "products",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored document: its id plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Fields,
}

/// Selects a single document.
#[derive(Debug, Clone, Copy)]
pub enum Filter<'a> {
    /// Match by document id.
    Id(DocumentId),
    /// Match a top-level string field exactly.
    Field {
        name: &'a str,
        value: &'a str,
    },
}

impl Filter<'_> {
    /// Whether `document` satisfies this filter.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        match *self {
            Self::Id(id) => document.id == id,
            Self::Field { name, value } => {
                document.fields.get(name).and_then(Value::as_str) == Some(value)
            }
        }
    }
}

/// Errors raised by a store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored body was not a JSON object.
    #[error("document {0} is not a JSON object")]
    MalformedDocument(DocumentId),
}

/// Narrow interface over the document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents in `collection`, in insertion order.
    async fn find(&self, collection: Collection) -> Result<Vec<Document>, StoreError>;

    /// The first document in `collection` matching `filter`.
    async fn find_one(
        &self,
        collection: Collection,
        filter: Filter<'_>,
    ) -> Result<Option<Document>, StoreError>;

    /// Insert a new document and return its freshly assigned id.
    async fn insert_one(
        &self,
        collection: Collection,
        fields: Fields,
    ) -> Result<DocumentId, StoreError>;

    /// Set `fields` on the document `id` (top-level merge, no upsert).
    ///
    /// Returns the updated document, or `None` if no document has that id.
    async fn find_one_and_update(
        &self,
        collection: Collection,
        id: DocumentId,
        fields: Fields,
    ) -> Result<Option<Document>, StoreError>;

    /// Delete the document `id`, returning how many documents were removed.
    async fn delete_one(&self, collection: Collection, id: DocumentId)
    -> Result<u64, StoreError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(username: &str) -> Document {
        let Value::Object(fields) = json!({ "username": username, "password": "x" }) else {
            unreachable!()
        };
        Document {
            id: DocumentId::new_random(),
            fields,
        }
    }

    #[test]
    fn test_filter_by_id() {
        let d = doc("alice");
        assert!(Filter::Id(d.id).matches(&d));
        assert!(!Filter::Id(DocumentId::new_random()).matches(&d));
    }

    #[test]
    fn test_filter_by_field() {
        let d = doc("alice");
        let hit = Filter::Field {
            name: "username",
            value: "alice",
        };
        let miss = Filter::Field {
            name: "username",
            value: "Alice",
        };
        let absent = Filter::Field {
            name: "email",
            value: "alice",
        };
        assert!(hit.matches(&d));
        assert!(!miss.matches(&d));
        assert!(!absent.matches(&d));
    }

    #[test]
    fn test_collection_names() {
        assert_eq!(Collection::Users.as_str(), "users");
        assert_eq!(Collection::Products.to_string(), "products");
    }
}
