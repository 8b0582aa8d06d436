//! `PostgreSQL` document store.
//!
//! Documents live in a single `documents` table as JSONB bodies. The
//! configured database name namespaces rows, so several catalogs can share
//! one `PostgreSQL` database. See `migrations/` for the schema.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use fooapp_core::DocumentId;

use super::store::{Collection, Document, DocumentStore, Fields, Filter, StoreError};

/// Row shape shared by every document query.
#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    body: Json<Value>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = StoreError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        let id = DocumentId::from_uuid(row.id);
        match row.body.0 {
            Value::Object(fields) => Ok(Self { id, fields }),
            _ => Err(StoreError::MalformedDocument(id)),
        }
    }
}

/// Document store backed by a `PostgreSQL` JSONB table.
#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
    database: String,
}

impl PostgresDocumentStore {
    /// Create a store over `pool`, scoped to the `database` namespace.
    #[must_use]
    pub fn new(pool: PgPool, database: impl Into<String>) -> Self {
        Self {
            pool,
            database: database.into(),
        }
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn find(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let rows: Vec<DocumentRow> = sqlx::query_as(
            r"
            SELECT id, body
            FROM documents
            WHERE database = $1 AND collection = $2
            ORDER BY created_at, seq
            ",
        )
        .bind(&self.database)
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Document::try_from).collect()
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: Filter<'_>,
    ) -> Result<Option<Document>, StoreError> {
        let row: Option<DocumentRow> = match filter {
            Filter::Id(id) => {
                sqlx::query_as(
                    r"
                    SELECT id, body
                    FROM documents
                    WHERE database = $1 AND collection = $2 AND id = $3
                    ",
                )
                .bind(&self.database)
                .bind(collection.as_str())
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
            }
            Filter::Field { name, value } => {
                sqlx::query_as(
                    r"
                    SELECT id, body
                    FROM documents
                    WHERE database = $1 AND collection = $2 AND body ->> $3 = $4
                    ORDER BY created_at, seq
                    LIMIT 1
                    ",
                )
                .bind(&self.database)
                .bind(collection.as_str())
                .bind(name)
                .bind(value)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        row.map(Document::try_from).transpose()
    }

    async fn insert_one(
        &self,
        collection: Collection,
        fields: Fields,
    ) -> Result<DocumentId, StoreError> {
        let id = DocumentId::new_random();

        sqlx::query(
            r"
            INSERT INTO documents (id, database, collection, body)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(id)
        .bind(&self.database)
        .bind(collection.as_str())
        .bind(Json(Value::Object(fields)))
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn find_one_and_update(
        &self,
        collection: Collection,
        id: DocumentId,
        fields: Fields,
    ) -> Result<Option<Document>, StoreError> {
        let row: Option<DocumentRow> = sqlx::query_as(
            r"
            UPDATE documents
            SET body = body || $4
            WHERE database = $1 AND collection = $2 AND id = $3
            RETURNING id, body
            ",
        )
        .bind(&self.database)
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(Value::Object(fields)))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Document::try_from).transpose()
    }

    async fn delete_one(
        &self,
        collection: Collection,
        id: DocumentId,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r"
            DELETE FROM documents
            WHERE database = $1 AND collection = $2 AND id = $3
            ",
        )
        .bind(&self.database)
        .bind(collection.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
