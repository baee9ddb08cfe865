//! SQLite-backed [`DocumentStore`] and [`VectorIndex`].
//!
//! Both share one [`SqlitePool`] but live in separate tables. `documents`
//! is the source of truth; `vector_entries` is a derived, best-effort
//! mirror whose rows carry the owning document id in `doc_id`.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use ragdesk_core::embedding::{blob_to_vec, cosine_distance, embed_one, vec_to_blob, Embedder};
use ragdesk_core::index::embedding_input;
use ragdesk_core::{
    DocId, Document, DocumentStore, IndexError, IndexKey, VectorHit, VectorIndex, VectorMetadata,
};

/// SQLite implementation of [`DocumentStore`] over the `documents` table.
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn insert(&self, title: &str, content: &str) -> Result<Document> {
        let now = chrono::Utc::now().timestamp();
        let result =
            sqlx::query("INSERT INTO documents (title, content, created_at) VALUES (?, ?, ?)")
                .bind(title)
                .bind(content)
                .bind(now)
                .execute(&self.pool)
                .await?;

        Ok(Document {
            id: DocId(result.last_insert_rowid()),
            title: title.to_string(),
            content: content.to_string(),
        })
    }

    async fn get(&self, id: DocId) -> Result<Option<Document>> {
        let row = sqlx::query("SELECT id, title, content FROM documents WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| Document {
            id: DocId(r.get("id")),
            title: r.get("title"),
            content: r.get("content"),
        }))
    }

    async fn all(&self) -> Result<Vec<Document>> {
        let rows = sqlx::query("SELECT id, title, content FROM documents ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|r| Document {
                id: DocId(r.get("id")),
                title: r.get("title"),
                content: r.get("content"),
            })
            .collect())
    }
}

/// SQLite implementation of [`VectorIndex`] over the `vector_entries` table.
///
/// Ready only when an embedder is configured. Queries score every row
/// written by the current model and dimensionality; rows from a previous
/// model are ignored rather than compared across vector spaces.
pub struct SqliteVectorIndex {
    pool: SqlitePool,
    embedder: Option<Arc<dyn Embedder>>,
}

impl SqliteVectorIndex {
    pub fn new(pool: SqlitePool, embedder: Option<Arc<dyn Embedder>>) -> Self {
        Self { pool, embedder }
    }

    fn embedder(&self) -> Result<&dyn Embedder, IndexError> {
        self.embedder.as_deref().ok_or(IndexError::NotReady)
    }
}

fn backend(e: sqlx::Error) -> IndexError {
    IndexError::Backend(e.to_string())
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    fn is_ready(&self) -> bool {
        self.embedder.is_some()
    }

    async fn add(
        &self,
        key: &IndexKey,
        title: &str,
        content: &str,
        metadata: &VectorMetadata,
    ) -> Result<(), IndexError> {
        let embedder = self.embedder()?;
        let vector = embed_one(embedder, &embedding_input(title, content))
            .await
            .map_err(|e| IndexError::Embedding(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO vector_entries
                (key, doc_id, title, text, embedding, model, dims, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                doc_id = excluded.doc_id,
                title = excluded.title,
                text = excluded.text,
                embedding = excluded.embedding,
                model = excluded.model,
                dims = excluded.dims,
                created_at = excluded.created_at
            "#,
        )
        .bind(key.as_str())
        .bind(metadata.id.map(|id| id.0))
        .bind(metadata.title.as_deref())
        .bind(content)
        .bind(vec_to_blob(&vector))
        .bind(embedder.model_name())
        .bind(vector.len() as i64)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(())
    }

    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<VectorHit>, IndexError> {
        let embedder = self.embedder()?;
        let query_vec = embed_one(embedder, text)
            .await
            .map_err(|e| IndexError::Embedding(e.to_string()))?;

        let rows = sqlx::query(
            "SELECT key, doc_id, title, text, embedding FROM vector_entries \
             WHERE model = ? AND dims = ? ORDER BY created_at ASC, key ASC",
        )
        .bind(embedder.model_name())
        .bind(query_vec.len() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        let mut hits: Vec<VectorHit> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let doc_id: Option<i64> = row.get("doc_id");
                let key: String = row.get("key");
                VectorHit {
                    key: IndexKey::new(key),
                    distance: Some(cosine_distance(&query_vec, &blob_to_vec(&blob))),
                    metadata: VectorMetadata {
                        id: doc_id.map(DocId),
                        title: row.get("title"),
                    },
                    text: row.get("text"),
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);
        Ok(hits)
    }
}
