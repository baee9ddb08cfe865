//! In-memory [`VectorIndex`] backed by brute-force cosine distance.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::embedding::{cosine_distance, embed_one, Embedder};
use crate::models::{IndexKey, VectorHit, VectorMetadata};

use super::{embedding_input, IndexError, VectorIndex};

struct Entry {
    key: IndexKey,
    vector: Vec<f32>,
    metadata: VectorMetadata,
    text: String,
}

/// Keeps every entry in a `Vec` and scores all of them per query.
/// Entries with equal distance keep insertion order.
pub struct InMemoryVectorIndex<E> {
    embedder: E,
    entries: RwLock<Vec<Entry>>,
}

impl<E: Embedder> InMemoryVectorIndex<E> {
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> IndexError {
    IndexError::Backend("vector index lock poisoned".to_string())
}

#[async_trait]
impl<E: Embedder> VectorIndex for InMemoryVectorIndex<E> {
    fn is_ready(&self) -> bool {
        true
    }

    async fn add(
        &self,
        key: &IndexKey,
        title: &str,
        content: &str,
        metadata: &VectorMetadata,
    ) -> Result<(), IndexError> {
        let vector = embed_one(&self.embedder, &embedding_input(title, content))
            .await
            .map_err(|e| IndexError::Embedding(e.to_string()))?;

        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let entry = Entry {
            key: key.clone(),
            vector,
            metadata: metadata.clone(),
            text: content.to_string(),
        };
        match entries.iter_mut().find(|e| e.key == *key) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        Ok(())
    }

    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<VectorHit>, IndexError> {
        let query_vec = embed_one(&self.embedder, text)
            .await
            .map_err(|e| IndexError::Embedding(e.to_string()))?;

        let entries = self.entries.read().map_err(|_| poisoned())?;
        let mut hits: Vec<VectorHit> = entries
            .iter()
            .map(|e| VectorHit {
                key: e.key.clone(),
                distance: Some(cosine_distance(&query_vec, &e.vector)),
                metadata: e.metadata.clone(),
                text: e.text.clone(),
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
