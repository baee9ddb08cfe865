//! In-memory [`DocumentStore`] for tests and embedders of the core crate.
//!
//! Documents live in a `Vec` behind `std::sync::RwLock`; ids come from a
//! monotonic counter starting at 1.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{DocId, Document};

use super::DocumentStore;

struct Inner {
    next_id: i64,
    docs: Vec<Document>,
}

pub struct InMemoryDocumentStore {
    inner: RwLock<Inner>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_id: 1,
                docs: Vec::new(),
            }),
        }
    }

    /// Seed the store with documents carrying fixed ids.
    ///
    /// Later inserts continue from the largest seeded id.
    pub fn with_documents(docs: Vec<Document>) -> Self {
        let next_id = docs.iter().map(|d| d.id.0).max().unwrap_or(0) + 1;
        Self {
            inner: RwLock::new(Inner { next_id, docs }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|g| g.docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, title: &str, content: &str) -> Result<Document> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| anyhow!("document store lock poisoned"))?;
        let doc = Document {
            id: DocId(inner.next_id),
            title: title.to_string(),
            content: content.to_string(),
        };
        inner.next_id += 1;
        inner.docs.push(doc.clone());
        Ok(doc)
    }

    async fn get(&self, id: DocId) -> Result<Option<Document>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| anyhow!("document store lock poisoned"))?;
        Ok(inner.docs.iter().find(|d| d.id == id).cloned())
    }

    async fn all(&self) -> Result<Vec<Document>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| anyhow!("document store lock poisoned"))?;
        Ok(inner.docs.clone())
    }
}
