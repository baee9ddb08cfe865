//! Vector Index abstraction.
//!
//! The [`VectorIndex`] is a secondary, optionally-stale accelerator over
//! the Document Store. It may be entirely absent (no embedding backend
//! configured), so callers check [`is_ready`](VectorIndex::is_ready) before
//! every use and must treat every [`IndexError`] as recoverable.

pub mod memory;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::{IndexKey, VectorHit, VectorMetadata};

pub use memory::InMemoryVectorIndex;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("vector index is not ready")]
    NotReady,

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("vector index backend error: {0}")]
    Backend(String),

    #[error("vector index call timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Whether the index can serve `add` and `query` right now.
    fn is_ready(&self) -> bool;

    /// Embed `title` and `content` and store them under `key`, replacing any
    /// existing entry with the same key.
    async fn add(
        &self,
        key: &IndexKey,
        title: &str,
        content: &str,
        metadata: &VectorMetadata,
    ) -> Result<(), IndexError>;

    /// Return up to `top_k` entries nearest to `text`, ascending distance.
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<VectorHit>, IndexError>;
}

#[async_trait]
impl<T: VectorIndex + ?Sized> VectorIndex for Arc<T> {
    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    async fn add(
        &self,
        key: &IndexKey,
        title: &str,
        content: &str,
        metadata: &VectorMetadata,
    ) -> Result<(), IndexError> {
        (**self).add(key, title, content, metadata).await
    }

    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<VectorHit>, IndexError> {
        (**self).query(text, top_k).await
    }
}

/// An index that is never ready. Used when no embedding backend is
/// configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledIndex;

#[async_trait]
impl VectorIndex for DisabledIndex {
    fn is_ready(&self) -> bool {
        false
    }

    async fn add(
        &self,
        _key: &IndexKey,
        _title: &str,
        _content: &str,
        _metadata: &VectorMetadata,
    ) -> Result<(), IndexError> {
        Err(IndexError::NotReady)
    }

    async fn query(&self, _text: &str, _top_k: usize) -> Result<Vec<VectorHit>, IndexError> {
        Err(IndexError::NotReady)
    }
}

/// The text an index embeds for a document.
pub fn embedding_input(title: &str, content: &str) -> String {
    if title.is_empty() {
        content.to_string()
    } else {
        format!("{}\n\n{}", title, content)
    }
}
