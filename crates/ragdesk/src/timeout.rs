//! Deadline wrapper for vector index calls.

use async_trait::async_trait;
use std::time::Duration;

use ragdesk_core::{IndexError, IndexKey, VectorHit, VectorIndex, VectorMetadata};

/// Bounds every `add` and `query` on the wrapped index with a deadline.
///
/// An elapsed deadline surfaces as [`IndexError::Timeout`], which the
/// retrieval engine handles like any other index failure.
pub struct TimeoutIndex<V> {
    inner: V,
    timeout: Duration,
}

impl<V: VectorIndex> TimeoutIndex<V> {
    pub fn new(inner: V, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<V: VectorIndex> VectorIndex for TimeoutIndex<V> {
    fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    async fn add(
        &self,
        key: &IndexKey,
        title: &str,
        content: &str,
        metadata: &VectorMetadata,
    ) -> Result<(), IndexError> {
        tokio::time::timeout(self.timeout, self.inner.add(key, title, content, metadata))
            .await
            .map_err(|_| IndexError::Timeout(self.timeout))?
    }

    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<VectorHit>, IndexError> {
        tokio::time::timeout(self.timeout, self.inner.query(text, top_k))
            .await
            .map_err(|_| IndexError::Timeout(self.timeout))?
    }
}
