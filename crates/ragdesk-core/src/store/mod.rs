//! Document Store abstraction.
//!
//! The [`DocumentStore`] is the durability boundary of ragdesk: it owns the
//! canonical copy of every document and assigns its integer id. The
//! retrieval engine reads from it and writes to it only through
//! [`insert`](DocumentStore::insert).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`insert`](DocumentStore::insert) | Store a new document and assign its id |
//! | [`get`](DocumentStore::get) | Look up one document by id |
//! | [`all`](DocumentStore::all) | Scan every document |

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{DocId, Document};

pub use memory::InMemoryDocumentStore;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document.
    ///
    /// The returned id is unique and never reused. Callers may rely on
    /// uniqueness only, not on magnitude ordering.
    async fn insert(&self, title: &str, content: &str) -> Result<Document>;

    /// Retrieve a document by id.
    async fn get(&self, id: DocId) -> Result<Option<Document>>;

    /// Return every stored document.
    ///
    /// The contract does not fix an order; both bundled implementations
    /// return ascending id order. The keyword fallback breaks score ties by
    /// this order, so implementations should keep it stable between calls.
    async fn all(&self) -> Result<Vec<Document>>;
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    async fn insert(&self, title: &str, content: &str) -> Result<Document> {
        (**self).insert(title, content).await
    }

    async fn get(&self, id: DocId) -> Result<Option<Document>> {
        (**self).get(id).await
    }

    async fn all(&self) -> Result<Vec<Document>> {
        (**self).all().await
    }
}
