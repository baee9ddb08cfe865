//! # ragdesk core
//!
//! Runtime-agnostic logic for ragdesk: the document model, the
//! [`store::DocumentStore`] and [`index::VectorIndex`] abstractions, the
//! literal keyword ranker, embedding utilities, and the hybrid
//! [`engine::RetrievalEngine`].
//!
//! This crate contains no tokio, sqlx, or filesystem I/O. Durable backends
//! live in the `ragdesk` application crate and plug in through the traits.

pub mod embedding;
pub mod engine;
pub mod index;
pub mod keyword;
pub mod models;
pub mod store;

pub use engine::{IndexWrite, Ingestion, RetrievalEngine, DEFAULT_TOP_K};
pub use index::{IndexError, VectorIndex};
pub use models::{
    DocId, Document, HitRef, IndexKey, RetrievalPath, SearchResult, VectorHit, VectorMetadata,
};
pub use store::DocumentStore;
