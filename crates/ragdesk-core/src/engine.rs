//! Hybrid retrieval engine.
//!
//! The engine owns a [`DocumentStore`] (the source of truth) and a
//! [`VectorIndex`] (a best-effort accelerator), both injected at
//! construction. It exposes two operations:
//!
//! - [`ingest`](RetrievalEngine::ingest) writes through to the store, then
//!   mirrors the document into the index if the index is ready. Only store
//!   failures reach the caller.
//! - [`search`](RetrievalEngine::search) prefers a semantic nearest-neighbor
//!   query and reconciles each hit back to its canonical record. When the
//!   index is not ready or the query fails, it falls back to literal keyword
//!   ranking over every stored document. It never returns an error.
//!
//! # Reconciliation
//!
//! Each vector hit names a document through its metadata id, or through its
//! key when the metadata carries none. The hit is resolved, in order:
//!
//! 1. by id lookup, when the reference is an integer id;
//! 2. by scanning all documents for the first whose id stringifies to the
//!    reference or whose title equals the hit's metadata title;
//! 3. otherwise by synthesizing a result from the hit's own key, metadata
//!    title, and indexed text.
//!
//! Hits resolving to the same reference are collapsed into one result that
//! keeps the best score and the position of the first occurrence.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::index::{IndexError, VectorIndex};
use crate::keyword::rank_by_keyword;
use crate::models::{
    Document, HitRef, IndexKey, RetrievalPath, SearchResult, VectorHit, VectorMetadata,
};
use crate::store::DocumentStore;

/// Number of results returned when the caller does not ask for a count.
pub const DEFAULT_TOP_K: usize = 3;

/// Outcome of mirroring a document into the vector index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "lowercase")]
pub enum IndexWrite {
    /// The vector index accepted the document.
    Indexed,
    /// The vector index was not ready; nothing was attempted.
    Skipped,
    /// The vector index rejected the write. The document is still stored.
    Failed(String),
}

/// Result of a successful [`RetrievalEngine::ingest`].
#[derive(Debug, Clone, Serialize)]
pub struct Ingestion {
    pub document: Document,
    pub index: IndexWrite,
}

pub struct RetrievalEngine<D, V> {
    store: D,
    index: V,
}

impl<D: DocumentStore, V: VectorIndex> RetrievalEngine<D, V> {
    pub fn new(store: D, index: V) -> Self {
        Self { store, index }
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    /// The injected vector index, e.g. for readiness reporting.
    pub fn index(&self) -> &V {
        &self.index
    }

    /// Store a new document and mirror it into the vector index.
    ///
    /// The store insert must succeed or the call fails. A failing mirror is
    /// logged and reported through [`Ingestion::index`]; it never rolls back
    /// the insert.
    pub async fn ingest(&self, title: &str, content: &str) -> Result<Ingestion> {
        let document = self.store.insert(title, content).await?;

        let index = match self.mirror(&document).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    doc_id = %document.id,
                    error = %e,
                    "failed to add document to vector index"
                );
                IndexWrite::Failed(e.to_string())
            }
        };

        debug!(doc_id = %document.id, ?index, "ingested document");
        Ok(Ingestion { document, index })
    }

    /// Write `doc` into the vector index under [`IndexKey::for_document`].
    ///
    /// Returns [`IndexWrite::Skipped`] without touching the index when it
    /// is not ready.
    pub async fn mirror(&self, doc: &Document) -> Result<IndexWrite, IndexError> {
        if !self.index.is_ready() {
            return Ok(IndexWrite::Skipped);
        }
        self.index
            .add(
                &IndexKey::for_document(doc.id),
                &doc.title,
                &doc.content,
                &VectorMetadata::for_document(doc),
            )
            .await?;
        Ok(IndexWrite::Indexed)
    }

    /// Rank documents against `query`, returning at most `top_k` results.
    ///
    /// An empty query and `top_k == 0` both yield no results. Whitespace is
    /// a literal needle like any other character.
    pub async fn search(&self, query: &str, top_k: usize) -> Vec<SearchResult> {
        if query.is_empty() || top_k == 0 {
            return Vec::new();
        }

        if self.index.is_ready() {
            match self.semantic_search(query, top_k).await {
                Ok(results) => return results,
                Err(e) => {
                    warn!(error = %e, "vector search failed, falling back to keyword search");
                }
            }
        } else {
            debug!("vector index not ready, using keyword search");
        }

        self.keyword_search(query, top_k).await
    }

    async fn semantic_search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, IndexError> {
        let hits = self.index.query(query, top_k).await?;

        let mut scan: Option<Option<Vec<Document>>> = None;
        let mut results: Vec<SearchResult> = Vec::with_capacity(hits.len());
        let mut seen: HashMap<HitRef, usize> = HashMap::new();

        for hit in &hits {
            let result = self.reconcile(hit, &mut scan).await;
            match seen.get(&result.id) {
                Some(&pos) => {
                    if result.score > results[pos].score {
                        results[pos] = result;
                    }
                }
                None => {
                    seen.insert(result.id.clone(), results.len());
                    results.push(result);
                }
            }
        }

        results.truncate(top_k);
        Ok(results)
    }

    /// Map one vector hit to a result, preferring the canonical record.
    ///
    /// `scan` caches the full document scan for the duration of a single
    /// search: `None` until attempted, `Some(None)` once it has failed.
    async fn reconcile(
        &self,
        hit: &VectorHit,
        scan: &mut Option<Option<Vec<Document>>>,
    ) -> SearchResult {
        let reference = hit.reference();
        let score = hit.distance.map(|d| 1.0 - d).unwrap_or(1.0);

        let mut found: Option<Document> = None;

        if let Some(id) = reference.doc_id() {
            match self.store.get(id).await {
                Ok(doc) => found = doc,
                Err(e) => warn!(
                    doc_id = %id,
                    error = %e,
                    "document lookup failed during reconciliation"
                ),
            }
        }

        if found.is_none() {
            if scan.is_none() {
                *scan = Some(match self.store.all().await {
                    Ok(all) => Some(all),
                    Err(e) => {
                        warn!(error = %e, "document scan failed during reconciliation");
                        None
                    }
                });
            }
            if let Some(Some(docs)) = scan.as_ref() {
                let title = hit.metadata.title.as_deref();
                found = docs
                    .iter()
                    .find(|d| reference.names(d) || title == Some(d.title.as_str()))
                    .cloned();
            }
        }

        match found {
            Some(doc) => SearchResult {
                id: HitRef::Document(doc.id),
                title: doc.title,
                content: doc.content,
                score,
                path: RetrievalPath::Semantic,
            },
            None => {
                debug!(reference = %reference, "vector hit has no matching document");
                SearchResult {
                    id: reference,
                    title: hit.metadata.title.clone().unwrap_or_default(),
                    content: hit.text.clone(),
                    score,
                    path: RetrievalPath::Semantic,
                }
            }
        }
    }

    async fn keyword_search(&self, query: &str, top_k: usize) -> Vec<SearchResult> {
        let docs = match self.store.all().await {
            Ok(docs) => docs,
            Err(e) => {
                warn!(error = %e, "document scan failed, returning no results");
                return Vec::new();
            }
        };

        rank_by_keyword(query, docs, top_k)
            .into_iter()
            .map(|(doc, count)| SearchResult {
                id: HitRef::Document(doc.id),
                title: doc.title,
                content: doc.content,
                score: count as f64,
                path: RetrievalPath::Keyword,
            })
            .collect()
    }
}
