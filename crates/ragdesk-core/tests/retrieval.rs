//! End-to-end behavior of the retrieval engine against in-memory and
//! scripted collaborators.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use ragdesk_core::embedding::HashEmbedder;
use ragdesk_core::index::{DisabledIndex, InMemoryVectorIndex};
use ragdesk_core::store::InMemoryDocumentStore;
use ragdesk_core::{
    DocId, Document, DocumentStore, HitRef, IndexError, IndexKey, IndexWrite, RetrievalEngine,
    RetrievalPath, VectorHit, VectorIndex, VectorMetadata,
};

// ─── Test doubles ───────────────────────────────────────────────────

/// Returns a fixed list of hits, or fails every call.
struct ScriptedIndex {
    hits: Vec<VectorHit>,
    /// Return every hit regardless of `top_k`.
    ignore_top_k: bool,
    fail_query: bool,
    fail_add: bool,
    adds: Mutex<Vec<(IndexKey, VectorMetadata)>>,
    queries: AtomicUsize,
}

impl ScriptedIndex {
    fn with_hits(hits: Vec<VectorHit>) -> Self {
        Self {
            hits,
            ignore_top_k: false,
            fail_query: false,
            fail_add: false,
            adds: Mutex::new(Vec::new()),
            queries: AtomicUsize::new(0),
        }
    }

    fn unbounded(hits: Vec<VectorHit>) -> Self {
        Self {
            ignore_top_k: true,
            ..Self::with_hits(hits)
        }
    }

    fn failing() -> Self {
        Self {
            fail_query: true,
            fail_add: true,
            ..Self::with_hits(Vec::new())
        }
    }
}

#[async_trait]
impl VectorIndex for ScriptedIndex {
    fn is_ready(&self) -> bool {
        true
    }

    async fn add(
        &self,
        key: &IndexKey,
        _title: &str,
        _content: &str,
        metadata: &VectorMetadata,
    ) -> Result<(), IndexError> {
        if self.fail_add {
            return Err(IndexError::Backend("connection refused".to_string()));
        }
        self.adds
            .lock()
            .unwrap()
            .push((key.clone(), metadata.clone()));
        Ok(())
    }

    async fn query(&self, _text: &str, top_k: usize) -> Result<Vec<VectorHit>, IndexError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_query {
            return Err(IndexError::Backend("connection refused".to_string()));
        }
        let limit = if self.ignore_top_k { usize::MAX } else { top_k };
        Ok(self.hits.iter().take(limit).cloned().collect())
    }
}

/// A store whose writes always fail.
struct ReadOnlyStore;

#[async_trait]
impl DocumentStore for ReadOnlyStore {
    async fn insert(&self, _title: &str, _content: &str) -> Result<Document> {
        bail!("disk full")
    }

    async fn get(&self, _id: DocId) -> Result<Option<Document>> {
        Ok(None)
    }

    async fn all(&self) -> Result<Vec<Document>> {
        Ok(Vec::new())
    }
}

/// A store whose reads always fail.
struct UnreadableStore;

#[async_trait]
impl DocumentStore for UnreadableStore {
    async fn insert(&self, _title: &str, _content: &str) -> Result<Document> {
        bail!("unavailable")
    }

    async fn get(&self, _id: DocId) -> Result<Option<Document>> {
        bail!("unavailable")
    }

    async fn all(&self) -> Result<Vec<Document>> {
        bail!("unavailable")
    }
}

/// Point lookups miss; full scans fail and are counted.
#[derive(Default)]
struct FailingScanStore {
    scans: AtomicUsize,
}

#[async_trait]
impl DocumentStore for FailingScanStore {
    async fn insert(&self, _title: &str, _content: &str) -> Result<Document> {
        bail!("unavailable")
    }

    async fn get(&self, _id: DocId) -> Result<Option<Document>> {
        Ok(None)
    }

    async fn all(&self) -> Result<Vec<Document>> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        bail!("scan timed out")
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

fn doc(id: i64, title: &str, content: &str) -> Document {
    Document {
        id: DocId(id),
        title: title.to_string(),
        content: content.to_string(),
    }
}

fn hit(
    key: &str,
    id: Option<i64>,
    title: Option<&str>,
    distance: Option<f64>,
    text: &str,
) -> VectorHit {
    VectorHit {
        key: IndexKey::new(key),
        distance,
        metadata: VectorMetadata {
            id: id.map(DocId),
            title: title.map(str::to_string),
        },
        text: text.to_string(),
    }
}

fn keyword_engine(docs: Vec<Document>) -> RetrievalEngine<InMemoryDocumentStore, DisabledIndex> {
    RetrievalEngine::new(InMemoryDocumentStore::with_documents(docs), DisabledIndex)
}

fn ids(results: &[ragdesk_core::SearchResult]) -> Vec<HitRef> {
    results.iter().map(|r| r.id.clone()).collect()
}

// ─── Ingestion ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_ingest_is_readable_without_index() {
    let engine = RetrievalEngine::new(InMemoryDocumentStore::new(), DisabledIndex);

    let ingestion = engine.ingest("Runbook", "restart the pod").await.unwrap();
    assert_eq!(ingestion.index, IndexWrite::Skipped);

    let stored = engine.store().get(ingestion.document.id).await.unwrap();
    assert_eq!(
        stored,
        Some(doc(ingestion.document.id.0, "Runbook", "restart the pod"))
    );
}

#[tokio::test]
async fn test_ingest_survives_index_add_failure() {
    let engine = RetrievalEngine::new(InMemoryDocumentStore::new(), ScriptedIndex::failing());

    let ingestion = engine.ingest("Runbook", "restart the pod").await.unwrap();
    match &ingestion.index {
        IndexWrite::Failed(msg) => assert!(msg.contains("connection refused")),
        other => panic!("expected a failed index write, got {:?}", other),
    }

    let stored = engine.store().get(ingestion.document.id).await.unwrap();
    assert_eq!(stored.map(|d| d.title), Some("Runbook".to_string()));
}

#[tokio::test]
async fn test_ingest_mirrors_with_typed_binding() {
    let engine = RetrievalEngine::new(
        InMemoryDocumentStore::new(),
        ScriptedIndex::with_hits(Vec::new()),
    );

    let ingestion = engine.ingest("Deploy Guide", "helm upgrade").await.unwrap();
    assert_eq!(ingestion.index, IndexWrite::Indexed);

    let adds = engine.index().adds.lock().unwrap().clone();
    assert_eq!(adds.len(), 1);
    let (key, meta) = &adds[0];
    assert_eq!(*key, IndexKey::for_document(ingestion.document.id));
    assert_eq!(meta.id, Some(ingestion.document.id));
    assert_eq!(meta.title.as_deref(), Some("Deploy Guide"));
}

#[tokio::test]
async fn test_ingest_propagates_store_failure_and_skips_index() {
    let engine = RetrievalEngine::new(ReadOnlyStore, ScriptedIndex::with_hits(Vec::new()));

    let err = engine.ingest("t", "c").await.unwrap_err();
    assert!(err.to_string().contains("disk full"));
    assert!(engine.index().adds.lock().unwrap().is_empty());
}

// ─── Keyword fallback ───────────────────────────────────────────────

#[tokio::test]
async fn test_fallback_scenario_beta() {
    let engine = keyword_engine(vec![doc(1, "A", "alpha beta"), doc(2, "B", "beta beta")]);

    let results = engine.search("beta", 5).await;
    assert_eq!(
        ids(&results),
        vec![HitRef::Document(DocId(2)), HitRef::Document(DocId(1))]
    );
    assert_eq!(results[0].score, 2.0);
    assert_eq!(results[1].score, 1.0);
    assert!(results.iter().all(|r| r.path == RetrievalPath::Keyword));
}

#[tokio::test]
async fn test_fallback_empty_store() {
    let engine = keyword_engine(Vec::new());
    assert!(engine.search("x", 3).await.is_empty());
}

#[tokio::test]
async fn test_fallback_stable_ties_and_truncation() {
    let engine = keyword_engine(vec![
        doc(1, "one", "ops"),
        doc(2, "two", "ops"),
        doc(3, "three", "ops ops"),
        doc(4, "four", "ops"),
        doc(5, "five", "dev"),
    ]);

    let results = engine.search("OPS", 3).await;
    assert_eq!(
        ids(&results),
        vec![
            HitRef::Document(DocId(3)),
            HitRef::Document(DocId(1)),
            HitRef::Document(DocId(2)),
        ]
    );
}

#[tokio::test]
async fn test_fallback_after_query_failure() {
    let store = InMemoryDocumentStore::with_documents(vec![
        doc(1, "Terraform", "terraform plan"),
        doc(2, "Ansible", "ansible playbook"),
    ]);
    let engine = RetrievalEngine::new(store, ScriptedIndex::failing());

    let results = engine.search("terraform", 3).await;
    assert_eq!(engine.index().queries.load(Ordering::SeqCst), 1);
    assert_eq!(ids(&results), vec![HitRef::Document(DocId(1))]);
    assert_eq!(results[0].score, 2.0);
    assert_eq!(results[0].path, RetrievalPath::Keyword);
}

#[tokio::test]
async fn test_fallback_store_failure_yields_empty() {
    let engine = RetrievalEngine::new(UnreadableStore, DisabledIndex);
    assert!(engine.search("anything", 3).await.is_empty());
}

#[tokio::test]
async fn test_empty_query_and_zero_top_k() {
    let engine = keyword_engine(vec![doc(1, "A", "alpha")]);
    assert!(engine.search("", 3).await.is_empty());
    assert!(engine.search("alpha", 0).await.is_empty());
}

#[tokio::test]
async fn test_whitespace_query_counts_literally() {
    let engine = keyword_engine(vec![
        doc(1, "A", "kubectl apply -f x"),
        doc(2, "B", "nospaces"),
    ]);

    let results = engine.search(" ", 3).await;
    assert_eq!(ids(&results), vec![HitRef::Document(DocId(1))]);
    assert_eq!(results[0].score, 3.0);

    let results = engine.search("apply ", 3).await;
    assert_eq!(results[0].score, 1.0);
}

#[tokio::test]
async fn test_top_k_bound() {
    let docs: Vec<Document> = (1..=6).map(|i| doc(i, "note", "kube")).collect();
    let engine = keyword_engine(docs);

    for k in 1..=8 {
        let results = engine.search("kube", k).await;
        assert_eq!(results.len(), k.min(6), "top_k = {}", k);
    }
}

// ─── Semantic path ──────────────────────────────────────────────────

#[tokio::test]
async fn test_semantic_reconciles_to_canonical_record() {
    let store = InMemoryDocumentStore::with_documents(vec![doc(
        7,
        "Deploy Guide",
        "canonical deployment steps",
    )]);
    let index = ScriptedIndex::with_hits(vec![hit(
        "7",
        Some(7),
        Some("Deploy Guide"),
        Some(0.2),
        "stale indexed copy",
    )]);
    let engine = RetrievalEngine::new(store, index);

    let results = engine.search("how do I deploy", 3).await;
    assert_eq!(results.len(), 1);
    let r = &results[0];
    assert_eq!(r.id, HitRef::Document(DocId(7)));
    assert_eq!(r.title, "Deploy Guide");
    assert_eq!(r.content, "canonical deployment steps");
    assert!((r.score - 0.8).abs() < 1e-9);
    assert_eq!(r.path, RetrievalPath::Semantic);
}

#[tokio::test]
async fn test_semantic_orphan_hit_is_synthesized() {
    let store = InMemoryDocumentStore::with_documents(vec![doc(1, "Other", "unrelated")]);
    let index = ScriptedIndex::with_hits(vec![hit(
        "99",
        Some(99),
        Some("Lost Doc"),
        Some(0.5),
        "indexed text",
    )]);
    let engine = RetrievalEngine::new(store, index);

    let results = engine.search("lost", 3).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, HitRef::Document(DocId(99)));
    assert_eq!(results[0].title, "Lost Doc");
    assert_eq!(results[0].content, "indexed text");
    assert!((results[0].score - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_semantic_orphan_with_non_numeric_key() {
    let engine = RetrievalEngine::new(
        InMemoryDocumentStore::new(),
        ScriptedIndex::with_hits(vec![hit("legacy-abc", None, None, None, "raw")]),
    );

    let results = engine.search("raw", 3).await;
    assert_eq!(results[0].id, HitRef::Key("legacy-abc".to_string()));
    assert_eq!(results[0].title, "");
    assert_eq!(results[0].content, "raw");
    assert_eq!(results[0].score, 1.0);
}

#[tokio::test]
async fn test_semantic_reconciles_by_title_when_id_missing() {
    let store = InMemoryDocumentStore::with_documents(vec![
        doc(1, "Intro", "hello"),
        doc(2, "Deploy Guide", "real content"),
    ]);
    let index = ScriptedIndex::with_hits(vec![hit(
        "uuid-1234",
        None,
        Some("Deploy Guide"),
        Some(0.1),
        "copy",
    )]);
    let engine = RetrievalEngine::new(store, index);

    let results = engine.search("deploy", 3).await;
    assert_eq!(results[0].id, HitRef::Document(DocId(2)));
    assert_eq!(results[0].content, "real content");
}

#[tokio::test]
async fn test_semantic_stale_id_falls_back_to_title_scan() {
    let store = InMemoryDocumentStore::with_documents(vec![doc(3, "Deploy Guide", "current")]);
    let index = ScriptedIndex::with_hits(vec![hit(
        "1",
        Some(1),
        Some("Deploy Guide"),
        Some(0.3),
        "old",
    )]);
    let engine = RetrievalEngine::new(store, index);

    let results = engine.search("deploy", 3).await;
    assert_eq!(results[0].id, HitRef::Document(DocId(3)));
    assert_eq!(results[0].content, "current");
}

#[tokio::test]
async fn test_semantic_key_used_when_metadata_lacks_id() {
    let store = InMemoryDocumentStore::with_documents(vec![doc(4, "Four", "four content")]);
    let index = ScriptedIndex::with_hits(vec![hit("4", None, None, Some(0.25), "x")]);
    let engine = RetrievalEngine::new(store, index);

    let results = engine.search("four", 3).await;
    assert_eq!(results[0].id, HitRef::Document(DocId(4)));
    assert_eq!(results[0].title, "Four");
    assert!((results[0].score - 0.75).abs() < 1e-9);
}

#[tokio::test]
async fn test_semantic_preserves_index_order() {
    let store = InMemoryDocumentStore::with_documents(vec![
        doc(1, "A", "a"),
        doc(2, "B", "b"),
        doc(3, "C", "c"),
    ]);
    let index = ScriptedIndex::with_hits(vec![
        hit("3", Some(3), Some("C"), Some(0.1), ""),
        hit("1", Some(1), Some("A"), Some(0.2), ""),
        hit("2", Some(2), Some("B"), Some(0.3), ""),
    ]);
    let engine = RetrievalEngine::new(store, index);

    let results = engine.search("q", 2).await;
    assert_eq!(
        ids(&results),
        vec![HitRef::Document(DocId(3)), HitRef::Document(DocId(1))]
    );
}

#[tokio::test]
async fn test_semantic_duplicate_hits_are_collapsed() {
    let store = InMemoryDocumentStore::with_documents(vec![doc(1, "A", "a"), doc(2, "B", "b")]);
    let index = ScriptedIndex::with_hits(vec![
        hit("1", Some(1), Some("A"), Some(0.4), ""),
        hit("2", Some(2), Some("B"), Some(0.5), ""),
        hit("1-stale", Some(1), Some("A"), Some(0.1), ""),
    ]);
    let engine = RetrievalEngine::new(store, index);

    let results = engine.search("q", 3).await;
    assert_eq!(
        ids(&results),
        vec![HitRef::Document(DocId(1)), HitRef::Document(DocId(2))]
    );
    assert!((results[0].score - 0.9).abs() < 1e-9);
}

#[tokio::test]
async fn test_semantic_results_truncated_when_index_overreturns() {
    let docs: Vec<Document> = (1..=5).map(|i| doc(i, "note", "body")).collect();
    let index = ScriptedIndex::unbounded(vec![
        hit("4", Some(4), None, Some(0.1), ""),
        hit("2", Some(2), None, Some(0.2), ""),
        hit("5", Some(5), None, Some(0.3), ""),
        hit("1", Some(1), None, Some(0.4), ""),
        hit("3", Some(3), None, Some(0.5), ""),
    ]);
    let engine = RetrievalEngine::new(InMemoryDocumentStore::with_documents(docs), index);

    let results = engine.search("q", 2).await;
    assert_eq!(
        ids(&results),
        vec![HitRef::Document(DocId(4)), HitRef::Document(DocId(2))]
    );
    assert!(results.iter().all(|r| r.path == RetrievalPath::Semantic));
}

#[tokio::test]
async fn test_semantic_failed_scan_is_attempted_once() {
    let index = ScriptedIndex::with_hits(vec![
        hit("10", Some(10), Some("Ten"), Some(0.1), "ten"),
        hit("11", Some(11), Some("Eleven"), Some(0.2), "eleven"),
        hit("legacy", None, Some("Twelve"), Some(0.3), "twelve"),
    ]);
    let engine = RetrievalEngine::new(FailingScanStore::default(), index);

    let results = engine.search("q", 3).await;
    assert_eq!(results.len(), 3);
    assert_eq!(results[2].id, HitRef::Key("legacy".to_string()));
    assert_eq!(engine.store().scans.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_semantic_empty_hits_do_not_fall_back() {
    let store = InMemoryDocumentStore::with_documents(vec![doc(1, "beta", "beta")]);
    let engine = RetrievalEngine::new(store, ScriptedIndex::with_hits(Vec::new()));
    assert!(engine.search("beta", 3).await.is_empty());
}

#[tokio::test]
async fn test_semantic_store_failure_synthesizes_results() {
    let index = ScriptedIndex::with_hits(vec![hit("5", Some(5), Some("Five"), Some(0.0), "text")]);
    let engine = RetrievalEngine::new(UnreadableStore, index);

    let results = engine.search("five", 3).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "Five");
    assert_eq!(results[0].content, "text");
}

// ─── Full round trip with the in-memory index ───────────────────────

#[tokio::test]
async fn test_ingest_then_semantic_search_roundtrip() {
    let engine = RetrievalEngine::new(
        InMemoryDocumentStore::new(),
        InMemoryVectorIndex::new(HashEmbedder::new(256)),
    );

    engine
        .ingest("Budget", "quarterly finance spreadsheet review")
        .await
        .unwrap();
    let deploy = engine
        .ingest("Deploy Guide", "deploy docker containers to kubernetes")
        .await
        .unwrap();
    assert_eq!(deploy.index, IndexWrite::Indexed);

    let results = engine.search("kubernetes deploy", 1).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, HitRef::Document(deploy.document.id));
    assert_eq!(results[0].title, "Deploy Guide");
    assert_eq!(results[0].path, RetrievalPath::Semantic);
    assert!(results[0].score > 0.0 && results[0].score <= 1.0 + 1e-6);
}
