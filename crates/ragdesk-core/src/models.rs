//! Core data models shared by the stores, the vector index, and the
//! retrieval engine.
//!
//! The Document Store and the Vector Index are keyed independently. The
//! binding between them is carried explicitly: every vector entry written by
//! ingestion holds the document's [`DocId`] in its [`VectorMetadata`] and is
//! stored under [`IndexKey::for_document`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned integer identifier of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(pub i64);

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for DocId {
    fn from(v: i64) -> Self {
        DocId(v)
    }
}

/// Canonical document record owned by the Document Store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub title: String,
    pub content: String,
}

/// Key under which a document is mirrored into the Vector Index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexKey(String);

impl IndexKey {
    pub fn new(key: impl Into<String>) -> Self {
        IndexKey(key.into())
    }

    /// The key ingestion uses for a document: the decimal form of its id.
    pub fn for_document(id: DocId) -> Self {
        IndexKey(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the key back into a [`DocId`] when it is composed only of
    /// ASCII digits.
    pub fn document_id(&self) -> Option<DocId> {
        parse_digits(&self.0)
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata stored alongside each vector entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl VectorMetadata {
    pub fn for_document(doc: &Document) -> Self {
        Self {
            id: Some(doc.id),
            title: Some(doc.title.clone()),
        }
    }
}

/// A single row returned by a nearest-neighbor query.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    pub key: IndexKey,
    /// Distance from the query; smaller is closer. Some backends omit it.
    pub distance: Option<f64>,
    pub metadata: VectorMetadata,
    /// The index's own copy of the document text.
    pub text: String,
}

impl VectorHit {
    /// The document this hit refers to: the metadata id when present,
    /// otherwise the hit's key.
    pub fn reference(&self) -> HitRef {
        match self.metadata.id {
            Some(id) => HitRef::Document(id),
            None => HitRef::from_key(&self.key),
        }
    }
}

/// What a search result points at.
///
/// Results reconciled to a canonical record, or whose reference is an
/// integer id, carry [`HitRef::Document`]. Hits from the vector index whose
/// key is not numeric keep the raw key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HitRef {
    Document(DocId),
    Key(String),
}

impl HitRef {
    pub fn from_key(key: &IndexKey) -> Self {
        match key.document_id() {
            Some(id) => HitRef::Document(id),
            None => HitRef::Key(key.as_str().to_string()),
        }
    }

    pub fn doc_id(&self) -> Option<DocId> {
        match self {
            HitRef::Document(id) => Some(*id),
            HitRef::Key(_) => None,
        }
    }

    /// True if `doc` is the document this reference names, comparing the
    /// stringified id.
    pub fn names(&self, doc: &Document) -> bool {
        match self {
            HitRef::Document(id) => *id == doc.id,
            HitRef::Key(key) => doc.id.to_string() == *key,
        }
    }
}

impl fmt::Display for HitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HitRef::Document(id) => write!(f, "{}", id),
            HitRef::Key(key) => f.write_str(key),
        }
    }
}

/// Which ranking method produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalPath {
    /// Nearest-neighbor query against the vector index; `score = 1 - distance`.
    Semantic,
    /// Literal substring counting over the Document Store; `score` is the count.
    Keyword,
}

impl fmt::Display for RetrievalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalPath::Semantic => f.write_str("semantic"),
            RetrievalPath::Keyword => f.write_str("keyword"),
        }
    }
}

/// A ranked search result. Higher `score` is better within a single query;
/// scores from different paths are not comparable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: HitRef,
    pub title: String,
    pub content: String,
    pub score: f64,
    pub path: RetrievalPath,
}

fn parse_digits(s: &str) -> Option<DocId> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<i64>().ok().map(DocId)
}
