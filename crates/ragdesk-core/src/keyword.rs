//! Literal keyword ranking used when semantic search is unavailable.
//!
//! A document's score is the number of times the lowercased query occurs in
//! its lowercased content plus the number of times it occurs in its
//! lowercased title. Occurrences are counted left to right without overlap,
//! so `"aa"` occurs twice in `"aaaa"`. The query is matched as one literal
//! string, not split into tokens.

use crate::models::Document;

/// Count non-overlapping occurrences of `needle` in `haystack`.
///
/// An empty needle counts as zero occurrences.
pub fn count_occurrences(needle: &str, haystack: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

/// Score one document against a query.
pub fn keyword_score(query: &str, doc: &Document) -> usize {
    let q = query.to_lowercase();
    score_lowered(&q, doc)
}

fn score_lowered(q: &str, doc: &Document) -> usize {
    count_occurrences(q, &doc.content.to_lowercase())
        + count_occurrences(q, &doc.title.to_lowercase())
}

/// Rank `documents` by keyword score.
///
/// Documents scoring zero are dropped. The sort is stable, so documents
/// with equal scores keep the order they had in `documents`. At most
/// `top_k` documents are returned.
pub fn rank_by_keyword(
    query: &str,
    documents: Vec<Document>,
    top_k: usize,
) -> Vec<(Document, usize)> {
    let q = query.to_lowercase();
    let mut scored: Vec<(Document, usize)> = documents
        .into_iter()
        .filter_map(|doc| {
            let score = score_lowered(&q, &doc);
            (score > 0).then_some((doc, score))
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.truncate(top_k);
    scored
}
