//! Literal substring matching for queries with no embeddable signal.
//!
//! A document matches when any query token occurs in its lower-cased title or
//! content preview. This path filters rather than ranks: every match gets
//! [`FALLBACK_SCORE`] and matches come back in index order.

use std::collections::BTreeSet;

use unicode_normalization::UnicodeNormalization;

use super::corpus::CorpusIndex;
use super::ranker::SearchHit;
use super::tokenizer::Tokenizer;

/// Placeholder score assigned to every literal match.
pub const FALLBACK_SCORE: f32 = 0.5;

pub fn fallback_search(
    query: &str,
    index: &CorpusIndex,
    tokenizer: &Tokenizer,
    top_k: usize,
) -> Vec<SearchHit> {
    let candidates: BTreeSet<String> = tokenizer.tokenize(query).into_iter().collect();
    if candidates.is_empty() || top_k == 0 {
        return Vec::new();
    }

    index
        .iter()
        .filter(|(_, doc)| {
            let title = fold(&doc.metadata.title);
            let preview = fold(&doc.metadata.content_preview);
            candidates
                .iter()
                .any(|word| title.contains(word.as_str()) || preview.contains(word.as_str()))
        })
        .take(top_k)
        .map(|(identifier, doc)| SearchHit {
            identifier: identifier.to_string(),
            score: FALLBACK_SCORE,
            metadata: doc.metadata.clone(),
        })
        .collect()
}

/// Same normalization the tokenizer applies: NFC, then lower-case.
fn fold(text: &str) -> String {
    text.nfc().collect::<String>().to_lowercase()
}
