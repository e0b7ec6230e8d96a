//! Cosine-similarity ranking over the corpus index.
//!
//! The query is normalized to unit length and scored against every document
//! with a nonzero embedding (documents store their unit vector from
//! ingestion). Results are ordered by score descending, ties broken by
//! identifier ascending, and truncated to `top_k` with a bounded min-heap.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use anyhow::{Result, bail};
use rayon::prelude::*;

use super::corpus::{CorpusIndex, IndexedDocument};
use super::document::DocumentMetadata;
use super::embedder::{dot_product, normalize};

/// Minimum document count for the parallel scan.
/// Below this, Rayon task overhead outweighs the benefit.
const PARALLEL_THRESHOLD: usize = 10_000;

/// Documents per parallel task.
const PARALLEL_CHUNK_SIZE: usize = 1024;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SearchHit {
    pub identifier: String,
    pub score: f32,
    pub metadata: DocumentMetadata,
}

/// Rank every nonzero document against `query_embedding`.
///
/// Returns an empty list for a zero-magnitude query; the caller decides
/// whether to fall back to literal matching.
pub fn rank(query_embedding: &[f32], index: &CorpusIndex, top_k: usize) -> Result<Vec<SearchHit>> {
    if query_embedding.len() != index.dimension() {
        bail!(
            "query dimension mismatch: expected {}, got {}",
            index.dimension(),
            query_embedding.len()
        );
    }
    if top_k == 0 {
        return Ok(Vec::new());
    }
    // Heaps are sized from `top_k`; a caller may pass any value.
    let top_k = top_k.min(index.len());
    let Some(query) = normalize(query_embedding) else {
        return Ok(Vec::new());
    };

    let scored = if index.len() >= PARALLEL_THRESHOLD {
        top_k_parallel(index, &query, top_k)
    } else {
        top_k_sequential(index.iter(), &query, top_k)
    };

    Ok(scored
        .into_iter()
        .filter_map(|entry| {
            index.metadata(entry.identifier).map(|metadata| SearchHit {
                identifier: entry.identifier.to_string(),
                score: entry.score,
                metadata: metadata.clone(),
            })
        })
        .collect())
}

fn top_k_sequential<'a>(
    docs: impl Iterator<Item = (&'a str, &'a IndexedDocument)>,
    query: &[f32],
    k: usize,
) -> Vec<ScoredEntry<'a>> {
    let mut heap = BinaryHeap::with_capacity(k + 1);
    for (identifier, doc) in docs {
        let Some(unit) = doc.unit.as_deref() else {
            continue;
        };
        heap.push(Reverse(ScoredEntry {
            score: dot_product(query, unit),
            identifier,
        }));
        if heap.len() > k {
            heap.pop();
        }
    }
    into_sorted(heap.into_iter().map(|entry| entry.0).collect())
}

/// Thread-local heaps per chunk, merged into the final top-k.
fn top_k_parallel<'a>(index: &'a CorpusIndex, query: &[f32], k: usize) -> Vec<ScoredEntry<'a>> {
    let docs: Vec<(&'a str, &'a IndexedDocument)> = index.iter().collect();
    let partial: Vec<Vec<ScoredEntry<'a>>> = docs
        .par_chunks(PARALLEL_CHUNK_SIZE)
        .map(|chunk| top_k_sequential(chunk.iter().copied(), query, k))
        .collect();

    let mut final_heap = BinaryHeap::with_capacity(k + 1);
    for entry in partial.into_iter().flatten() {
        final_heap.push(Reverse(entry));
        if final_heap.len() > k {
            final_heap.pop();
        }
    }
    into_sorted(final_heap.into_iter().map(|entry| entry.0).collect())
}

/// Best first: score descending, then identifier ascending.
fn into_sorted(mut entries: Vec<ScoredEntry<'_>>) -> Vec<ScoredEntry<'_>> {
    entries.sort_by(|a, b| b.cmp(a));
    entries
}

#[derive(Debug, Clone, Copy)]
struct ScoredEntry<'a> {
    score: f32,
    identifier: &'a str,
}

impl PartialEq for ScoredEntry<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredEntry<'_> {}

impl PartialOrd for ScoredEntry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Greater means ranked earlier: higher score, then smaller identifier.
impl Ord for ScoredEntry<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.identifier.cmp(self.identifier))
    }
}
