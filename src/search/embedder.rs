//! Mean-pooled document embeddings and the vector math used for ranking.
//!
//! A document (or query) vector is the component-wise arithmetic mean of the
//! vectors of its tokens that resolve in the embedding table. Tokens are
//! tallied and accumulated in sorted order with `f64` sums, so any permutation
//! of the same tokens produces a bit-identical vector.

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::Lazy;

use super::embedding_table::EmbeddingProvider;

/// Cached SIMD enable flag (checked once at first use).
static SIMD_DOT_ENABLED: Lazy<bool> = Lazy::new(|| {
    dotenvy::var("BLOG_SEARCH_SIMD_DOT")
        .map(|v| v != "0" && v.to_lowercase() != "false")
        .unwrap_or(true)
});

#[derive(Clone)]
pub struct DocumentEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
}

impl std::fmt::Debug for DocumentEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentEmbedder")
            .field("model", &self.provider.id())
            .field("dimension", &self.provider.dimension())
            .finish()
    }
}

impl DocumentEmbedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    pub fn dimension(&self) -> usize {
        self.provider.dimension()
    }

    /// Mean-pool the vectors of `tokens`; all zeros when none resolve.
    pub fn embed<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<f32> {
        let dimension = self.provider.dimension();

        let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
        for token in tokens {
            *counts.entry(token.as_ref()).or_insert(0) += 1;
        }

        let mut sum = vec![0f64; dimension];
        let mut resolved: u64 = 0;
        for (token, count) in counts {
            let Some(vector) = self.provider.vector(token) else {
                continue;
            };
            let weight = f64::from(count);
            for (acc, v) in sum.iter_mut().zip(vector) {
                *acc += weight * f64::from(*v);
            }
            resolved += u64::from(count);
        }

        if resolved == 0 {
            return vec![0.0; dimension];
        }
        let n = resolved as f64;
        sum.into_iter().map(|s| (s / n) as f32).collect()
    }

    /// Number of tokens that resolve in the embedding table.
    pub fn resolved_count<S: AsRef<str>>(&self, tokens: &[S]) -> usize {
        tokens
            .iter()
            .filter(|t| self.provider.contains(t.as_ref()))
            .count()
    }
}

/// Euclidean (L2) norm.
pub fn l2_norm(v: &[f32]) -> f32 {
    dot_product(v, v).sqrt()
}

/// Scale `v` to unit length; `None` for a zero-magnitude (or non-finite) vector.
pub fn normalize(v: &[f32]) -> Option<Vec<f32>> {
    let norm = l2_norm(v);
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    Some(v.iter().map(|x| x / norm).collect())
}

/// Scalar dot product (fallback when SIMD is disabled).
#[inline]
fn dot_product_scalar(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// SIMD dot product using the `wide` crate, 8 lanes per iteration.
/// Reordering the additions costs ~1e-7 relative error against the scalar sum.
#[inline]
fn dot_product_simd(a: &[f32], b: &[f32]) -> f32 {
    use wide::f32x8;

    let len = a.len().min(b.len());
    let (a, b) = (&a[..len], &b[..len]);
    let chunks_a = a.chunks_exact(8);
    let chunks_b = b.chunks_exact(8);
    let remainder_a = chunks_a.remainder();
    let remainder_b = chunks_b.remainder();

    let mut sum = f32x8::ZERO;
    for (ca, cb) in chunks_a.zip(chunks_b) {
        let mut arr_a = [0f32; 8];
        let mut arr_b = [0f32; 8];
        arr_a.copy_from_slice(ca);
        arr_b.copy_from_slice(cb);
        sum += f32x8::from(arr_a) * f32x8::from(arr_b);
    }

    let mut scalar_sum: f32 = sum.reduce_add();
    for (a, b) in remainder_a.iter().zip(remainder_b) {
        scalar_sum += a * b;
    }
    scalar_sum
}

/// Dispatches to SIMD or scalar dot product based on BLOG_SEARCH_SIMD_DOT.
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    if *SIMD_DOT_ENABLED {
        dot_product_simd(a, b)
    } else {
        dot_product_scalar(a, b)
    }
}
