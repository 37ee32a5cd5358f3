//! Gaussian-kernel brand similarity.

use std::cmp::Ordering;

use serde::Serialize;

use crate::embedding::{BrandEmbedding, EMBEDDING_DIM};

/// Kernel width tuned so typical in-market distances land around 0.6-0.9.
pub const DEFAULT_SIGMA: f64 = 0.18;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityScore {
    pub brand: String,
    pub similarity: f64,
}

#[must_use]
pub fn squared_distance(a: &[f64; EMBEDDING_DIM], b: &[f64; EMBEDDING_DIM]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// `exp(-d² / 2σ²)` over the Euclidean distance of two embeddings.
///
/// Identical vectors score 1. A non-positive `sigma` degenerates to an
/// exact-match test.
#[must_use]
pub fn similarity(a: &BrandEmbedding, b: &BrandEmbedding, sigma: f64) -> f64 {
    let d2 = squared_distance(&a.vector, &b.vector);
    if sigma <= 0.0 {
        return if d2 == 0.0 { 1.0 } else { 0.0 };
    }
    (-d2 / (2.0 * sigma * sigma)).exp().clamp(0.0, 1.0)
}

/// The `k` brands most similar to `target`, best first.
///
/// Ties are ordered by brand handle. The target itself is never a
/// candidate, and an unknown target yields no results.
#[must_use]
pub fn top_similar(
    target: &str,
    embeddings: &[BrandEmbedding],
    k: usize,
    sigma: f64,
) -> Vec<SimilarityScore> {
    let Some(target_emb) = embeddings.iter().find(|e| e.brand == target) else {
        return Vec::new();
    };

    let mut scored: Vec<SimilarityScore> = embeddings
        .iter()
        .filter(|e| e.brand != target)
        .map(|e| SimilarityScore {
            brand: e.brand.clone(),
            similarity: similarity(target_emb, e, sigma),
        })
        .collect();

    scored.sort_by(|a, b| match b.similarity.total_cmp(&a.similarity) {
        Ordering::Equal => a.brand.cmp(&b.brand),
        other => other,
    });
    scored.truncate(k);
    scored
}
