//! Brand clustering and market-map positioning.
//!
//! Clustering runs on z-scored 12-D embeddings; the map itself plots the raw
//! brand-level (DS, ATI) means. The two coordinate systems are independent.

use std::collections::HashMap;

use rand::Rng;
use serde::Serialize;

use crate::aggregate::BrandAggregate;
use crate::embedding::{BrandEmbedding, EMBEDDING_DIM};
use crate::similarity::squared_distance;

pub const MAX_ITERATIONS: usize = 50;

pub(crate) type Point = [f64; EMBEDDING_DIM];

/// Cluster labels for a set of embeddings, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Clustering {
    pub labels: Vec<usize>,
    /// Number of centers; every label is below this.
    pub cluster_count: usize,
    pub iterations: usize,
    pub converged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAssignment {
    pub brand: String,
    /// Brand mean DS.
    pub x: f64,
    /// Brand mean ATI.
    pub y: f64,
    pub cluster: usize,
    pub post_count: usize,
    pub mean_engagement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketMap {
    pub points: Vec<ClusterAssignment>,
    pub cluster_count: usize,
}

/// Z-score every dimension across all points.
///
/// Uses the population standard deviation; a constant dimension is divided
/// by 1 instead of 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn standardize(points: &[Point]) -> Vec<Point> {
    if points.is_empty() {
        return Vec::new();
    }
    let n = points.len() as f64;

    let mut means = [0.0; EMBEDDING_DIM];
    for p in points {
        for (m, v) in means.iter_mut().zip(p) {
            *m += v / n;
        }
    }

    let mut stds = [0.0; EMBEDDING_DIM];
    for p in points {
        for d in 0..EMBEDDING_DIM {
            stds[d] += (p[d] - means[d]).powi(2) / n;
        }
    }
    let stds = stds.map(|variance| {
        let std = variance.sqrt();
        if std == 0.0 {
            1.0
        } else {
            std
        }
    });

    points
        .iter()
        .map(|p| std::array::from_fn(|d| (p[d] - means[d]) / stds[d]))
        .collect()
}

/// K-means++ seeding.
///
/// The first center is drawn uniformly; each further center is drawn with
/// probability proportional to its squared distance from the nearest chosen
/// center. Seeding stops early when every point coincides with a center, so
/// fewer than `k` centers may come back.
pub fn kmeans_plus_plus<R: Rng + ?Sized>(points: &[Point], k: usize, rng: &mut R) -> Vec<Point> {
    if points.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut centers = vec![points[rng.random_range(0..points.len())]];
    while centers.len() < k {
        let weights: Vec<f64> = points
            .iter()
            .map(|p| {
                centers
                    .iter()
                    .map(|c| squared_distance(p, c))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            break;
        }

        let mut target = rng.random::<f64>() * total;
        let mut chosen = None;
        for (i, &w) in weights.iter().enumerate() {
            if w <= 0.0 {
                continue;
            }
            chosen = Some(i);
            if target < w {
                break;
            }
            target -= w;
        }
        // `chosen` ends on the last positive-weight point if rounding leaves
        // `target` unspent.
        match chosen {
            Some(i) => centers.push(points[i]),
            None => break,
        }
    }
    centers
}

fn nearest(point: &Point, centers: &[Point]) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (i, c) in centers.iter().enumerate() {
        let d = squared_distance(point, c);
        if d < best_d {
            best = i;
            best_d = d;
        }
    }
    best
}

/// Lloyd iteration from the given centers.
///
/// Stops when assignments no longer change or after [`MAX_ITERATIONS`]
/// rounds. A center that loses all its points stays where it was.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn lloyd(points: &[Point], mut centers: Vec<Point>) -> Clustering {
    let cluster_count = centers.len();
    if points.is_empty() || centers.is_empty() {
        return Clustering {
            labels: Vec::new(),
            cluster_count,
            iterations: 0,
            converged: true,
        };
    }

    let mut labels: Vec<usize> = Vec::new();
    let mut iterations = 0;
    let mut converged = false;
    while iterations < MAX_ITERATIONS {
        iterations += 1;
        let next: Vec<usize> = points.iter().map(|p| nearest(p, &centers)).collect();
        if next == labels {
            converged = true;
            break;
        }
        labels = next;

        let mut sums = vec![[0.0; EMBEDDING_DIM]; cluster_count];
        let mut counts = vec![0usize; cluster_count];
        for (p, &label) in points.iter().zip(&labels) {
            counts[label] += 1;
            for (s, v) in sums[label].iter_mut().zip(p) {
                *s += v;
            }
        }
        for ((center, sum), count) in centers.iter_mut().zip(sums).zip(counts) {
            if count > 0 {
                *center = sum.map(|s| s / count as f64);
            }
        }
    }

    Clustering {
        labels,
        cluster_count,
        iterations,
        converged,
    }
}

/// Assign each embedding to one of at most `k` clusters.
///
/// When `k` is at least the number of brands every brand becomes its own
/// cluster and no randomness is consumed.
pub fn cluster<R: Rng + ?Sized>(
    embeddings: &[BrandEmbedding],
    k: usize,
    rng: &mut R,
) -> Clustering {
    let n = embeddings.len();
    if k >= n {
        return Clustering {
            labels: (0..n).collect(),
            cluster_count: n,
            iterations: 0,
            converged: true,
        };
    }

    let raw: Vec<Point> = embeddings.iter().map(|e| e.vector).collect();
    let points = standardize(&raw);
    let centers = kmeans_plus_plus(&points, k.max(1), rng);
    let clustering = lloyd(&points, centers);
    tracing::debug!(
        brands = n,
        clusters = clustering.cluster_count,
        iterations = clustering.iterations,
        converged = clustering.converged,
        "clustered brands"
    );
    clustering
}

/// Cluster brands and position them at their raw (DS, ATI) means.
pub fn market_map<R: Rng + ?Sized>(
    aggregates: &[BrandAggregate],
    embeddings: &[BrandEmbedding],
    k: usize,
    rng: &mut R,
) -> MarketMap {
    let by_brand: HashMap<&str, &BrandAggregate> =
        aggregates.iter().map(|a| (a.brand.as_str(), a)).collect();
    let placed: Vec<(&BrandEmbedding, &BrandAggregate)> = embeddings
        .iter()
        .filter_map(|e| by_brand.get(e.brand.as_str()).map(|a| (e, *a)))
        .collect();
    let clustered: Vec<BrandEmbedding> = placed.iter().map(|(e, _)| (*e).clone()).collect();

    let clustering = cluster(&clustered, k, rng);
    let points = placed
        .iter()
        .zip(&clustering.labels)
        .map(|((emb, agg), &label)| ClusterAssignment {
            brand: emb.brand.clone(),
            x: agg.mean_ds,
            y: agg.mean_ati,
            cluster: label,
            post_count: agg.post_count,
            mean_engagement: agg.mean_engagement,
        })
        .collect();

    MarketMap {
        points,
        cluster_count: clustering.cluster_count,
    }
}

#[cfg(test)]
#[path = "cluster_test.rs"]
mod tests;
