//! Embedding-space market map.
//!
//! Projects the z-scored 12-D brand embeddings onto their first two principal
//! components. Unlike [`crate::cluster::market_map`], both axes here live in
//! embedding space, so nearby points are brands with similar content.

use std::collections::HashMap;

use rand::Rng;
use serde::Serialize;

use crate::aggregate::BrandAggregate;
use crate::cluster::{cluster, standardize, Point};
use crate::embedding::{BrandEmbedding, EMBEDDING_DIM};

const POWER_ITERATIONS: usize = 1000;
const POWER_TOLERANCE: f64 = 1e-12;

type Matrix = [[f64; EMBEDDING_DIM]; EMBEDDING_DIM];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMethod {
    Pca,
}

/// Two principal axes of a point cloud.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// `[pc1, pc2]` coordinates, in input order.
    pub coordinates: Vec<[f64; 2]>,
    /// Share of total variance carried by each component.
    pub component_variance: [f64; 2],
}

impl Projection {
    #[must_use]
    pub fn explained_variance(&self) -> f64 {
        self.component_variance[0] + self.component_variance[1]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingPoint {
    pub brand: String,
    /// First principal component.
    pub x: f64,
    /// Second principal component.
    pub y: f64,
    pub cluster: usize,
    pub post_count: usize,
    pub mean_ati: f64,
    pub mean_ds: f64,
    pub mean_engagement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingMap {
    pub method: ProjectionMethod,
    /// Share of total variance carried by the two plotted axes, 0-1.
    pub explained_variance: f64,
    pub component_variance: [f64; 2],
    pub points: Vec<EmbeddingPoint>,
    pub cluster_count: usize,
}

#[allow(clippy::cast_precision_loss)]
fn covariance(points: &[Point]) -> Matrix {
    let mut cov = [[0.0; EMBEDDING_DIM]; EMBEDDING_DIM];
    if points.is_empty() {
        return cov;
    }
    let n = points.len() as f64;
    let mut means = [0.0; EMBEDDING_DIM];
    for p in points {
        for (m, v) in means.iter_mut().zip(p) {
            *m += v / n;
        }
    }
    for p in points {
        for i in 0..EMBEDDING_DIM {
            for j in 0..EMBEDDING_DIM {
                cov[i][j] += (p[i] - means[i]) * (p[j] - means[j]) / n;
            }
        }
    }
    cov
}

fn multiply(m: &Matrix, v: &Point) -> Point {
    std::array::from_fn(|i| m[i].iter().zip(v).map(|(a, b)| a * b).sum())
}

fn dot(a: &Point, b: &Point) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Dominant eigenpair by power iteration.
///
/// Starts from the matrix column with the largest norm. The returned vector
/// has unit length and its largest-magnitude component positive; a zero
/// matrix yields a zero vector and eigenvalue.
fn dominant_eigen(m: &Matrix) -> (f64, Point) {
    let start = (0..EMBEDDING_DIM)
        .map(|j| std::array::from_fn::<f64, EMBEDDING_DIM, _>(|i| m[i][j]))
        .max_by(|a, b| dot(a, a).total_cmp(&dot(b, b)))
        .unwrap_or([0.0; EMBEDDING_DIM]);
    let norm = dot(&start, &start).sqrt();
    if norm <= POWER_TOLERANCE {
        return (0.0, [0.0; EMBEDDING_DIM]);
    }

    let mut v = start.map(|x| x / norm);
    for _ in 0..POWER_ITERATIONS {
        let next = multiply(m, &v);
        let norm = dot(&next, &next).sqrt();
        if norm <= POWER_TOLERANCE {
            return (0.0, [0.0; EMBEDDING_DIM]);
        }
        let next = next.map(|x| x / norm);
        let delta: f64 = next.iter().zip(&v).map(|(a, b)| (a - b).abs()).sum();
        v = next;
        if delta < POWER_TOLERANCE {
            break;
        }
    }

    let pivot = v
        .iter()
        .copied()
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
        .unwrap_or(0.0);
    if pivot < 0.0 {
        v = v.map(|x| -x);
    }
    (dot(&v, &multiply(m, &v)), v)
}

/// Project points onto their first two principal components.
///
/// The points are centered but not rescaled. With fewer than two distinct
/// points every coordinate and variance share is 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn pca_2d(points: &[Point]) -> Projection {
    let mut cov = covariance(points);
    let total: f64 = (0..EMBEDDING_DIM).map(|i| cov[i][i]).sum();

    let (first_value, first) = dominant_eigen(&cov);
    for i in 0..EMBEDDING_DIM {
        for j in 0..EMBEDDING_DIM {
            cov[i][j] -= first_value * first[i] * first[j];
        }
    }
    let (second_value, second) = dominant_eigen(&cov);

    let means = if points.is_empty() {
        [0.0; EMBEDDING_DIM]
    } else {
        let sums = points.iter().fold([0.0; EMBEDDING_DIM], |mut acc, p| {
            for (a, v) in acc.iter_mut().zip(p) {
                *a += v;
            }
            acc
        });
        let n = points.len() as f64;
        sums.map(|s| s / n)
    };
    let coordinates = points
        .iter()
        .map(|p| {
            let centered: Point = std::array::from_fn(|d| p[d] - means[d]);
            [dot(&centered, &first), dot(&centered, &second)]
        })
        .collect();

    let component_variance = if total > POWER_TOLERANCE {
        [
            (first_value / total).clamp(0.0, 1.0),
            (second_value / total).clamp(0.0, 1.0),
        ]
    } else {
        [0.0, 0.0]
    };

    Projection {
        coordinates,
        component_variance,
    }
}

/// Cluster brands and place them on the first two principal components of
/// their standardized embeddings.
pub fn embedding_map<R: Rng + ?Sized>(
    aggregates: &[BrandAggregate],
    embeddings: &[BrandEmbedding],
    k: usize,
    rng: &mut R,
) -> EmbeddingMap {
    let by_brand: HashMap<&str, &BrandAggregate> =
        aggregates.iter().map(|a| (a.brand.as_str(), a)).collect();
    let placed: Vec<(&BrandEmbedding, &BrandAggregate)> = embeddings
        .iter()
        .filter_map(|e| by_brand.get(e.brand.as_str()).map(|a| (e, *a)))
        .collect();
    let clustered: Vec<BrandEmbedding> = placed.iter().map(|(e, _)| (*e).clone()).collect();

    let raw: Vec<Point> = clustered.iter().map(|e| e.vector).collect();
    let projection = pca_2d(&standardize(&raw));
    let clustering = cluster(&clustered, k, rng);

    let points = placed
        .iter()
        .zip(&projection.coordinates)
        .zip(&clustering.labels)
        .map(|(((emb, agg), &[x, y]), &label)| EmbeddingPoint {
            brand: emb.brand.clone(),
            x,
            y,
            cluster: label,
            post_count: agg.post_count,
            mean_ati: agg.mean_ati,
            mean_ds: agg.mean_ds,
            mean_engagement: agg.mean_engagement,
        })
        .collect();

    tracing::debug!(
        brands = placed.len(),
        explained_variance = projection.explained_variance(),
        "projected brand embeddings"
    );

    EmbeddingMap {
        method: ProjectionMethod::Pca,
        explained_variance: projection.explained_variance(),
        component_variance: projection.component_variance,
        points,
        cluster_count: clustering.cluster_count,
    }
}
