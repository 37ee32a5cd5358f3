use rand::rngs::StdRng;
use rand::SeedableRng;

use super::*;

fn emb(brand: &str, fill: f64) -> BrandEmbedding {
    let mut vector = [0.5; EMBEDDING_DIM];
    vector[0] = fill;
    vector[5] = fill * 0.5;
    BrandEmbedding {
        brand: brand.to_string(),
        vector,
    }
}

fn agg(brand: &str, mean_ati: f64, mean_ds: f64) -> BrandAggregate {
    BrandAggregate {
        brand: brand.to_string(),
        post_count: 2,
        mean_ati,
        mean_ds,
        mean_engagement: 0.1,
    }
}

fn two_groups() -> Vec<BrandEmbedding> {
    vec![
        emb("a1", 0.10),
        emb("a2", 0.12),
        emb("a3", 0.11),
        emb("b1", 0.90),
        emb("b2", 0.92),
        emb("b3", 0.91),
    ]
}

#[test]
fn standardize_centers_and_scales_each_dimension() {
    let points = vec![[1.0; EMBEDDING_DIM], [3.0; EMBEDDING_DIM]];
    let z = standardize(&points);
    for d in 0..EMBEDDING_DIM {
        assert!((z[0][d] + 1.0).abs() < 1e-12);
        assert!((z[1][d] - 1.0).abs() < 1e-12);
    }
}

#[test]
fn standardize_leaves_constant_dimension_at_zero() {
    let mut a = [0.4; EMBEDDING_DIM];
    let mut b = [0.4; EMBEDDING_DIM];
    a[0] = 0.0;
    b[0] = 1.0;
    let z = standardize(&[a, b]);
    assert!(z[0][1].abs() < f64::EPSILON);
    assert!(z[1][1].abs() < f64::EPSILON);
    assert!(z.iter().flatten().all(|v| v.is_finite()));
}

#[test]
fn seeded_runs_are_identical() {
    let embeddings = two_groups();
    let first = cluster(&embeddings, 2, &mut StdRng::seed_from_u64(7));
    let second = cluster(&embeddings, 2, &mut StdRng::seed_from_u64(7));
    assert_eq!(first, second);
}

#[test]
fn separated_groups_share_labels() {
    let embeddings = two_groups();
    let result = cluster(&embeddings, 2, &mut StdRng::seed_from_u64(42));

    assert_eq!(result.cluster_count, 2);
    assert!(result.converged);
    assert!(result.iterations <= MAX_ITERATIONS);
    let labels = &result.labels;
    assert_eq!(labels[0], labels[1]);
    assert_eq!(labels[1], labels[2]);
    assert_eq!(labels[3], labels[4]);
    assert_eq!(labels[4], labels[5]);
    assert_ne!(labels[0], labels[3]);
}

#[test]
fn labels_stay_below_cluster_count() {
    let embeddings: Vec<BrandEmbedding> = (0..20)
        .map(|i| emb(&format!("brand-{i}"), f64::from(i) / 20.0))
        .collect();
    for seed in 0..10 {
        let result = cluster(&embeddings, 4, &mut StdRng::seed_from_u64(seed));
        assert_eq!(result.labels.len(), embeddings.len());
        assert!(result.labels.iter().all(|&l| l < result.cluster_count));
    }
}

#[test]
fn k_at_least_brand_count_gives_singletons() {
    let embeddings = vec![emb("a", 0.1), emb("b", 0.2), emb("c", 0.3)];
    let result = cluster(&embeddings, 3, &mut StdRng::seed_from_u64(1));
    assert_eq!(result.labels, vec![0, 1, 2]);
    assert_eq!(result.cluster_count, 3);

    let result = cluster(&embeddings, 10, &mut StdRng::seed_from_u64(1));
    assert_eq!(result.labels, vec![0, 1, 2]);
}

#[test]
fn empty_input_is_empty() {
    let result = cluster(&[], 4, &mut StdRng::seed_from_u64(1));
    assert!(result.labels.is_empty());
    assert_eq!(result.cluster_count, 0);
}

#[test]
fn seeding_stops_when_points_coincide() {
    let points = vec![[0.3; EMBEDDING_DIM]; 5];
    let centers = kmeans_plus_plus(&points, 3, &mut StdRng::seed_from_u64(3));
    assert_eq!(centers.len(), 1);
}

#[test]
fn seeding_never_picks_a_duplicate_center() {
    let mut points = vec![[0.0; EMBEDDING_DIM]; 4];
    points.push([1.0; EMBEDDING_DIM]);
    for seed in 0..20 {
        let centers = kmeans_plus_plus(&points, 2, &mut StdRng::seed_from_u64(seed));
        assert_eq!(centers.len(), 2);
        assert_ne!(centers[0], centers[1]);
    }
}

#[test]
fn lloyd_keeps_empty_cluster_center() {
    let points = vec![[0.0; EMBEDDING_DIM], [0.1; EMBEDDING_DIM]];
    let far = [10.0; EMBEDDING_DIM];
    let result = lloyd(&points, vec![[0.0; EMBEDDING_DIM], far]);
    assert_eq!(result.labels, vec![0, 0]);
    assert_eq!(result.cluster_count, 2);
    assert!(result.converged);
}

#[test]
fn market_map_plots_raw_ds_and_ati() {
    let embeddings = vec![emb("a", 0.1), emb("b", 0.9)];
    let aggregates = vec![agg("a", 72.0, 0.31), agg("b", 35.0, 0.64)];
    let map = market_map(&aggregates, &embeddings, 4, &mut StdRng::seed_from_u64(5));

    assert_eq!(map.cluster_count, 2);
    assert_eq!(map.points.len(), 2);
    let a = &map.points[0];
    assert_eq!(a.brand, "a");
    assert!((a.x - 0.31).abs() < f64::EPSILON);
    assert!((a.y - 72.0).abs() < f64::EPSILON);
    assert_eq!(a.post_count, 2);
}

#[test]
fn market_map_skips_embeddings_without_aggregates() {
    let embeddings = vec![emb("a", 0.1), emb("orphan", 0.9)];
    let aggregates = vec![agg("a", 50.0, 0.5)];
    let map = market_map(&aggregates, &embeddings, 1, &mut StdRng::seed_from_u64(5));
    assert_eq!(map.points.len(), 1);
    assert_eq!(map.points[0].brand, "a");
}
