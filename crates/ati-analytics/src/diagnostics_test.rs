use super::*;
use crate::aggregate::{aggregate, market_stats};

fn post_with(ati: f64, engagement: f64) -> PostRecord {
    PostRecord {
        brand: "brand".to_string(),
        ati,
        engagement,
        ..PostRecord::default()
    }
}

#[test]
fn deciles_cover_range_without_gaps() {
    let posts: Vec<PostRecord> = (0..=100).map(|i| post_with(f64::from(i), 0.1)).collect();
    let buckets = deciles(&posts, Metric::Ati);

    assert_eq!(buckets.len(), DECILE_COUNT);
    assert!((buckets[0].lower - 0.0).abs() < f64::EPSILON);
    assert!((buckets[9].upper - 100.0).abs() < f64::EPSILON);
    for pair in buckets.windows(2) {
        assert!(
            (pair[0].upper - pair[1].lower).abs() < 1e-12,
            "gap between {:?} and {:?}",
            pair[0],
            pair[1]
        );
    }
    let total: usize = buckets.iter().map(|b| b.post_count).sum();
    assert_eq!(total, posts.len());
    // 0..=9 in the first bucket, 90..=100 in the last (right-closed).
    assert_eq!(buckets[0].post_count, 10);
    assert_eq!(buckets[9].post_count, 11);
}

#[test]
fn deciles_exclude_negative_values() {
    let posts = vec![
        post_with(-5.0, 1.0),
        post_with(10.0, 0.2),
        post_with(20.0, 0.4),
    ];
    let buckets = deciles(&posts, Metric::Ati);
    let total: usize = buckets.iter().map(|b| b.post_count).sum();
    assert_eq!(total, 2);
    assert!((buckets[0].lower - 10.0).abs() < f64::EPSILON);
}

#[test]
fn empty_buckets_are_kept_with_midpoint_mean() {
    let posts = vec![post_with(0.0, 0.1), post_with(100.0, 0.3)];
    let buckets = deciles(&posts, Metric::Ati);

    assert_eq!(buckets.len(), DECILE_COUNT);
    let middle = &buckets[4];
    assert_eq!(middle.post_count, 0);
    assert!((middle.mean - 45.0).abs() < 1e-9);
    assert!(middle.engagement_mean.abs() < f64::EPSILON);
    assert_eq!(buckets[0].post_count, 1);
    assert_eq!(buckets[9].post_count, 1);
}

#[test]
fn constant_metric_lands_in_last_bucket() {
    let posts = vec![post_with(42.0, 0.1), post_with(42.0, 0.3)];
    let buckets = deciles(&posts, Metric::Ati);
    assert_eq!(buckets[9].post_count, 2);
    assert!((buckets[9].mean - 42.0).abs() < f64::EPSILON);
    assert!((buckets[9].engagement_median - 0.2).abs() < 1e-12);
}

#[test]
fn deciles_of_nothing_are_ten_zero_width_buckets() {
    for posts in [vec![], vec![post_with(-1.0, 0.3)]] {
        let buckets = deciles(&posts, Metric::Ati);
        assert_eq!(buckets.len(), 10);
        for (i, bucket) in buckets.iter().enumerate() {
            assert_eq!(bucket.decile, i + 1);
            assert_eq!(bucket.post_count, 0);
            assert!(bucket.lower.abs() < f64::EPSILON);
            assert!(bucket.upper.abs() < f64::EPSILON);
            assert!(bucket.mean.abs() < f64::EPSILON);
            assert!(bucket.engagement_mean.abs() < f64::EPSILON);
        }
    }
}

#[test]
fn bucket_engagement_statistics() {
    let posts = vec![
        post_with(0.0, 0.1),
        post_with(1.0, 0.5),
        post_with(2.0, 0.3),
        post_with(100.0, 0.9),
    ];
    let first = &deciles(&posts, Metric::Ati)[0];
    assert_eq!(first.post_count, 3);
    assert!((first.engagement_mean - 0.3).abs() < 1e-12);
    assert!((first.engagement_median - 0.3).abs() < 1e-12);
}

#[test]
fn spearman_of_series_with_itself_is_one() {
    let x = [3.0, 1.0, 4.0, 1.5, 9.0, 2.6];
    assert!((spearman(&x, &x) - 1.0).abs() < 1e-12);
}

#[test]
fn spearman_of_reversed_order_is_minus_one() {
    let x = [1.0, 2.0, 3.0, 4.0, 5.0];
    let y = [50.0, 40.0, 30.0, 20.0, 10.0];
    assert!((spearman(&x, &y) + 1.0).abs() < 1e-12);
}

#[test]
fn spearman_ties_use_input_order() {
    // Ranks for x are [1, 2, 3] despite the tie, so y in the same order gives 1.
    let x = [5.0, 5.0, 7.0];
    let y = [1.0, 2.0, 3.0];
    assert!((spearman(&x, &y) - 1.0).abs() < 1e-12);
}

#[test]
fn pearson_of_linear_data_is_one() {
    let x: Vec<f64> = (0..20).map(f64::from).collect();
    let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 3.0).collect();
    assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);
}

#[test]
fn pearson_of_negated_data_is_minus_one() {
    let x = [1.0, 2.0, 3.0, 4.0];
    let y = [-1.0, -2.0, -3.0, -4.0];
    assert!((pearson(&x, &y) + 1.0).abs() < 1e-12);
}

#[test]
fn correlations_need_two_points() {
    assert!(spearman(&[1.0], &[2.0]).abs() < f64::EPSILON);
    assert!(pearson(&[1.0], &[2.0]).abs() < f64::EPSILON);
    assert!(spearman(&[], &[]).abs() < f64::EPSILON);
    assert!(pearson(&[], &[]).abs() < f64::EPSILON);
}

#[test]
fn pearson_of_constant_series_is_zero() {
    assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).abs() < f64::EPSILON);
}

#[test]
fn linear_fit_recovers_line() {
    let x = [0.0, 1.0, 2.0, 3.0];
    let y = [3.0, 5.0, 7.0, 9.0];
    let (slope, intercept) = linear_fit(&x, &y);
    assert!((slope - 2.0).abs() < 1e-12);
    assert!((intercept - 3.0).abs() < 1e-12);
}

#[test]
fn linear_fit_of_constant_x_is_flat_at_mean() {
    let (slope, intercept) = linear_fit(&[2.0, 2.0], &[1.0, 3.0]);
    assert!(slope.abs() < f64::EPSILON);
    assert!((intercept - 2.0).abs() < 1e-12);
}

#[test]
fn correlation_between_metrics() {
    let posts: Vec<PostRecord> = (1..=10)
        .map(|i| post_with(f64::from(i) * 10.0, f64::from(i) / 100.0))
        .collect();
    let result = correlation(&posts, Metric::Ati, Metric::Engagement);
    assert_eq!(result.sample_size, 10);
    assert!((result.spearman - 1.0).abs() < 1e-12);
    assert!((result.pearson - 1.0).abs() < 1e-12);
    assert!((result.slope - 0.001).abs() < 1e-12);
}

#[test]
fn convergence_index_is_clamped() {
    assert!((convergence_index(10.0, 50.0) - 80.0).abs() < 1e-12);
    assert!(convergence_index(100.0, 50.0).abs() < f64::EPSILON);
    assert!(convergence_index(5.0, 0.0).abs() < f64::EPSILON);
    assert!((convergence_index(0.0, 50.0) - 100.0).abs() < f64::EPSILON);
}

#[test]
fn assess_ati_against_market() {
    let mut posts: Vec<PostRecord> = (0..10).map(|i| post_with(f64::from(i) * 10.0, 0.1)).collect();
    for (i, p) in posts.iter_mut().enumerate() {
        p.brand = format!("brand-{i}");
    }
    let aggregates = aggregate(&posts);
    let stats = market_stats(&posts, &aggregates, 1.0);

    let high = assess_ati(90.0, &posts, &stats);
    assert!(high.is_high_risk);
    assert!((high.percentile - 100.0).abs() < f64::EPSILON);
    assert_eq!(high.decile, Some(10));

    let low = assess_ati(5.0, &posts, &stats);
    assert!(!low.is_high_risk);
    assert!((low.percentile - 10.0).abs() < 1e-12);
    assert_eq!(low.decile, Some(1));

    let outside = assess_ati(150.0, &posts, &stats);
    assert_eq!(outside.decile, None);
}
