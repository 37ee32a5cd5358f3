//! End-to-end checks of the analytics facade over in-memory sources.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ati_analytics::{
    Analytics, AnalyticsConfig, AnalyticsError, DatasetSources, Metric, ProjectionMethod,
};
use ati_core::{BrandDirectory, BrandEntry};
use ati_store::{MemoryReader, RecordStore, SourceReader, StoreError};
use rand::rngs::StdRng;
use rand::SeedableRng;

const HEADER: &str =
    "brand,count_like,count_comment,followers,y,text_nov,text_div,text_DS,text_ATI,ATI_final,DS_final,caption,ftime_parsed,shortcode";

const THREE_BRANDS: &str = "\
brand,count_like,count_comment,followers,y,text_nov,text_div,text_DS,text_ATI,ATI_final,DS_final,caption,ftime_parsed,shortcode
alpha,100,10,1000,0.11,0.1,0.2,0.2,80,80,0.2,Same old drop,2025-03-01 09:00:00,A1
beta,50,5,2000,0.03,0.6,0.5,0.6,20,20,0.6,Something new,2025-03-02 09:00:00,B1
gamma,70,7,1500,0.05,0.3,0.3,0.3,50,50,0.3,Middle ground,2025-04-02 09:00:00,C1
";

fn sources(posts: &[&str]) -> DatasetSources {
    DatasetSources {
        posts: posts.iter().map(ToString::to_string).collect(),
        earlier_posts: Vec::new(),
    }
}

fn analytics_over(content: &str) -> Analytics {
    let store = RecordStore::new(MemoryReader::new().with_source("posts", content));
    Analytics::new(
        Arc::new(store),
        sources(&["posts"]),
        AnalyticsConfig::default(),
        BrandDirectory::default(),
    )
}

#[test]
fn three_brand_market_statistics() {
    let analytics = analytics_over(THREE_BRANDS);
    let stats = analytics.market_stats().expect("stats");

    assert_eq!(stats.total_brands, 3);
    assert_eq!(stats.total_posts, 3);
    assert!((stats.avg_ati - 50.0).abs() < 1e-9);
    assert!((stats.high_risk_threshold - 74.494_897).abs() < 1e-4);
    assert_eq!(stats.high_risk_brand_count, 1);
    assert!(stats.convergence_index > 50.0 && stats.convergence_index < 52.0);
}

#[test]
fn brands_are_listed_with_display_names() {
    let store = RecordStore::new(MemoryReader::new().with_source("posts", THREE_BRANDS));
    let directory = BrandDirectory::from_entries(vec![BrandEntry {
        handle: "alpha".to_string(),
        display_name: "Alpha Apparel".to_string(),
        notes: None,
    }]);
    let analytics = Analytics::new(
        Arc::new(store),
        sources(&["posts"]),
        AnalyticsConfig::default(),
        directory,
    );

    let brands = analytics.list_brands().expect("brands");
    let names: Vec<&str> = brands.iter().map(|b| b.display_name.as_str()).collect();
    assert_eq!(names, ["Alpha Apparel", "beta", "gamma"]);
    assert!(brands.iter().all(|b| b.post_count == 1));
}

#[test]
fn similar_brands_rank_nearest_first() {
    let analytics = analytics_over(THREE_BRANDS);
    let similar = analytics.similar_brands("gamma", 2).expect("similar");

    assert_eq!(similar.len(), 2);
    assert_eq!(similar[0].brand, "alpha");
    assert_eq!(similar[1].brand, "beta");
    assert!(similar[0].similarity > similar[1].similarity);
    assert!((similar[0].ati_diff - 30.0).abs() < 1e-9);
    assert!(similar.iter().all(|s| s.target == "gamma"));
}

#[test]
fn unknown_brand_is_reported() {
    let analytics = analytics_over(THREE_BRANDS);

    let err = analytics.brand_detail("delta").unwrap_err();
    assert!(matches!(err, AnalyticsError::UnknownBrand(ref b) if b == "delta"));

    let err = analytics.similar_brands("delta", 3).unwrap_err();
    assert!(matches!(err, AnalyticsError::UnknownBrand(_)));
}

#[test]
fn brand_detail_compares_against_market() {
    let analytics = analytics_over(THREE_BRANDS);
    let detail = analytics.brand_detail(" alpha ").expect("detail");

    assert_eq!(detail.aggregate.brand, "alpha");
    assert!((detail.comparison.ati_delta - 30.0).abs() < 1e-9);
    assert_eq!(detail.most_average_posts.len(), 1);
    assert!(detail.ati_trend.is_empty());
}

#[test]
fn malformed_rows_leave_an_empty_market() {
    let content = format!("{HEADER}\nonly,two\nthree,fields,here\n");
    let analytics = analytics_over(&content);

    assert!(analytics.list_brands().expect("brands").is_empty());
    let stats = analytics.market_stats().expect("stats");
    assert_eq!(stats.total_brands, 0);
    assert!(stats.avg_ati.abs() < f64::EPSILON);
    let buckets = analytics.deciles(Metric::Ati).expect("deciles");
    assert_eq!(buckets.len(), 10);
    assert!(buckets.iter().all(|b| b.post_count == 0 && b.upper.abs() < f64::EPSILON));
    assert_eq!(analytics.assess(0.0).expect("assessment").decile, None);
    assert!(analytics.market_map(None).expect("map").points.is_empty());
    let projected = analytics.embedding_map(None).expect("embedding map");
    assert!(projected.points.is_empty());
    assert!(projected.explained_variance.abs() < f64::EPSILON);
    assert!(analytics.scatter_sample(10).expect("sample").is_empty());
}

#[test]
fn missing_source_is_unavailable() {
    let store = RecordStore::new(MemoryReader::new());
    let analytics = Analytics::new(
        Arc::new(store),
        sources(&["posts"]),
        AnalyticsConfig::default(),
        BrandDirectory::default(),
    );

    let err = analytics.market_stats().unwrap_err();
    assert!(matches!(err, AnalyticsError::SourceUnavailable(_)));
}

#[test]
fn seeded_market_map_is_reproducible() {
    let analytics = analytics_over(THREE_BRANDS);

    let first = analytics
        .market_map_with_rng(2, &mut StdRng::seed_from_u64(7))
        .expect("map");
    let second = analytics
        .market_map_with_rng(2, &mut StdRng::seed_from_u64(7))
        .expect("map");

    assert_eq!(first, second);
    assert_eq!(first.points.len(), 3);
    let alpha = first.points.iter().find(|p| p.brand == "alpha").expect("alpha");
    assert!((alpha.x - 0.2).abs() < 1e-12);
    assert!((alpha.y - 80.0).abs() < 1e-12);
}

#[test]
fn configured_seed_drives_market_map() {
    let store = RecordStore::new(MemoryReader::new().with_source("posts", THREE_BRANDS));
    let config = AnalyticsConfig {
        cluster_seed: Some(11),
        ..AnalyticsConfig::default()
    };
    let analytics = Analytics::new(
        Arc::new(store),
        sources(&["posts"]),
        config,
        BrandDirectory::default(),
    );

    let first = analytics.market_map(Some(2)).expect("map");
    let second = analytics.market_map(Some(2)).expect("map");
    assert_eq!(first, second);
}

#[test]
fn embedding_map_projects_every_brand() {
    let analytics = analytics_over(THREE_BRANDS);

    let map = analytics
        .embedding_map_with_rng(2, &mut StdRng::seed_from_u64(5))
        .expect("embedding map");

    assert_eq!(map.method, ProjectionMethod::Pca);
    assert_eq!(map.points.len(), 3);
    // Three brands always fit in a plane.
    assert!((map.explained_variance - 1.0).abs() < 1e-6);
    assert!(map.component_variance[0] >= map.component_variance[1]);
    let alpha = map.points.iter().find(|p| p.brand == "alpha").expect("alpha");
    assert!((alpha.mean_ati - 80.0).abs() < 1e-12);
    let json = serde_json::to_value(&map).expect("serialize");
    assert_eq!(json["method"], "pca");
}

#[test]
fn scatter_sample_uses_the_given_rng() {
    let analytics = analytics_over(THREE_BRANDS);

    let first = analytics
        .scatter_sample_with_rng(2, &mut StdRng::seed_from_u64(9))
        .expect("sample");
    let second = analytics
        .scatter_sample_with_rng(2, &mut StdRng::seed_from_u64(9))
        .expect("sample");
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_ne!(first[0].brand, first[1].brand);

    assert_eq!(analytics.scatter_sample(10).expect("sample").len(), 3);
}

#[test]
fn correlation_between_ati_and_ds() {
    let analytics = analytics_over(THREE_BRANDS);
    let result = analytics.correlation(Metric::Ati, Metric::Ds).expect("correlation");

    assert_eq!(result.sample_size, 3);
    assert!((result.spearman + 1.0).abs() < 1e-12);
    assert!(result.pearson < -0.9);
}

#[test]
fn assessment_flags_content_above_threshold() {
    let analytics = analytics_over(THREE_BRANDS);

    let high = analytics.assess(90.0).expect("assess");
    assert!(high.is_high_risk);
    assert!((high.percentile - 100.0).abs() < f64::EPSILON);

    let low = analytics.assess(10.0).expect("assess");
    assert!(!low.is_high_risk);
    assert!(low.percentile.abs() < f64::EPSILON);
}

struct SwappableReader {
    content: Mutex<String>,
    reads: AtomicUsize,
}

impl SourceReader for SwappableReader {
    fn read(&self, _source_id: &str) -> Result<String, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .content
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }
}

#[test]
fn invalidate_rereads_sources() {
    let reader = Arc::new(SwappableReader {
        content: Mutex::new(THREE_BRANDS.to_string()),
        reads: AtomicUsize::new(0),
    });
    let analytics = Analytics::new(
        Arc::new(RecordStore::with_reader(reader.clone())),
        sources(&["posts"]),
        AnalyticsConfig::default(),
        BrandDirectory::default(),
    );

    assert_eq!(analytics.list_brands().expect("brands").len(), 3);
    assert_eq!(analytics.list_brands().expect("brands").len(), 3);
    assert_eq!(reader.reads.load(Ordering::SeqCst), 1);

    *reader.content.lock().expect("lock") = format!("{HEADER}\nsolo,1,1,10,0.1,0,0,0,40,40,0.5,cap,2025-01-01,S1\n");
    analytics.invalidate();

    let brands = analytics.list_brands().expect("brands");
    assert_eq!(brands.len(), 1);
    assert_eq!(brands[0].brand, "solo");
    assert_eq!(reader.reads.load(Ordering::SeqCst), 2);
}
