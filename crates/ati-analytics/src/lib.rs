//! Brand content-homogeneity analytics.
//!
//! Rolls per-post feature records up into brand aggregates, builds 12-D brand
//! embeddings, ranks brand similarity with a Gaussian kernel, clusters brands
//! into a market map (raw or PCA-projected), and computes decile and
//! correlation diagnostics. The [`Analytics`] facade ties these to a
//! [`ati_store::RecordStore`].

pub mod aggregate;
pub mod cluster;
pub mod dataset;
pub mod detail;
pub mod diagnostics;
pub mod embedding;
pub mod engagement;
pub mod error;
pub mod projection;
pub mod service;
pub mod similarity;
pub mod trend;
pub mod types;

pub use aggregate::{aggregate, market_stats, BrandAggregate, MarketStats};
pub use cluster::{cluster, market_map, ClusterAssignment, Clustering, MarketMap};
pub use dataset::{Dataset, DatasetSources};
pub use detail::{BrandDetail, MarketComparison, PostSnapshot};
pub use diagnostics::{
    correlation, deciles, pearson, spearman, ContentAssessment, CorrelationResult, DecileBucket,
};
pub use embedding::{embed, embed_all, BrandEmbedding, EMBEDDING_DIM};
pub use engagement::{
    scatter_sample, EngagementScaling, EngagementTail, LateEntryBrand, RankedPost, ScatterPost,
};
pub use error::AnalyticsError;
pub use projection::{embedding_map, pca_2d, EmbeddingMap, EmbeddingPoint, ProjectionMethod};
pub use service::{Analytics, BrandSummary, SimilarBrand};
pub use similarity::{similarity, top_similar, SimilarityScore};
pub use trend::{market_trend, TrendPoint};
pub use types::{AnalyticsConfig, Metric};
