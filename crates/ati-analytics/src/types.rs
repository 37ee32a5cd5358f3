use std::str::FromStr;

use ati_core::PostRecord;
use serde::{Deserialize, Serialize};

/// Tunables for the analytics facade.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsConfig {
    /// Gaussian kernel width for brand similarity.
    pub similarity_sigma: f64,
    /// Standard deviations above the brand mean ATI that mark a brand high-risk.
    pub high_risk_z: f64,
    /// Default cluster count for the market map.
    pub cluster_k: usize,
    /// Seed for K-means++ initialization; `None` draws from the thread RNG.
    pub cluster_seed: Option<u64>,
    /// Posts per list in brand detail.
    pub top_posts: usize,
    /// Sequential buckets used by the trend when posts carry no timestamp.
    pub trend_segments: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            similarity_sigma: crate::similarity::DEFAULT_SIGMA,
            high_risk_z: 1.0,
            cluster_k: 4,
            cluster_seed: None,
            top_posts: 3,
            trend_segments: 6,
        }
    }
}

impl AnalyticsConfig {
    #[must_use]
    pub fn from_app_config(config: &ati_core::AppConfig) -> Self {
        Self {
            similarity_sigma: config.similarity_sigma,
            high_risk_z: config.high_risk_z,
            cluster_k: config.cluster_k,
            cluster_seed: config.cluster_seed,
            top_posts: config.top_posts,
            trend_segments: config.trend_segments,
        }
    }
}

/// A per-post quantity that diagnostics can bin or correlate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Ati,
    Ds,
    Engagement,
    Novelty,
    Diversity,
    Likes,
    Comments,
    Followers,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::Ati,
        Metric::Ds,
        Metric::Engagement,
        Metric::Novelty,
        Metric::Diversity,
        Metric::Likes,
        Metric::Comments,
        Metric::Followers,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Ati => "ati",
            Metric::Ds => "ds",
            Metric::Engagement => "engagement",
            Metric::Novelty => "novelty",
            Metric::Diversity => "diversity",
            Metric::Likes => "likes",
            Metric::Comments => "comments",
            Metric::Followers => "followers",
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(self, post: &PostRecord) -> f64 {
        match self {
            Metric::Ati => post.ati,
            Metric::Ds => post.ds,
            Metric::Engagement => post.engagement,
            Metric::Novelty => post.mean_novelty(),
            Metric::Diversity => post.mean_diversity(),
            Metric::Likes => post.likes as f64,
            Metric::Comments => post.comments as f64,
            Metric::Followers => post.followers as f64,
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ati" | "ati_final" => Ok(Metric::Ati),
            "ds" | "ds_final" => Ok(Metric::Ds),
            "engagement" | "y" => Ok(Metric::Engagement),
            "novelty" => Ok(Metric::Novelty),
            "diversity" => Ok(Metric::Diversity),
            "likes" => Ok(Metric::Likes),
            "comments" => Ok(Metric::Comments),
            "followers" => Ok(Metric::Followers),
            other => Err(format!(
                "unknown metric '{other}'; expected one of: {}",
                Metric::ALL.map(Metric::as_str).join(", ")
            )),
        }
    }
}
