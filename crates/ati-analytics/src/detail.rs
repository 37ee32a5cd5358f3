//! Single-brand drill-down.

use ati_core::PostRecord;
use serde::Serialize;

use crate::aggregate::{BrandAggregate, MarketStats};
use crate::diagnostics::mean;

pub(crate) const DETAIL_CAPTION_CHARS: usize = 150;
const TREND_STAGES: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSnapshot {
    pub ati: f64,
    pub ds: f64,
    /// Mean novelty across modalities.
    pub novelty: f64,
    pub caption: String,
    pub likes: i64,
    pub comments: i64,
    pub engagement: f64,
    pub posted_on: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketComparison {
    /// Post-weighted market ATI.
    pub market_avg_ati: f64,
    /// Brand-weighted market DS.
    pub market_avg_ds: f64,
    pub ati_delta: f64,
    pub ati_delta_pct: f64,
    pub ds_delta: f64,
    pub ds_delta_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandDetail {
    #[serde(flatten)]
    pub aggregate: BrandAggregate,
    pub display_name: String,
    pub comparison: MarketComparison,
    /// Mean ATI over up to four sequential stages of the brand's posts.
    /// Empty when the brand has fewer than four posts.
    pub ati_trend: Vec<f64>,
    /// Highest-ATI posts.
    pub most_average_posts: Vec<PostSnapshot>,
    /// Lowest-ATI posts.
    pub most_novel_posts: Vec<PostSnapshot>,
}

/// Truncate to `max_chars` characters, appending `...` when cut.
pub(crate) fn snippet(text: &str, max_chars: usize) -> String {
    let mut chars = text.char_indices();
    match chars.nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn percent_of(delta: f64, base: f64) -> f64 {
    if base == 0.0 {
        0.0
    } else {
        delta / base * 100.0
    }
}

impl PostSnapshot {
    fn from_post(post: &PostRecord) -> Self {
        Self {
            ati: post.ati,
            ds: post.ds,
            novelty: post.mean_novelty(),
            caption: snippet(&post.caption, DETAIL_CAPTION_CHARS),
            likes: post.likes,
            comments: post.comments,
            engagement: post.engagement,
            posted_on: post
                .posted_at
                .map(|ts| ts.date().format("%Y-%m-%d").to_string()),
            url: post.url(),
        }
    }
}

#[must_use]
pub fn market_comparison(aggregate: &BrandAggregate, stats: &MarketStats) -> MarketComparison {
    let ati_delta = aggregate.mean_ati - stats.avg_ati;
    let ds_delta = aggregate.mean_ds - stats.avg_ds;
    MarketComparison {
        market_avg_ati: stats.avg_ati,
        market_avg_ds: stats.avg_ds,
        ati_delta,
        ati_delta_pct: percent_of(ati_delta, stats.avg_ati),
        ds_delta,
        ds_delta_pct: percent_of(ds_delta, stats.avg_ds),
    }
}

/// Mean ATI of up to four consecutive stages of `posts`, each `ceil(n/4)` long.
#[must_use]
pub fn ati_trend(posts: &[&PostRecord]) -> Vec<f64> {
    if posts.len() < TREND_STAGES {
        return Vec::new();
    }
    let stage = posts.len().div_ceil(TREND_STAGES);
    posts
        .chunks(stage)
        .map(|chunk| mean(&chunk.iter().map(|p| p.ati).collect::<Vec<_>>()))
        .collect()
}

/// Build the drill-down for one brand from its posts in record order.
#[must_use]
pub fn brand_detail(
    aggregate: &BrandAggregate,
    display_name: &str,
    posts: &[&PostRecord],
    stats: &MarketStats,
    top_k: usize,
) -> BrandDetail {
    let mut by_ati: Vec<&PostRecord> = posts.to_vec();
    by_ati.sort_by(|a, b| b.ati.total_cmp(&a.ati));
    let most_average_posts = by_ati
        .iter()
        .take(top_k)
        .map(|p| PostSnapshot::from_post(p))
        .collect();

    by_ati.sort_by(|a, b| a.ati.total_cmp(&b.ati));
    let most_novel_posts = by_ati
        .iter()
        .take(top_k)
        .map(|p| PostSnapshot::from_post(p))
        .collect();

    BrandDetail {
        aggregate: aggregate.clone(),
        display_name: display_name.to_string(),
        comparison: market_comparison(aggregate, stats),
        ati_trend: ati_trend(posts),
        most_average_posts,
        most_novel_posts,
    }
}
