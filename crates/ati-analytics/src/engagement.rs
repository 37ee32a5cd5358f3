//! Engagement-side diagnostics: weight sweep, post rankings, tail analysis.

use std::collections::{BTreeMap, HashSet};

use ati_core::PostRecord;
use rand::Rng;
use serde::Serialize;

use crate::detail::snippet;
use crate::diagnostics::{mean, pearson, population_std_dev};

/// Comment weights tried when rebuilding the engagement rate.
pub const COMMENT_WEIGHTS: [f64; 11] = [1.0, 2.0, 3.0, 4.0, 4.8, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
/// Comment weight used by the feature pipeline.
pub const DEFAULT_COMMENT_WEIGHT: f64 = 5.0;

const RANKED_CAPTION_CHARS: usize = 300;
const SCATTER_CAPTION_CHARS: usize = 50;
const EXTREME_SHARE: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightCorrelation {
    pub comment_weight: f64,
    /// Pearson correlation of the rebuilt engagement rate with ATI.
    pub correlation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementScaling {
    /// Weight whose engagement rate is least correlated with ATI.
    pub recommended_weight: f64,
    pub correlation: f64,
    pub sweep: Vec<WeightCorrelation>,
    pub sample_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPost {
    pub brand: String,
    pub posted_on: Option<String>,
    pub ati: f64,
    pub novelty: f64,
    pub diversity: f64,
    pub likes: i64,
    pub comments: i64,
    pub followers: i64,
    pub engagement: f64,
    pub caption: String,
    pub url: Option<String>,
}

/// One point of the novelty/diversity scatter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPost {
    /// `{brand}_{position}`, unique within one sample.
    pub post_id: String,
    pub brand: String,
    pub ati: f64,
    pub novelty: f64,
    pub diversity: f64,
    pub followers: i64,
    pub engagement: f64,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LateEntryBrand {
    pub brand: String,
    pub first_post_on: Option<String>,
    pub post_count: usize,
    pub mean_ati: f64,
    pub mean_engagement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementTail {
    pub late_entry_brands: Vec<LateEntryBrand>,
    pub late_entry_brand_count: usize,
    pub late_entry_post_count: usize,
    pub late_entry_std_dev: f64,
    pub other_post_count: usize,
    pub other_std_dev: f64,
    /// `late_entry_std_dev / other_std_dev`, 0 when the latter is 0.
    pub std_dev_ratio: f64,
    /// Top 5% of posts by engagement, rounded up.
    pub extreme_post_count: usize,
    /// Engagement of the lowest post inside the extreme set.
    pub extreme_threshold: f64,
}

/// Engagement rate with the given comment weight.
///
/// A zero follower count is treated as 0.01 before the usual 0.01 offset.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn weighted_engagement(post: &PostRecord, comment_weight: f64) -> f64 {
    let followers = if post.followers == 0 {
        0.01
    } else {
        post.followers as f64
    };
    (post.likes as f64 + comment_weight * post.comments as f64) / (followers + 0.01)
}

/// Sweep [`COMMENT_WEIGHTS`] and pick the one least correlated with ATI.
///
/// Earlier weights win ties.
#[must_use]
pub fn engagement_scaling(posts: &[PostRecord]) -> EngagementScaling {
    if posts.is_empty() {
        return EngagementScaling {
            recommended_weight: DEFAULT_COMMENT_WEIGHT,
            correlation: 0.0,
            sweep: Vec::new(),
            sample_size: 0,
        };
    }

    let ati: Vec<f64> = posts.iter().map(|p| p.ati).collect();
    let sweep: Vec<WeightCorrelation> = COMMENT_WEIGHTS
        .iter()
        .map(|&w| {
            let rate: Vec<f64> = posts.iter().map(|p| weighted_engagement(p, w)).collect();
            WeightCorrelation {
                comment_weight: w,
                correlation: pearson(&ati, &rate),
            }
        })
        .collect();

    let best = sweep
        .iter()
        .fold(&sweep[0], |best, c| {
            if c.correlation.abs() < best.correlation.abs() {
                c
            } else {
                best
            }
        })
        .clone();

    EngagementScaling {
        recommended_weight: best.comment_weight,
        correlation: best.correlation,
        sweep,
        sample_size: posts.len(),
    }
}

impl RankedPost {
    fn from_post(post: &PostRecord) -> Self {
        Self {
            brand: post.brand.clone(),
            posted_on: post
                .posted_at
                .map(|ts| ts.date().format("%Y-%m-%d").to_string()),
            ati: post.ati,
            novelty: post.mean_novelty(),
            diversity: post.mean_diversity(),
            likes: post.likes,
            comments: post.comments,
            followers: post.followers,
            engagement: post.engagement,
            caption: snippet(&post.caption, RANKED_CAPTION_CHARS),
            url: post.url(),
        }
    }
}

/// The `limit` posts with the highest engagement rate.
#[must_use]
pub fn tail_outliers(posts: &[PostRecord], limit: usize) -> Vec<RankedPost> {
    let mut sorted: Vec<&PostRecord> = posts.iter().collect();
    sorted.sort_by(|a, b| b.engagement.total_cmp(&a.engagement));
    sorted
        .into_iter()
        .take(limit)
        .map(RankedPost::from_post)
        .collect()
}

/// Up to `limit` posts drawn uniformly without replacement, in draw order.
pub fn scatter_sample<R: Rng + ?Sized>(
    posts: &[PostRecord],
    limit: usize,
    rng: &mut R,
) -> Vec<ScatterPost> {
    let amount = limit.min(posts.len());
    rand::seq::index::sample(rng, posts.len(), amount)
        .into_iter()
        .enumerate()
        .map(|(position, idx)| {
            let post = &posts[idx];
            ScatterPost {
                post_id: format!("{}_{position}", post.brand),
                brand: post.brand.clone(),
                ati: post.ati,
                novelty: post.mean_novelty(),
                diversity: post.mean_diversity(),
                followers: post.followers,
                engagement: post.engagement,
                caption: snippet(&post.caption, SCATTER_CAPTION_CHARS),
            }
        })
        .collect()
}

/// The `limit` highest-ATI posts, at most one per brand.
#[must_use]
pub fn high_ati_posts(posts: &[PostRecord], limit: usize) -> Vec<RankedPost> {
    let mut sorted: Vec<&PostRecord> = posts.iter().filter(|p| !p.brand.is_empty()).collect();
    sorted.sort_by(|a, b| b.ati.total_cmp(&a.ati));

    let mut seen = HashSet::new();
    sorted
        .into_iter()
        .filter(|p| seen.insert(p.brand.as_str()))
        .take(limit)
        .map(RankedPost::from_post)
        .collect()
}

/// Compare engagement spread of brands new in `current` against the rest.
///
/// A brand is late-entry when it posts in `current` but never in `earlier`.
/// Handles are compared trimmed and posts with a blank handle are ignored.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn engagement_tail(earlier: &[PostRecord], current: &[PostRecord]) -> EngagementTail {
    let earlier_brands: HashSet<&str> = earlier
        .iter()
        .map(|p| p.brand.trim())
        .filter(|b| !b.is_empty())
        .collect();

    let mut late: BTreeMap<&str, Vec<&PostRecord>> = BTreeMap::new();
    let mut other_engagement = Vec::new();
    let mut by_engagement = Vec::new();
    for post in current {
        let brand = post.brand.trim();
        if brand.is_empty() {
            continue;
        }
        by_engagement.push(post.engagement);
        if earlier_brands.contains(brand) {
            other_engagement.push(post.engagement);
        } else {
            late.entry(brand).or_default().push(post);
        }
    }

    let late_engagement: Vec<f64> = late
        .values()
        .flatten()
        .map(|p| p.engagement)
        .collect();
    let late_entry_std_dev = population_std_dev(&late_engagement);
    let other_std_dev = population_std_dev(&other_engagement);

    let late_entry_brands: Vec<LateEntryBrand> = late
        .iter()
        .map(|(brand, posts)| LateEntryBrand {
            brand: (*brand).to_string(),
            first_post_on: posts
                .iter()
                .filter_map(|p| p.posted_at)
                .min()
                .map(|ts| ts.date().format("%Y-%m-%d").to_string()),
            post_count: posts.len(),
            mean_ati: mean(&posts.iter().map(|p| p.ati).collect::<Vec<_>>()),
            mean_engagement: mean(&posts.iter().map(|p| p.engagement).collect::<Vec<_>>()),
        })
        .collect();

    by_engagement.sort_by(|a, b| b.total_cmp(a));
    let extreme_post_count = (by_engagement.len() as f64 * EXTREME_SHARE).ceil() as usize;
    let extreme_threshold = extreme_post_count
        .checked_sub(1)
        .and_then(|i| by_engagement.get(i))
        .copied()
        .unwrap_or(0.0);

    EngagementTail {
        late_entry_brand_count: late_entry_brands.len(),
        late_entry_brands,
        late_entry_post_count: late_engagement.len(),
        late_entry_std_dev,
        other_post_count: other_engagement.len(),
        other_std_dev,
        std_dev_ratio: if other_std_dev > 0.0 {
            late_entry_std_dev / other_std_dev
        } else {
            0.0
        },
        extreme_post_count,
        extreme_threshold,
    }
}

#[cfg(test)]
#[path = "engagement_test.rs"]
mod tests;
