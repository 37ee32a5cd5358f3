//! Per-brand rollups and market-wide statistics.

use std::collections::BTreeMap;

use ati_core::PostRecord;
use serde::Serialize;

use crate::diagnostics::{convergence_index, mean, population_std_dev};

/// One brand's rollup over its posts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandAggregate {
    pub brand: String,
    pub post_count: usize,
    pub mean_ati: f64,
    pub mean_ds: f64,
    pub mean_engagement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketStats {
    pub total_brands: usize,
    pub total_posts: usize,
    /// Mean ATI over every post.
    pub avg_ati: f64,
    /// Mean of brand-level mean ATI.
    pub brand_avg_ati: f64,
    /// Mean of brand-level mean DS.
    pub avg_ds: f64,
    /// Population standard deviation of brand-level mean ATI.
    pub ati_std_dev: f64,
    pub high_risk_z: f64,
    /// `brand_avg_ati + high_risk_z * ati_std_dev`.
    pub high_risk_threshold: f64,
    pub high_risk_brand_count: usize,
    /// 0-100, higher when brands sit closer together on ATI.
    pub convergence_index: f64,
}

#[derive(Default)]
struct Accum {
    count: usize,
    ati: f64,
    ds: f64,
    engagement: f64,
}

/// Group records by trimmed brand handle, skipping blank handles.
///
/// Output is ordered by brand handle.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate(records: &[PostRecord]) -> Vec<BrandAggregate> {
    let mut groups: BTreeMap<&str, Accum> = BTreeMap::new();
    for record in records {
        let brand = record.brand.trim();
        if brand.is_empty() {
            continue;
        }
        let acc = groups.entry(brand).or_default();
        acc.count += 1;
        acc.ati += record.ati;
        acc.ds += record.ds;
        acc.engagement += record.engagement;
    }

    groups
        .into_iter()
        .map(|(brand, acc)| {
            let n = acc.count as f64;
            BrandAggregate {
                brand: brand.to_string(),
                post_count: acc.count,
                mean_ati: acc.ati / n,
                mean_ds: acc.ds / n,
                mean_engagement: acc.engagement / n,
            }
        })
        .collect()
}

/// Market-wide statistics.
///
/// `avg_ati` is weighted by post while the spread, threshold and DS figures
/// are weighted by brand. A post-weighted average that is not positive falls
/// back to the brand-weighted one. Empty inputs produce all-zero statistics.
#[must_use]
pub fn market_stats(
    records: &[PostRecord],
    aggregates: &[BrandAggregate],
    high_risk_z: f64,
) -> MarketStats {
    let post_ati: Vec<f64> = records.iter().map(|r| r.ati).collect();
    let brand_ati: Vec<f64> = aggregates.iter().map(|a| a.mean_ati).collect();
    let brand_ds: Vec<f64> = aggregates.iter().map(|a| a.mean_ds).collect();

    let brand_avg_ati = mean(&brand_ati);
    let avg_ati = match mean(&post_ati) {
        avg if avg > 0.0 => avg,
        _ => brand_avg_ati,
    };
    let avg_ds = mean(&brand_ds);
    let ati_std_dev = population_std_dev(&brand_ati);
    let high_risk_threshold = brand_avg_ati + high_risk_z * ati_std_dev;
    let high_risk_brand_count = brand_ati
        .iter()
        .filter(|&&ati| ati >= high_risk_threshold)
        .count();

    MarketStats {
        total_brands: aggregates.len(),
        total_posts: records.len(),
        avg_ati,
        brand_avg_ati,
        avg_ds,
        ati_std_dev,
        high_risk_z,
        high_risk_threshold,
        high_risk_brand_count,
        convergence_index: convergence_index(ati_std_dev, brand_avg_ati),
    }
}
