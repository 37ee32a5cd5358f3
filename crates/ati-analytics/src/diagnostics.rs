//! Decile binning, correlation, and market convergence.

use ati_core::PostRecord;
use serde::Serialize;

use crate::aggregate::MarketStats;
use crate::types::Metric;

pub const DECILE_COUNT: usize = 10;

/// One equal-width bin of a metric's range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecileBucket {
    /// 1-based bucket index.
    pub decile: usize,
    pub lower: f64,
    pub upper: f64,
    /// Mean metric value of the members, or the bin midpoint when empty.
    pub mean: f64,
    pub post_count: usize,
    pub engagement_mean: f64,
    pub engagement_median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub metric_a: Metric,
    pub metric_b: Metric,
    pub spearman: f64,
    pub pearson: f64,
    /// Least-squares slope of B on A.
    pub slope: f64,
    pub intercept: f64,
    pub sample_size: usize,
}

/// Where a single content score sits relative to the market.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentAssessment {
    pub ati: f64,
    pub market_avg_ati: f64,
    pub high_risk_threshold: f64,
    pub is_high_risk: bool,
    /// Share of valid post ATIs at or below `ati`, 0-100.
    pub percentile: f64,
    /// Decile bucket of the market ATI distribution containing `ati`.
    pub decile: Option<usize>,
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

pub(crate) fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// `100 * (1 - std_dev / avg)`, clamped to 0-100. Zero when `avg` is not positive.
#[must_use]
pub fn convergence_index(std_dev: f64, avg: f64) -> f64 {
    if avg <= 0.0 {
        return 0.0;
    }
    (100.0 * (1.0 - std_dev / avg)).clamp(0.0, 100.0)
}

/// Split the metric's range into ten equal-width buckets.
///
/// Records with a negative metric value are excluded before the range is
/// taken. Buckets are left-closed and right-open, except the last which
/// also includes the maximum. When nothing survives the filter the range
/// collapses to 0, giving ten empty zero-width buckets.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn deciles(posts: &[PostRecord], metric: Metric) -> Vec<DecileBucket> {
    let valid: Vec<(f64, f64)> = posts
        .iter()
        .map(|p| (metric.value(p), p.engagement))
        .filter(|(v, _)| *v >= 0.0)
        .collect();

    let (min, max) = if valid.is_empty() {
        (0.0, 0.0)
    } else {
        (
            valid.iter().map(|(v, _)| *v).fold(f64::INFINITY, f64::min),
            valid.iter().map(|(v, _)| *v).fold(f64::NEG_INFINITY, f64::max),
        )
    };
    let width = (max - min) / DECILE_COUNT as f64;

    let bounds: Vec<(f64, f64)> = (0..DECILE_COUNT)
        .map(|i| {
            let lower = min + i as f64 * width;
            let upper = if i + 1 == DECILE_COUNT {
                max
            } else {
                min + (i + 1) as f64 * width
            };
            (lower, upper)
        })
        .collect();

    let mut members: Vec<Vec<(f64, f64)>> = vec![Vec::new(); DECILE_COUNT];
    for &(value, engagement) in &valid {
        let idx = bounds
            .iter()
            .position(|&(lower, upper)| value >= lower && value < upper)
            .unwrap_or(DECILE_COUNT - 1);
        members[idx].push((value, engagement));
    }

    bounds
        .into_iter()
        .zip(members)
        .enumerate()
        .map(|(i, ((lower, upper), bucket))| {
            if bucket.is_empty() {
                return DecileBucket {
                    decile: i + 1,
                    lower,
                    upper,
                    mean: (lower + upper) / 2.0,
                    post_count: 0,
                    engagement_mean: 0.0,
                    engagement_median: 0.0,
                };
            }
            let values: Vec<f64> = bucket.iter().map(|(v, _)| *v).collect();
            let mut engagement: Vec<f64> = bucket.iter().map(|(_, e)| *e).collect();
            DecileBucket {
                decile: i + 1,
                lower,
                upper,
                mean: mean(&values),
                post_count: bucket.len(),
                engagement_mean: mean(&engagement),
                engagement_median: median(&mut engagement),
            }
        })
        .collect()
}

/// 1-based ranks; equal values keep their input order.
#[allow(clippy::cast_precision_loss)]
fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let mut ranks = vec![0.0; values.len()];
    for (position, &idx) in order.iter().enumerate() {
        ranks[idx] = (position + 1) as f64;
    }
    ranks
}

/// Spearman rank correlation over the common prefix of `x` and `y`.
///
/// Returns 0 for fewer than two pairs.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }
    let rx = ranks(&x[..n]);
    let ry = ranks(&y[..n]);
    let d2: f64 = rx.iter().zip(&ry).map(|(a, b)| (a - b).powi(2)).sum();
    let n = n as f64;
    1.0 - 6.0 * d2 / (n * (n * n - 1.0))
}

/// Pearson product-moment correlation over the common prefix of `x` and `y`.
///
/// Returns 0 for fewer than two pairs or when either series is constant.
#[must_use]
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let (mx, my) = (mean(x), mean(y));

    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mx, b - my);
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }

    let denom = (vx * vy).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    (cov / denom).clamp(-1.0, 1.0)
}

/// Least-squares fit `y = slope * x + intercept`.
#[must_use]
pub fn linear_fit(x: &[f64], y: &[f64]) -> (f64, f64) {
    let n = x.len().min(y.len());
    let (x, y) = (&x[..n], &y[..n]);
    let (mx, my) = (mean(x), mean(y));
    if n < 2 {
        return (0.0, my);
    }

    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
    }
    if sxx == 0.0 {
        return (0.0, my);
    }
    let slope = sxy / sxx;
    (slope, my - slope * mx)
}

/// Correlate two metrics across all posts.
#[must_use]
pub fn correlation(posts: &[PostRecord], metric_a: Metric, metric_b: Metric) -> CorrelationResult {
    let a: Vec<f64> = posts.iter().map(|p| metric_a.value(p)).collect();
    let b: Vec<f64> = posts.iter().map(|p| metric_b.value(p)).collect();
    let (slope, intercept) = linear_fit(&a, &b);
    CorrelationResult {
        metric_a,
        metric_b,
        spearman: spearman(&a, &b),
        pearson: pearson(&a, &b),
        slope,
        intercept,
        sample_size: posts.len(),
    }
}

/// Place one ATI score against the market's post distribution.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn assess_ati(ati: f64, posts: &[PostRecord], stats: &MarketStats) -> ContentAssessment {
    let valid: Vec<f64> = posts.iter().map(|p| p.ati).filter(|v| *v >= 0.0).collect();
    let percentile = if valid.is_empty() {
        0.0
    } else {
        100.0 * valid.iter().filter(|&&v| v <= ati).count() as f64 / valid.len() as f64
    };
    let decile = if valid.is_empty() {
        None
    } else {
        deciles(posts, Metric::Ati)
            .iter()
            .find(|b| {
                ati >= b.lower && (ati < b.upper || (b.decile == DECILE_COUNT && ati <= b.upper))
            })
            .map(|b| b.decile)
    };

    ContentAssessment {
        ati,
        market_avg_ati: stats.avg_ati,
        high_risk_threshold: stats.high_risk_threshold,
        is_high_risk: stats.total_brands > 0 && ati >= stats.high_risk_threshold,
        percentile,
        decile,
    }
}

#[cfg(test)]
#[path = "diagnostics_test.rs"]
mod tests;
