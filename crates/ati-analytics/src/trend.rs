use std::collections::BTreeMap;

use ati_core::PostRecord;
use chrono::Datelike;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// `YYYY-MM` for timestamped posts, `segment-N` otherwise.
    pub period: String,
    pub mean_ati: f64,
    pub mean_novelty: f64,
    pub mean_diversity: f64,
    pub post_count: usize,
}

/// Calendar months sort before sequential segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PeriodKey {
    Month { year: i32, month: u32 },
    Segment(usize),
}

impl PeriodKey {
    fn label(self) -> String {
        match self {
            PeriodKey::Month { year, month } => format!("{year:04}-{month:02}"),
            PeriodKey::Segment(i) => format!("segment-{}", i + 1),
        }
    }
}

#[derive(Default)]
struct Accum {
    count: usize,
    ati: f64,
    novelty: f64,
    diversity: f64,
}

/// Market-wide ATI, novelty and diversity per period.
///
/// Timestamped posts group by calendar month. Posts without a timestamp
/// fall into `segments` equal slices of the record sequence by position.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn market_trend(records: &[PostRecord], segments: usize) -> Vec<TrendPoint> {
    let segments = segments.max(1);
    let total = records.len();

    let mut groups: BTreeMap<PeriodKey, Accum> = BTreeMap::new();
    for (i, record) in records.iter().enumerate() {
        let key = match record.posted_at {
            Some(ts) => PeriodKey::Month {
                year: ts.year(),
                month: ts.month(),
            },
            None => PeriodKey::Segment((i * segments / total).min(segments - 1)),
        };
        let acc = groups.entry(key).or_default();
        acc.count += 1;
        acc.ati += record.ati;
        acc.novelty += record.mean_novelty();
        acc.diversity += record.mean_diversity();
    }

    groups
        .into_iter()
        .map(|(key, acc)| {
            let n = acc.count as f64;
            TrendPoint {
                period: key.label(),
                mean_ati: acc.ati / n,
                mean_novelty: acc.novelty / n,
                mean_diversity: acc.diversity / n,
                post_count: acc.count,
            }
        })
        .collect()
}
