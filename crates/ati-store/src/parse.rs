use std::collections::HashMap;

use ati_core::{Modality, ModalityScores, PostRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};

/// Skipped rows beyond this count are tallied without an individual warning.
pub const MAX_ROW_WARNINGS: usize = 5;

/// Result of parsing one source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSource {
    pub records: Vec<PostRecord>,
    /// Rows dropped because their field count was off by more than one or
    /// they could not be decoded.
    pub skipped_rows: usize,
}

impl ParsedSource {
    fn skip(&mut self, source_id: &str, line: u64, reason: &str) {
        self.skipped_rows += 1;
        if self.skipped_rows <= MAX_ROW_WARNINGS {
            tracing::warn!(source = source_id, line, reason, "skipping row");
        }
    }
}

/// Parse per-post feature rows from CSV text.
///
/// The first record is the header. A data row is accepted when its field
/// count is within one of the header's; missing trailing fields read as empty
/// and surplus fields are ignored. Fields are trimmed, rows with only empty
/// fields are ignored, and unknown or unparsable numeric values read as 0.
#[must_use]
pub fn parse_posts(source_id: &str, content: &str) -> ParsedSource {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());
    let mut rows = reader.records();

    let header = loop {
        match rows.next() {
            None => return ParsedSource::default(),
            Some(Ok(record)) if is_blank(&record) => {}
            Some(Ok(record)) => break record,
            Some(Err(e)) => {
                tracing::warn!(source = source_id, error = %e, "unreadable header row");
                return ParsedSource::default();
            }
        }
    };

    let columns: HashMap<&str, usize> = header
        .iter()
        .enumerate()
        .map(|(i, name)| (name, i))
        .collect();
    let expected = header.len();

    let mut parsed = ParsedSource::default();
    for result in rows {
        let values = match result {
            Ok(values) => values,
            Err(e) => {
                let line = e.position().map_or(0, csv::Position::line);
                parsed.skip(source_id, line, "undecodable record");
                continue;
            }
        };
        if is_blank(&values) {
            continue;
        }

        let line = values.position().map_or(0, csv::Position::line);
        if values.len() + 1 < expected || values.len() > expected + 1 {
            parsed.skip(source_id, line, "mismatched field count");
            continue;
        }

        let row = Row {
            columns: &columns,
            values: &values,
        };
        parsed.records.push(row.to_record());
    }

    if parsed.skipped_rows > 0 {
        tracing::info!(
            source = source_id,
            skipped = parsed.skipped_rows,
            accepted = parsed.records.len(),
            "finished parsing source with skipped rows"
        );
    }

    parsed
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(str::is_empty)
}

struct Row<'a> {
    columns: &'a HashMap<&'a str, usize>,
    values: &'a StringRecord,
}

impl Row<'_> {
    fn text(&self, column: &str) -> &str {
        self.columns
            .get(column)
            .and_then(|&i| self.values.get(i))
            .unwrap_or("")
    }

    fn float(&self, column: &str) -> f64 {
        parse_float(self.text(column))
    }

    fn int(&self, column: &str) -> i64 {
        parse_int(self.text(column))
    }

    fn modality(&self, modality: Modality) -> ModalityScores {
        let prefix = modality.column_prefix();
        ModalityScores {
            novelty: self.float(&format!("{prefix}_nov")),
            diversity: self.float(&format!("{prefix}_div")),
            ds: self.float(&format!("{prefix}_DS")),
            ati: self.float(&format!("{prefix}_ATI")),
        }
    }

    fn to_record(&self) -> PostRecord {
        let shortcode = self.text("shortcode");
        PostRecord {
            brand: self.text("brand").to_string(),
            likes: self.int("count_like"),
            comments: self.int("count_comment"),
            followers: self.int("followers"),
            engagement: self.float("y"),
            text: self.modality(Modality::Text),
            image: self.modality(Modality::Image),
            meta: self.modality(Modality::Meta),
            ati: self.float("ATI_final"),
            ds: self.float("DS_final"),
            caption: self.text("caption").to_string(),
            ocr_text: self.text("ocr_text").to_string(),
            posted_at: parse_timestamp(self.text("ftime_parsed")),
            shortcode: (!shortcode.is_empty()).then(|| shortcode.to_string()),
        }
    }
}

fn parse_float(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

#[allow(clippy::cast_possible_truncation)]
fn parse_int(raw: &str) -> i64 {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<i64>() {
        return value;
    }
    // Exports sometimes write counts as floats ("1520.0").
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.abs() < 9.0e18)
        .map_or(0, |v| v.trunc() as i64)
}

const TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
