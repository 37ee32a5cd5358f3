use std::sync::Arc;

use ati_core::PostRecord;
use ati_store::{LoadedSource, RecordStore};

use crate::aggregate::{aggregate, BrandAggregate};
use crate::embedding::{embed_all, BrandEmbedding};
use crate::error::AnalyticsError;

/// Source candidates for the two observation periods.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetSources {
    /// Primary period, in preference order.
    pub posts: Vec<String>,
    /// Optional earlier period, in preference order.
    pub earlier_posts: Vec<String>,
}

impl DatasetSources {
    #[must_use]
    pub fn from_app_config(config: &ati_core::AppConfig) -> Self {
        let to_ids = |paths: &[std::path::PathBuf]| -> Vec<String> {
            paths.iter().map(|p| p.display().to_string()).collect()
        };
        Self {
            posts: to_ids(&config.posts_sources),
            earlier_posts: to_ids(&config.train_posts_sources),
        }
    }
}

/// The loaded posts plus everything derived from them.
#[derive(Debug)]
pub struct Dataset {
    current: Arc<LoadedSource>,
    earlier: Option<Arc<LoadedSource>>,
    /// Earlier period first, then the current one.
    records: Vec<PostRecord>,
    aggregates: Vec<BrandAggregate>,
    embeddings: Vec<BrandEmbedding>,
}

impl Dataset {
    /// Load both periods through `store`.
    ///
    /// A missing earlier period is tolerated and logged.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::SourceUnavailable`] when no primary source
    /// exists or any source fails to read.
    pub fn load(store: &RecordStore, sources: &DatasetSources) -> Result<Self, AnalyticsError> {
        let current = store.load_first(&sources.posts)?;

        let earlier = if sources.earlier_posts.is_empty() {
            None
        } else {
            match store.load_first(&sources.earlier_posts) {
                Ok(loaded) => Some(loaded),
                Err(e) if e.is_not_found() => {
                    tracing::warn!(error = %e, "earlier-period posts not found; continuing without them");
                    None
                }
                Err(e) => return Err(e.into()),
            }
        };

        Ok(Self::from_sources(current, earlier))
    }

    #[must_use]
    pub fn from_sources(current: Arc<LoadedSource>, earlier: Option<Arc<LoadedSource>>) -> Self {
        let mut records = Vec::with_capacity(
            current.records.len() + earlier.as_ref().map_or(0, |e| e.records.len()),
        );
        if let Some(earlier) = &earlier {
            records.extend(earlier.records.iter().cloned());
        }
        records.extend(current.records.iter().cloned());

        let aggregates = aggregate(&records);
        let embeddings = embed_all(&records);
        tracing::info!(
            posts = records.len(),
            brands = aggregates.len(),
            skipped = current.skipped_rows + earlier.as_ref().map_or(0, |e| e.skipped_rows),
            "dataset ready"
        );

        Self {
            current,
            earlier,
            records,
            aggregates,
            embeddings,
        }
    }

    /// Every post, earlier period first.
    #[must_use]
    pub fn records(&self) -> &[PostRecord] {
        &self.records
    }

    #[must_use]
    pub fn current_records(&self) -> &[PostRecord] {
        &self.current.records
    }

    #[must_use]
    pub fn earlier_records(&self) -> &[PostRecord] {
        self.earlier
            .as_ref()
            .map_or(&[][..], |e| e.records.as_slice())
    }

    #[must_use]
    pub fn has_earlier_period(&self) -> bool {
        self.earlier.is_some()
    }

    #[must_use]
    pub fn aggregates(&self) -> &[BrandAggregate] {
        &self.aggregates
    }

    #[must_use]
    pub fn embeddings(&self) -> &[BrandEmbedding] {
        &self.embeddings
    }

    #[must_use]
    pub fn aggregate_for(&self, brand: &str) -> Option<&BrandAggregate> {
        self.aggregates
            .binary_search_by(|a| a.brand.as_str().cmp(brand))
            .ok()
            .map(|i| &self.aggregates[i])
    }

    /// Posts of one brand in record order.
    #[must_use]
    pub fn brand_posts(&self, brand: &str) -> Vec<&PostRecord> {
        self.records
            .iter()
            .filter(|r| r.brand.trim() == brand)
            .collect()
    }

    #[must_use]
    pub fn skipped_rows(&self) -> usize {
        self.current.skipped_rows + self.earlier.as_ref().map_or(0, |e| e.skipped_rows)
    }

    #[must_use]
    pub fn source_ids(&self) -> Vec<&str> {
        self.earlier
            .iter()
            .chain(std::iter::once(&self.current))
            .map(|s| s.source_id.as_str())
            .collect()
    }
}
