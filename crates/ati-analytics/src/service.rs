//! Query facade over a cached [`Dataset`].

use std::sync::{Arc, PoisonError, RwLock};

use ati_core::BrandDirectory;
use ati_store::RecordStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::aggregate::{market_stats, MarketStats};
use crate::cluster::{market_map, MarketMap};
use crate::dataset::{Dataset, DatasetSources};
use crate::detail::{brand_detail, BrandDetail};
use crate::diagnostics::{self, ContentAssessment, CorrelationResult, DecileBucket};
use crate::engagement::{self, EngagementScaling, EngagementTail, RankedPost, ScatterPost};
use crate::error::AnalyticsError;
use crate::projection::{embedding_map, EmbeddingMap};
use crate::similarity::top_similar;
use crate::trend::{market_trend, TrendPoint};
use crate::types::{AnalyticsConfig, Metric};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandSummary {
    pub brand: String,
    pub display_name: String,
    pub mean_ati: f64,
    pub mean_ds: f64,
    pub mean_engagement: f64,
    pub post_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarBrand {
    pub target: String,
    pub brand: String,
    pub display_name: String,
    pub similarity: f64,
    pub mean_ati: f64,
    pub mean_ds: f64,
    pub mean_novelty: f64,
    pub mean_engagement: f64,
    pub ati_diff: f64,
    pub ds_diff: f64,
}

/// Analytics entry point shared by the server and CLI.
///
/// The dataset is loaded on first use and kept until [`Analytics::invalidate`].
pub struct Analytics {
    store: Arc<RecordStore>,
    sources: DatasetSources,
    config: AnalyticsConfig,
    directory: BrandDirectory,
    dataset: RwLock<Option<Arc<Dataset>>>,
}

impl Analytics {
    #[must_use]
    pub fn new(
        store: Arc<RecordStore>,
        sources: DatasetSources,
        config: AnalyticsConfig,
        directory: BrandDirectory,
    ) -> Self {
        Self {
            store,
            sources,
            config,
            directory,
            dataset: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// The current dataset, loading it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::SourceUnavailable`] if the sources cannot be loaded.
    pub fn dataset(&self) -> Result<Arc<Dataset>, AnalyticsError> {
        if let Some(dataset) = self
            .dataset
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(Arc::clone(dataset));
        }

        let mut slot = self.dataset.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(dataset) = slot.as_ref() {
            return Ok(Arc::clone(dataset));
        }
        let dataset = Arc::new(Dataset::load(&self.store, &self.sources)?);
        *slot = Some(Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Drop the dataset and the store's cached sources.
    pub fn invalidate(&self) {
        let mut slot = self.dataset.write().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
        self.store.invalidate_all();
        tracing::info!("analytics dataset invalidated");
    }

    fn stats_for(&self, dataset: &Dataset) -> MarketStats {
        market_stats(
            dataset.records(),
            dataset.aggregates(),
            self.config.high_risk_z,
        )
    }

    /// Every brand with its means and post count, ordered by handle.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::SourceUnavailable`] if the sources cannot be loaded.
    pub fn list_brands(&self) -> Result<Vec<BrandSummary>, AnalyticsError> {
        let dataset = self.dataset()?;
        Ok(dataset
            .aggregates()
            .iter()
            .map(|a| BrandSummary {
                brand: a.brand.clone(),
                display_name: self.directory.display_name(&a.brand).to_string(),
                mean_ati: a.mean_ati,
                mean_ds: a.mean_ds,
                mean_engagement: a.mean_engagement,
                post_count: a.post_count,
            })
            .collect())
    }

    /// # Errors
    ///
    /// Returns [`AnalyticsError::UnknownBrand`] if the brand has no posts, or
    /// [`AnalyticsError::SourceUnavailable`] if the sources cannot be loaded.
    pub fn brand_detail(&self, brand: &str) -> Result<BrandDetail, AnalyticsError> {
        let dataset = self.dataset()?;
        let brand = brand.trim();
        let aggregate = dataset
            .aggregate_for(brand)
            .ok_or_else(|| AnalyticsError::UnknownBrand(brand.to_string()))?;
        let stats = self.stats_for(&dataset);
        let posts = dataset.brand_posts(brand);
        Ok(brand_detail(
            aggregate,
            self.directory.display_name(brand),
            &posts,
            &stats,
            self.config.top_posts,
        ))
    }

    /// The `k` brands closest to `brand` in embedding space.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::UnknownBrand`] if the brand has no posts, or
    /// [`AnalyticsError::SourceUnavailable`] if the sources cannot be loaded.
    pub fn similar_brands(&self, brand: &str, k: usize) -> Result<Vec<SimilarBrand>, AnalyticsError> {
        let dataset = self.dataset()?;
        let brand = brand.trim();
        let target = dataset
            .aggregate_for(brand)
            .ok_or_else(|| AnalyticsError::UnknownBrand(brand.to_string()))?;

        let scores = top_similar(brand, dataset.embeddings(), k, self.config.similarity_sigma);
        Ok(scores
            .into_iter()
            .filter_map(|score| {
                let candidate = dataset.aggregate_for(&score.brand)?;
                let mean_novelty = dataset
                    .embeddings()
                    .iter()
                    .find(|e| e.brand == score.brand)
                    .map_or(0.0, crate::embedding::BrandEmbedding::mean_novelty);
                Some(SimilarBrand {
                    target: brand.to_string(),
                    display_name: self.directory.display_name(&score.brand).to_string(),
                    similarity: score.similarity,
                    mean_ati: candidate.mean_ati,
                    mean_ds: candidate.mean_ds,
                    mean_novelty,
                    mean_engagement: candidate.mean_engagement,
                    ati_diff: (candidate.mean_ati - target.mean_ati).abs(),
                    ds_diff: (candidate.mean_ds - target.mean_ds).abs(),
                    brand: score.brand,
                })
            })
            .collect())
    }

    /// # Errors
    ///
    /// Returns [`AnalyticsError::SourceUnavailable`] if the sources cannot be loaded.
    pub fn market_stats(&self) -> Result<MarketStats, AnalyticsError> {
        let dataset = self.dataset()?;
        Ok(self.stats_for(&dataset))
    }

    /// # Errors
    ///
    /// Returns [`AnalyticsError::SourceUnavailable`] if the sources cannot be loaded.
    pub fn market_trend(&self) -> Result<Vec<TrendPoint>, AnalyticsError> {
        let dataset = self.dataset()?;
        Ok(market_trend(dataset.records(), self.config.trend_segments))
    }

    /// Cluster the market into `k` groups (configured default when `None`).
    ///
    /// Uses the configured seed when one is set.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::SourceUnavailable`] if the sources cannot be loaded.
    pub fn market_map(&self, k: Option<usize>) -> Result<MarketMap, AnalyticsError> {
        let k = k.unwrap_or(self.config.cluster_k);
        match self.config.cluster_seed {
            Some(seed) => self.market_map_with_rng(k, &mut StdRng::seed_from_u64(seed)),
            None => self.market_map_with_rng(k, &mut rand::rng()),
        }
    }

    /// # Errors
    ///
    /// Returns [`AnalyticsError::SourceUnavailable`] if the sources cannot be loaded.
    pub fn market_map_with_rng<R: Rng + ?Sized>(
        &self,
        k: usize,
        rng: &mut R,
    ) -> Result<MarketMap, AnalyticsError> {
        let dataset = self.dataset()?;
        Ok(market_map(
            dataset.aggregates(),
            dataset.embeddings(),
            k,
            rng,
        ))
    }

    /// Like [`Analytics::market_map`] but positioned on the first two
    /// principal components of the brand embeddings.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::SourceUnavailable`] if the sources cannot be loaded.
    pub fn embedding_map(&self, k: Option<usize>) -> Result<EmbeddingMap, AnalyticsError> {
        let k = k.unwrap_or(self.config.cluster_k);
        match self.config.cluster_seed {
            Some(seed) => self.embedding_map_with_rng(k, &mut StdRng::seed_from_u64(seed)),
            None => self.embedding_map_with_rng(k, &mut rand::rng()),
        }
    }

    /// # Errors
    ///
    /// Returns [`AnalyticsError::SourceUnavailable`] if the sources cannot be loaded.
    pub fn embedding_map_with_rng<R: Rng + ?Sized>(
        &self,
        k: usize,
        rng: &mut R,
    ) -> Result<EmbeddingMap, AnalyticsError> {
        let dataset = self.dataset()?;
        Ok(embedding_map(
            dataset.aggregates(),
            dataset.embeddings(),
            k,
            rng,
        ))
    }

    /// # Errors
    ///
    /// Returns [`AnalyticsError::SourceUnavailable`] if the sources cannot be loaded.
    pub fn deciles(&self, metric: Metric) -> Result<Vec<DecileBucket>, AnalyticsError> {
        let dataset = self.dataset()?;
        Ok(diagnostics::deciles(dataset.records(), metric))
    }

    /// # Errors
    ///
    /// Returns [`AnalyticsError::SourceUnavailable`] if the sources cannot be loaded.
    pub fn correlation(
        &self,
        metric_a: Metric,
        metric_b: Metric,
    ) -> Result<CorrelationResult, AnalyticsError> {
        let dataset = self.dataset()?;
        Ok(diagnostics::correlation(dataset.records(), metric_a, metric_b))
    }

    /// # Errors
    ///
    /// Returns [`AnalyticsError::SourceUnavailable`] if the sources cannot be loaded.
    pub fn engagement_scaling(&self) -> Result<EngagementScaling, AnalyticsError> {
        let dataset = self.dataset()?;
        Ok(engagement::engagement_scaling(dataset.records()))
    }

    /// Late-entry analysis of the primary period against the earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::SourceUnavailable`] if the sources cannot be loaded.
    pub fn engagement_tail(&self) -> Result<EngagementTail, AnalyticsError> {
        let dataset = self.dataset()?;
        Ok(engagement::engagement_tail(
            dataset.earlier_records(),
            dataset.current_records(),
        ))
    }

    /// # Errors
    ///
    /// Returns [`AnalyticsError::SourceUnavailable`] if the sources cannot be loaded.
    pub fn tail_outliers(&self, limit: usize) -> Result<Vec<RankedPost>, AnalyticsError> {
        let dataset = self.dataset()?;
        Ok(engagement::tail_outliers(dataset.records(), limit))
    }

    /// # Errors
    ///
    /// Returns [`AnalyticsError::SourceUnavailable`] if the sources cannot be loaded.
    pub fn high_ati_posts(&self, limit: usize) -> Result<Vec<RankedPost>, AnalyticsError> {
        let dataset = self.dataset()?;
        Ok(engagement::high_ati_posts(dataset.records(), limit))
    }

    /// A fresh random sample of posts for the novelty/diversity scatter.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::SourceUnavailable`] if the sources cannot be loaded.
    pub fn scatter_sample(&self, limit: usize) -> Result<Vec<ScatterPost>, AnalyticsError> {
        self.scatter_sample_with_rng(limit, &mut rand::rng())
    }

    /// # Errors
    ///
    /// Returns [`AnalyticsError::SourceUnavailable`] if the sources cannot be loaded.
    pub fn scatter_sample_with_rng<R: Rng + ?Sized>(
        &self,
        limit: usize,
        rng: &mut R,
    ) -> Result<Vec<ScatterPost>, AnalyticsError> {
        let dataset = self.dataset()?;
        Ok(engagement::scatter_sample(dataset.records(), limit, rng))
    }

    /// Place an externally scored ATI against the market.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::SourceUnavailable`] if the sources cannot be loaded.
    pub fn assess(&self, ati: f64) -> Result<ContentAssessment, AnalyticsError> {
        let dataset = self.dataset()?;
        let stats = self.stats_for(&dataset);
        Ok(diagnostics::assess_ati(ati, dataset.records(), &stats))
    }
}

impl std::fmt::Debug for Analytics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analytics")
            .field("sources", &self.sources)
            .field("config", &self.config)
            .field("brand_names", &self.directory.len())
            .finish_non_exhaustive()
    }
}
