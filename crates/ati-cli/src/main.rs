mod query;
mod report;

use std::sync::Arc;

use ati_analytics::{Analytics, AnalyticsConfig, DatasetSources, Metric};
use ati_core::{AppConfig, BrandDirectory};
use ati_store::{FsReader, RecordStore};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ati-cli")]
#[command(about = "Brand content-homogeneity analytics")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List brands with mean ATI, DS and engagement
    Brands,
    /// Show one brand against the market
    Brand {
        /// Brand handle as it appears in the posts file
        brand: String,
    },
    /// Rank the brands most similar to a brand
    Similar {
        brand: String,
        /// Number of brands to show
        #[arg(long, default_value_t = 3)]
        top: usize,
    },
    /// Market-wide ATI statistics
    Stats,
    /// Mean ATI, novelty and diversity per period
    Trend,
    /// Cluster brands and print their map positions
    Map {
        /// Number of clusters (defaults to ATI_CLUSTER_K)
        #[arg(long)]
        k: Option<usize>,
        /// K-means++ seed (defaults to ATI_CLUSTER_SEED)
        #[arg(long)]
        seed: Option<u64>,
        /// Position brands on the principal components of their embeddings
        #[arg(long)]
        pca: bool,
    },
    /// Equal-width decile buckets of a metric
    Deciles {
        #[arg(long, default_value = "ati")]
        metric: Metric,
    },
    /// Spearman and Pearson correlation between two metrics
    Correlation {
        #[arg(long, default_value = "ati")]
        a: Metric,
        #[arg(long, default_value = "engagement")]
        b: Metric,
    },
    /// Engagement scaling sweep and late-entry tail analysis
    Engagement,
    /// Markdown summary of the market
    Report,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("no command given; run `ati-cli --help` for usage");
        return Ok(());
    };

    let config = ati_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let seed = match &command {
        Commands::Map { seed, .. } => *seed,
        _ => None,
    };
    let analytics = build_analytics(&config, seed)?;

    match command {
        Commands::Brands => query::run_brands(&analytics),
        Commands::Brand { brand } => query::run_brand(&analytics, &brand),
        Commands::Similar { brand, top } => query::run_similar(&analytics, &brand, top),
        Commands::Stats => query::run_stats(&analytics),
        Commands::Trend => query::run_trend(&analytics),
        Commands::Map { k, pca: false, .. } => query::run_map(&analytics, k),
        Commands::Map { k, pca: true, .. } => query::run_embedding_map(&analytics, k),
        Commands::Deciles { metric } => query::run_deciles(&analytics, metric),
        Commands::Correlation { a, b } => query::run_correlation(&analytics, a, b),
        Commands::Engagement => query::run_engagement(&analytics),
        Commands::Report => report::run_report(&analytics),
    }
}

fn build_analytics(config: &AppConfig, seed: Option<u64>) -> anyhow::Result<Analytics> {
    let directory = match &config.brand_names_path {
        Some(path) => ati_core::load_brand_directory(path)?,
        None => BrandDirectory::default(),
    };
    let mut analytics_config = AnalyticsConfig::from_app_config(config);
    if seed.is_some() {
        analytics_config.cluster_seed = seed;
    }
    Ok(Analytics::new(
        Arc::new(RecordStore::new(FsReader::new())),
        DatasetSources::from_app_config(config),
        analytics_config,
        directory,
    ))
}
