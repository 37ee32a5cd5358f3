mod api;
mod middleware;

use std::sync::Arc;

use ati_analytics::{Analytics, AnalyticsConfig, DatasetSources};
use ati_core::{AppConfig, BrandDirectory};
use ati_oracle::OracleClient;
use ati_store::{FsReader, RecordStore};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ati_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let analytics = Arc::new(build_analytics(&config)?);
    let oracle = match config.oracle_url.as_deref() {
        Some(url) => Some(Arc::new(OracleClient::new(url, config.oracle_timeout_secs)?)),
        None => {
            tracing::warn!("ATI_ORACLE_URL not set; /api/v1/analyze will report scoring unavailable");
            None
        }
    };

    // Warm the cache so the first request does not pay for parsing.
    let warm = Arc::clone(&analytics);
    match tokio::task::spawn_blocking(move || warm.dataset()).await? {
        Ok(dataset) => tracing::info!(
            posts = dataset.records().len(),
            brands = dataset.aggregates().len(),
            skipped = dataset.skipped_rows(),
            "dataset loaded"
        ),
        Err(e) => tracing::warn!(error = %e, "dataset not loaded at startup; will retry on demand"),
    }

    let app = build_app(AppState { analytics, oracle });

    tracing::info!(addr = %config.bind_addr, env = %config.env, "ati-server listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn build_analytics(config: &AppConfig) -> anyhow::Result<Analytics> {
    let directory = match &config.brand_names_path {
        Some(path) => ati_core::load_brand_directory(path)?,
        None => BrandDirectory::default(),
    };
    Ok(Analytics::new(
        Arc::new(RecordStore::new(FsReader::new())),
        DatasetSources::from_app_config(config),
        AnalyticsConfig::from_app_config(config),
        directory,
    ))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
