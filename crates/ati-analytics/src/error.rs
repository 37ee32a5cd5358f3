use ati_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// The post source could not be located or read.
    #[error("source unavailable: {0}")]
    SourceUnavailable(#[from] StoreError),

    #[error("unknown brand: {0}")]
    UnknownBrand(String),
}
