//! Shared domain types and configuration for the ATI market analytics workspace.

mod app_config;
mod brands;
mod config;
mod records;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use brands::{load_brand_directory, BrandDirectory, BrandEntry, BrandsFile};
pub use config::{load_app_config, load_app_config_from_env};
pub use records::{Modality, ModalityScores, PostRecord};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read brands file {path}: {source}")]
    BrandsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse brands file: {0}")]
    BrandsFileParse(#[source] serde_yaml::Error),

    #[error("brands validation failed: {0}")]
    Validation(String),
}
