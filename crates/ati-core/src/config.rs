use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value == 0 {
            return Err(invalid(var, "must be greater than zero".to_string()));
        }
        Ok(value)
    };

    let parse_positive_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid(var, format!("must be a positive number, got {value}")));
        }
        Ok(value)
    };

    let posts_sources = split_paths(&require("ATI_POSTS_SOURCES")?);
    if posts_sources.is_empty() {
        return Err(invalid(
            "ATI_POSTS_SOURCES",
            "at least one path is required".to_string(),
        ));
    }
    let train_posts_sources = lookup("ATI_TRAIN_POSTS_SOURCES")
        .map(|raw| split_paths(&raw))
        .unwrap_or_default();
    let brand_names_path = lookup("ATI_BRAND_NAMES_PATH")
        .ok()
        .filter(|raw| !raw.trim().is_empty())
        .map(PathBuf::from);

    let env = parse_environment(&or_default("ATI_ENV", "development"))?;
    let bind_addr = parse_addr("ATI_BIND_ADDR", "0.0.0.0:8787")?;
    let log_level = or_default("ATI_LOG_LEVEL", "info");

    let oracle_url = lookup("ATI_ORACLE_URL")
        .ok()
        .filter(|raw| !raw.trim().is_empty());
    let oracle_timeout_secs = parse_u64("ATI_ORACLE_TIMEOUT_SECS", "30")?;

    let similarity_sigma = parse_positive_f64("ATI_SIMILARITY_SIGMA", "0.18")?;
    let high_risk_z = parse_positive_f64("ATI_HIGH_RISK_Z", "1.0")?;
    let cluster_k = parse_positive_usize("ATI_CLUSTER_K", "4")?;
    let cluster_seed = match lookup("ATI_CLUSTER_SEED") {
        Ok(raw) => Some(
            raw.parse::<u64>()
                .map_err(|e| invalid("ATI_CLUSTER_SEED", e.to_string()))?,
        ),
        Err(_) => None,
    };
    let top_posts = parse_positive_usize("ATI_TOP_POSTS", "3")?;
    let trend_segments = parse_positive_usize("ATI_TREND_SEGMENTS", "6")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        posts_sources,
        train_posts_sources,
        brand_names_path,
        oracle_url,
        oracle_timeout_secs,
        similarity_sigma,
        high_risk_z,
        cluster_k,
        cluster_seed,
        top_posts,
        trend_segments,
    })
}

/// Split a comma-separated path list, dropping blank entries.
fn split_paths(raw: &str) -> Vec<std::path::PathBuf> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(std::path::PathBuf::from)
        .collect()
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "ATI_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
