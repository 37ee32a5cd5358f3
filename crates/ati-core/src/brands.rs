use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Display metadata for one tracked brand handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandEntry {
    /// Handle exactly as it appears in the feature files.
    pub handle: String,
    pub display_name: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BrandsFile {
    pub brands: Vec<BrandEntry>,
}

/// Lookup from brand handle to human-readable name.
///
/// Handles missing from the directory display as themselves.
#[derive(Debug, Clone, Default)]
pub struct BrandDirectory {
    names: HashMap<String, String>,
}

impl BrandDirectory {
    #[must_use]
    pub fn from_entries(entries: Vec<BrandEntry>) -> Self {
        let names = entries
            .into_iter()
            .map(|entry| (entry.handle.trim().to_string(), entry.display_name))
            .collect();
        Self { names }
    }

    #[must_use]
    pub fn display_name<'a>(&'a self, handle: &'a str) -> &'a str {
        self.names.get(handle).map_or(handle, String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Load and validate the brand directory from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_brand_directory(path: &Path) -> Result<BrandDirectory, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::BrandsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let brands_file: BrandsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::BrandsFileParse)?;

    validate_brands(&brands_file)?;

    Ok(BrandDirectory::from_entries(brands_file.brands))
}

fn validate_brands(brands_file: &BrandsFile) -> Result<(), ConfigError> {
    let mut seen_handles = HashSet::new();

    for brand in &brands_file.brands {
        let handle = brand.handle.trim();
        if handle.is_empty() {
            return Err(ConfigError::Validation(
                "brand handle must be non-empty".to_string(),
            ));
        }

        if brand.display_name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "brand '{handle}' has an empty display_name"
            )));
        }

        if !seen_handles.insert(handle.to_string()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand handle: '{handle}'"
            )));
        }
    }

    Ok(())
}
