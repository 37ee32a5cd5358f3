use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Content submitted for scoring. At least one field should be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

impl ContentRequest {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let blank = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
        blank(&self.text) && blank(&self.image_base64)
    }
}

/// Oracle output: combined ATI plus per-modality novelty and diversity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleScore {
    pub ati: f64,
    #[serde(default)]
    pub novelty: BTreeMap<String, f64>,
    #[serde(default)]
    pub diversity: BTreeMap<String, f64>,
}
