//! Engine configuration, read from TOML.
//!
//! ```toml
//! seed = 42
//! model_version = "2.1.0"
//! prediction_log = "var/predictions.jsonl"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::registry::DEFAULT_MODEL_VERSION;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Seed for the confidence sampler. Absent means seeded from entropy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    #[serde(default = "default_model_version")]
    pub model_version: String,

    /// JSON-lines file receiving one record per prediction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction_log: Option<PathBuf>,
}

fn default_model_version() -> String {
    DEFAULT_MODEL_VERSION.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            model_version: default_model_version(),
            prediction_log: None,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_prediction_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.prediction_log = Some(path.into());
        self
    }
}
