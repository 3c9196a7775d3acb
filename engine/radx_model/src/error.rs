use std::path::PathBuf;

use radx_features::FeatureError;
use thiserror::Error;

use crate::condition::{Condition, Region};

/// A confidence interval that cannot be sampled from.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("confidence band [{lo}, {hi}] must satisfy 0 < lo <= hi <= 1")]
pub struct BandError {
    pub lo: f64,
    pub hi: f64,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("model load failed for {region}: {reason}")]
    LoadFailed { region: Region, reason: String },
    #[error("no profile registered for region {0}")]
    MissingProfile(Region),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Internal failures absorbed by [`crate::Engine::predict`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Band(#[from] BandError),
    #[error(transparent)]
    Features(#[from] FeatureError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("region {0} defines no conditions")]
    NoConditions(Region),
    #[error("{condition} is not in the {region} condition table")]
    UndefinedCondition { region: Region, condition: Condition },
    #[error("cannot open prediction log: {0}")]
    PredictionLog(#[source] std::io::Error),
    #[error("prior weighting failed: {0}")]
    Weighting(#[from] rand::distributions::WeightedError),
}
