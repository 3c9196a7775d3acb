//! Radiograph triage model
//!
//! Region condition tables, filename-hint resolution, ordered threshold
//! cascades and calibrated confidence sampling, behind [`Engine::predict`].

pub mod band;
pub mod cascade;
pub mod condition;
pub mod config;
pub mod diagnosis;
pub mod engine;
pub mod error;
pub mod hint;
pub mod logger;
pub mod patient;
pub mod profile;
pub mod registry;

pub use band::ConfidenceBand;
pub use cascade::{Cascade, Classifier, Rule};
pub use condition::{Condition, Region, UnknownRegion};
pub use config::EngineConfig;
pub use diagnosis::{DecisionSource, Diagnosis};
pub use engine::{Engine, PredictionResult, UNKNOWN_CONFIDENCE, UNKNOWN_LABEL};
pub use error::{BandError, ConfigError, EngineError, RegistryError};
pub use logger::{PredictionLogger, PredictionRecord};
pub use patient::Patient;
pub use profile::{ConditionProfile, RegionProfile};
pub use registry::{ModelLoader, ModelRegistry, ModelState, RegistryMode, SimulatedLoader};

pub use radx_features::{FeatureVector, HintTag};
