//! Region model registry with an all-or-nothing degraded mode.

use std::collections::HashMap;

use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::condition::Region;
use crate::error::RegistryError;
use crate::profile::RegionProfile;

pub const DEFAULT_MODEL_VERSION: &str = "2.1.0";
pub const FALLBACK_MODEL_VERSION: &str = "1.0.0";
pub const FALLBACK_ACCURACY: f64 = 0.85;
/// Reported accuracy range for a nominal load.
pub const NOMINAL_ACCURACY: (f64, f64) = (0.89, 0.96);

/// Whether every region loaded, or the registry fell back as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryMode {
    Nominal,
    Degraded,
}

/// Introspection record for one region's model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelState {
    pub loaded: bool,
    pub version: String,
    pub accuracy: f64,
}

/// Loads the model backing a region.
pub trait ModelLoader {
    fn load(&self, region: Region) -> Result<(), RegistryError>;
}

/// The built-in loader: there are no weights to read, so every load succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedLoader;

impl ModelLoader for SimulatedLoader {
    fn load(&self, _region: Region) -> Result<(), RegistryError> {
        Ok(())
    }
}

/// Static per-region knowledge plus model state fixed at construction.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    profiles: Vec<RegionProfile>,
    states: HashMap<Region, ModelState>,
    mode: RegistryMode,
}

impl ModelRegistry {
    /// Load every region with `loader`. One failure degrades all regions.
    pub fn load<L, R>(loader: &L, version: &str, rng: &mut R) -> Self
    where
        L: ModelLoader + ?Sized,
        R: Rng + ?Sized,
    {
        let profiles = Region::ALL.iter().map(|&r| RegionProfile::standard(r)).collect();
        Self::with_profiles(profiles, loader, version, rng)
    }

    /// Load a registry over custom tables, in the given order. Regions with
    /// no table are unsupported.
    pub fn with_profiles<L, R>(profiles: Vec<RegionProfile>, loader: &L, version: &str, rng: &mut R) -> Self
    where
        L: ModelLoader + ?Sized,
        R: Rng + ?Sized,
    {
        let regions: Vec<Region> = profiles.iter().map(|p| p.region).collect();
        let loaded = regions.iter().try_for_each(|&r| loader.load(r));
        let (mode, states) = match loaded {
            Ok(()) => {
                let states = regions
                    .iter()
                    .map(|&r| {
                        let state = ModelState {
                            loaded: true,
                            version: version.to_string(),
                            accuracy: rng.gen_range(NOMINAL_ACCURACY.0..=NOMINAL_ACCURACY.1),
                        };
                        (r, state)
                    })
                    .collect();
                info!("loaded {} region models (version {version})", regions.len());
                (RegistryMode::Nominal, states)
            }
            Err(e) => {
                warn!("model load failed ({e}); all regions fall back to {FALLBACK_MODEL_VERSION}");
                (RegistryMode::Degraded, Self::fallback_states(&regions))
            }
        };

        Self {
            profiles,
            states,
            mode,
        }
    }

    fn fallback_states(regions: &[Region]) -> HashMap<Region, ModelState> {
        regions
            .iter()
            .map(|&r| {
                let state = ModelState {
                    loaded: false,
                    version: FALLBACK_MODEL_VERSION.to_string(),
                    accuracy: FALLBACK_ACCURACY,
                };
                (r, state)
            })
            .collect()
    }

    pub fn mode(&self) -> RegistryMode {
        self.mode
    }

    pub fn profile(&self, region: Region) -> Result<&RegionProfile, RegistryError> {
        self.profiles
            .iter()
            .find(|p| p.region == region)
            .ok_or(RegistryError::MissingProfile(region))
    }

    pub fn state(&self, region: Region) -> Option<&ModelState> {
        self.states.get(&region)
    }

    /// Model version recorded with predictions for `region`.
    pub fn version(&self, region: Region) -> &str {
        self.state(region)
            .map(|s| s.version.as_str())
            .unwrap_or(FALLBACK_MODEL_VERSION)
    }

    pub fn get_model_info(&self, region: &str) -> Option<ModelState> {
        Region::parse(region).and_then(|r| self.state(r).cloned())
    }

    /// Names of the regions with a table, in registry order.
    pub fn get_supported_regions(&self) -> Vec<&'static str> {
        self.profiles.iter().map(|p| p.region.as_str()).collect()
    }

    /// Condition labels for `region`, empty when the region is unsupported.
    pub fn get_possible_conditions(&self, region: &str) -> Vec<&'static str> {
        Region::parse(region)
            .and_then(|r| self.profile(r).ok())
            .map(RegionProfile::condition_names)
            .unwrap_or_default()
    }
}
