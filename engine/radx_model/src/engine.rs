//! Top-level inference entry point.

use std::path::Path;

use log::{debug, warn};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use radx_features::{extract_path, FeatureVector};
use serde::Serialize;

use crate::cascade::{uniform_guess, Classifier};
use crate::condition::{Condition, Region};
use crate::config::EngineConfig;
use crate::diagnosis::{DecisionSource, Diagnosis};
use crate::error::EngineError;
use crate::hint::resolve_hints;
use crate::logger::{PredictionLogger, PredictionRecord};
use crate::patient::Patient;
use crate::registry::{ModelLoader, ModelRegistry, ModelState, SimulatedLoader};

/// Label reported for unsupported regions.
pub const UNKNOWN_LABEL: &str = "Unknown";
/// Confidence reported for unsupported regions.
pub const UNKNOWN_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    /// `None` is the "Unknown" sentinel.
    pub condition: Option<Condition>,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureVector>,
    pub source: DecisionSource,
}

impl PredictionResult {
    fn unsupported() -> Self {
        Self {
            condition: None,
            confidence: UNKNOWN_CONFIDENCE,
            features: None,
            source: DecisionSource::Unsupported,
        }
    }

    pub fn label(&self) -> &'static str {
        self.condition.map(|c| c.label()).unwrap_or(UNKNOWN_LABEL)
    }
}

/// Feature extraction, hint resolution, cascades and sampling behind one call.
///
/// The registry and classifier are fixed at construction; only the sampler
/// state changes afterwards, so `&Engine` can be shared across threads.
pub struct Engine {
    registry: ModelRegistry,
    classifier: Classifier,
    logger: PredictionLogger,
    rng: Mutex<StdRng>,
}

impl Engine {
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        Self::with_loader(config, &SimulatedLoader)
    }

    pub fn with_loader<L: ModelLoader + ?Sized>(config: &EngineConfig, loader: &L) -> Result<Self, EngineError> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let registry = ModelRegistry::load(loader, &config.model_version, &mut rng);
        let logger = match &config.prediction_log {
            Some(path) => PredictionLogger::with_file(path).map_err(EngineError::PredictionLog)?,
            None => PredictionLogger::facade_only(),
        };
        Ok(Self::from_parts(registry, Classifier::standard(), logger, rng))
    }

    pub fn from_parts(registry: ModelRegistry, classifier: Classifier, logger: PredictionLogger, rng: StdRng) -> Self {
        Self {
            registry,
            classifier,
            logger,
            rng: Mutex::new(rng),
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn get_supported_regions(&self) -> Vec<&'static str> {
        self.registry.get_supported_regions()
    }

    pub fn get_possible_conditions(&self, region: &str) -> Vec<&'static str> {
        self.registry.get_possible_conditions(region)
    }

    pub fn get_model_info(&self, region: &str) -> Option<ModelState> {
        self.registry.get_model_info(region)
    }

    /// Classify the radiograph at `image_path`. Never fails; see
    /// [`PredictionResult::source`] for which path produced the answer.
    pub fn predict(&self, image_path: &Path, region: &str, age: Option<u32>, gender: Option<&str>) -> PredictionResult {
        if Region::parse(region).is_none() {
            return PredictionResult::unsupported();
        }
        let features = extract_path(image_path);
        self.predict_features(image_path, features, region, &Patient::new(age, gender))
    }

    /// Classify an already-extracted feature vector. `image_path` is only
    /// recorded in the prediction log.
    pub fn predict_features(
        &self,
        image_path: &Path,
        features: FeatureVector,
        region: &str,
        patient: &Patient,
    ) -> PredictionResult {
        let Some(region) = Region::parse(region) else {
            return PredictionResult::unsupported();
        };
        match self.infer(&features, region, patient) {
            Ok((diagnosis, source)) => self.finish(image_path, region, diagnosis, source, features),
            Err(e) => {
                warn!("prediction failed for {}: {e}; using uniform fallback", image_path.display());
                self.fallback(region)
            }
        }
    }

    fn infer(
        &self,
        features: &FeatureVector,
        region: Region,
        patient: &Patient,
    ) -> Result<(Diagnosis, DecisionSource), EngineError> {
        let mut rng = self.rng.lock();
        if let Some(diagnosis) = resolve_hints(&features.hints, region, &mut *rng) {
            debug!("{region}: filename hint -> {}", diagnosis.condition);
            return Ok((diagnosis, DecisionSource::Hint));
        }
        let profile = self.registry.profile(region)?;
        self.classifier.classify(features, profile, patient, &mut *rng)
    }

    fn finish(
        &self,
        image_path: &Path,
        region: Region,
        diagnosis: Diagnosis,
        source: DecisionSource,
        features: FeatureVector,
    ) -> PredictionResult {
        let record = PredictionRecord::new(
            image_path,
            region,
            diagnosis.condition.label(),
            diagnosis.confidence,
            features.clone(),
            self.registry.version(region),
            source,
        );
        self.logger.record(&record);
        PredictionResult {
            condition: Some(diagnosis.condition),
            confidence: diagnosis.confidence,
            features: Some(features),
            source,
        }
    }

    fn fallback(&self, region: Region) -> PredictionResult {
        let guess = self
            .registry
            .profile(region)
            .map_err(EngineError::from)
            .and_then(|profile| uniform_guess(profile, &mut *self.rng.lock()));
        match guess {
            Ok(d) => PredictionResult {
                condition: Some(d.condition),
                confidence: d.confidence,
                features: None,
                source: DecisionSource::Fallback,
            },
            Err(e) => {
                warn!("uniform fallback for {region} failed: {e}");
                PredictionResult::unsupported()
            }
        }
    }

    /// Draw from the region's prior table after demographic and image-quality
    /// adjustment. Not used by [`Engine::predict`].
    pub fn sample_prior(
        &self,
        image_path: &Path,
        region: &str,
        age: Option<u32>,
        gender: Option<&str>,
    ) -> Result<PredictionResult, EngineError> {
        let Some(region) = Region::parse(region) else {
            return Ok(PredictionResult::unsupported());
        };
        let features = extract_path(image_path);
        let patient = Patient::new(age, gender);
        let profile = self
            .registry
            .profile(region)?
            .adjusted_for_demographics(&patient)
            .adjusted_for_quality(&features)?;
        let (condition, confidence) = profile.weighted_pick(&mut *self.rng.lock())?;
        let diagnosis = Diagnosis { condition, confidence };
        Ok(self.finish(image_path, region, diagnosis, DecisionSource::Prior, features))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("mode", &self.registry.mode())
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::ConfidenceBand;
    use crate::cascade::{Cascade, Rule};
    use crate::error::RegistryError;
    use crate::profile::RegionProfile;
    use crate::registry::RegistryMode;
    use radx_features::HintTag;

    fn engine(seed: u64) -> Engine {
        Engine::from_config(&EngineConfig::default().with_seed(seed)).unwrap()
    }

    fn vector(bright: f64, dark: f64, bone: f64, abnormal: f64) -> FeatureVector {
        FeatureVector {
            bright_patch_ratio: bright,
            dark_ratio: dark,
            bone_density: bone,
            abnormal_density: abnormal,
            ..FeatureVector::neutral()
        }
    }

    fn run(e: &Engine, f: FeatureVector, region: &str, age: Option<u32>) -> PredictionResult {
        e.predict_features(Path::new("upload.png"), f, region, &Patient::new(age, None))
    }

    #[test]
    fn chest_consolidation_scenario() {
        let e = engine(1);
        let r = run(&e, vector(0.20, 0.10, 0.6, 0.05), "chest", Some(45));
        assert_eq!(r.label(), "Pneumonia");
        assert!((0.82..=0.94).contains(&r.confidence));
        assert_eq!(r.source, DecisionSource::Cascade);
    }

    #[test]
    fn elderly_hand_fracture_scenario() {
        let e = engine(2);
        let r = run(&e, vector(0.0, 0.0, 0.6, 0.20), "hand", Some(70));
        assert_eq!(r.label(), "Fracture");
        assert!((0.85..=0.95).contains(&r.confidence));
    }

    #[test]
    fn normal_hint_overrides_pixels_in_every_region() {
        let e = engine(3);
        for region in e.get_supported_regions() {
            let f = vector(0.5, 0.6, 0.1, 0.3).with_hints(vec![HintTag::Normal, HintTag::Fracture]);
            let r = run(&e, f, region, Some(80));
            assert_eq!(r.label(), "Normal", "{region}");
            assert_eq!(r.source, DecisionSource::Hint);
            assert!((0.88..=0.96).contains(&r.confidence));
        }
    }

    #[test]
    fn arthritis_hint_can_leave_the_region_table() {
        let e = engine(4);
        let f = FeatureVector::neutral().with_hints(vec![HintTag::Arthritis]);
        let r = run(&e, f, "skull", None);
        assert_eq!(r.condition, Some(Condition::Arthritis));
        assert!(!e.get_possible_conditions("skull").contains(&r.label()));
    }

    #[test]
    fn unsupported_region_returns_sentinel() {
        let e = engine(5);
        let r = e.predict(Path::new("/does/not/matter.png"), "abdomen", Some(40), None);
        assert_eq!(r.label(), UNKNOWN_LABEL);
        assert_eq!(r.confidence, UNKNOWN_CONFIDENCE);
        assert_eq!(r.source, DecisionSource::Unsupported);
        assert!(r.features.is_none());
    }

    #[test]
    fn unreadable_image_is_classified_from_neutral_features() {
        let e = engine(6);
        // Neutral vector: bright 0.2 > 0.15, edges 0.1 <= 0.12.
        let r = e.predict(Path::new("/nonexistent/scan.png"), "chest", Some(40), None);
        assert_eq!(r.label(), "Pneumonia");
        assert_eq!(r.features, Some(FeatureVector::neutral()));
    }

    #[test]
    fn same_features_same_label_across_calls() {
        let e = engine(7);
        let f = vector(0.05, 0.42, 0.6, 0.03);
        let first = run(&e, f.clone(), "chest", Some(30));
        let mut confidences = vec![first.confidence];
        for _ in 0..20 {
            let r = run(&e, f.clone(), "chest", Some(30));
            assert_eq!(r.condition, first.condition);
            confidences.push(r.confidence);
        }
        confidences.dedup();
        assert!(confidences.len() > 1, "confidence should vary between calls");
    }

    #[test]
    fn region_without_rules_uses_demographics() {
        let mut rng = StdRng::seed_from_u64(8);
        let registry = ModelRegistry::load(&SimulatedLoader, "2.1.0", &mut rng);
        let classifier = Classifier::standard().with_cascade(Cascade::new(Region::Leg, vec![]));
        let e = Engine::from_parts(registry, classifier, PredictionLogger::facade_only(), rng);
        let r = run(&e, vector(0.0, 0.0, 0.6, 0.0), "leg", Some(70));
        assert_eq!(r.source, DecisionSource::Demographic);
        assert_eq!(r.label(), "Arthritis");
        assert!((0.70..=0.85).contains(&r.confidence));
    }

    #[test]
    fn classification_error_degrades_to_unlogged_uniform_guess() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("predictions.jsonl");
        let mut rng = StdRng::seed_from_u64(13);
        let registry = ModelRegistry::load(&SimulatedLoader, "2.1.0", &mut rng);
        let off_table = Rule::new(
            "always",
            |_: &FeatureVector, _: &Patient| true,
            Condition::Pneumonia,
            ConfidenceBand::new(0.90, 0.95).unwrap(),
        );
        let classifier = Classifier::standard().with_cascade(Cascade::new(Region::Hand, vec![off_table]));
        let logger = PredictionLogger::with_file(&log).unwrap();
        let e = Engine::from_parts(registry, classifier, logger, rng);

        let table = e.get_possible_conditions("hand");
        for _ in 0..30 {
            let r = run(&e, vector(0.0, 0.0, 0.6, 0.0), "hand", Some(45));
            assert_eq!(r.source, DecisionSource::Fallback);
            assert!(table.contains(&r.label()), "{} not a hand condition", r.label());
            assert!((0.65..=0.85).contains(&r.confidence));
            assert!(r.features.is_none());
        }
        assert_eq!(std::fs::read_to_string(&log).unwrap(), "");

        // Other regions keep their cascades.
        let r = run(&e, vector(0.2, 0.1, 0.6, 0.05), "chest", Some(45));
        assert_eq!(r.source, DecisionSource::Cascade);
        assert_eq!(std::fs::read_to_string(&log).unwrap().lines().count(), 1);
    }

    #[test]
    fn region_without_a_table_returns_sentinel() {
        let mut rng = StdRng::seed_from_u64(14);
        let registry = ModelRegistry::with_profiles(
            vec![RegionProfile::standard(Region::Chest)],
            &SimulatedLoader,
            "2.1.0",
            &mut rng,
        );
        let e = Engine::from_parts(registry, Classifier::standard(), PredictionLogger::facade_only(), rng);
        let r = run(&e, vector(0.0, 0.0, 0.6, 0.2), "hand", Some(45));
        assert_eq!(r.label(), UNKNOWN_LABEL);
        assert_eq!(r.source, DecisionSource::Unsupported);
        assert_eq!(e.get_supported_regions(), vec!["chest"]);
    }

    #[test]
    fn degraded_registry_still_predicts() {
        struct Broken;
        impl ModelLoader for Broken {
            fn load(&self, region: Region) -> Result<(), RegistryError> {
                Err(RegistryError::LoadFailed {
                    region,
                    reason: "corrupt".into(),
                })
            }
        }
        let e = Engine::with_loader(&EngineConfig::default().with_seed(9), &Broken).unwrap();
        assert_eq!(e.registry().mode(), RegistryMode::Degraded);
        let info = e.get_model_info("pelvis").unwrap();
        assert!(!info.loaded);
        let r = run(&e, vector(0.0, 0.0, 0.6, 0.13), "pelvis", None);
        assert_eq!(r.label(), "Fracture");
    }

    #[test]
    fn prior_sampling_stays_in_region_table() {
        let e = engine(10);
        for _ in 0..50 {
            let r = e
                .sample_prior(Path::new("/nonexistent/x.png"), "spine", Some(65), Some("female"))
                .unwrap();
            assert_eq!(r.source, DecisionSource::Prior);
            assert!(e.get_possible_conditions("spine").contains(&r.label()));
        }
        let r = e.sample_prior(Path::new("x.png"), "foot", None, None).unwrap();
        assert_eq!(r.label(), UNKNOWN_LABEL);
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }
}
