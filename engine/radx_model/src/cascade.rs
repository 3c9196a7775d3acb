//! Ordered threshold cascades, one per region.
//!
//! A cascade is a list of rules evaluated top to bottom; the first rule whose
//! predicate holds decides the label. Rule order is significant: several
//! predicates overlap (leg's bone-density bands nest, for instance).

use std::collections::HashMap;

use log::debug;
use rand::Rng;
use radx_features::FeatureVector;

use crate::band::ConfidenceBand;
use crate::condition::{Condition, Region};
use crate::diagnosis::{DecisionSource, Diagnosis};
use crate::error::EngineError;
use crate::patient::Patient;
use crate::profile::RegionProfile;

pub type Predicate = fn(&FeatureVector, &Patient) -> bool;

#[derive(Debug, Clone)]
pub struct Rule {
    /// Human-readable predicate, for logs.
    pub when: &'static str,
    test: Predicate,
    pub condition: Condition,
    pub band: ConfidenceBand,
}

impl Rule {
    pub fn new(when: &'static str, test: Predicate, condition: Condition, band: ConfidenceBand) -> Self {
        Self {
            when,
            test,
            condition,
            band,
        }
    }

    pub fn matches(&self, features: &FeatureVector, patient: &Patient) -> bool {
        (self.test)(features, patient)
    }
}

macro_rules! rules {
    ($($when:literal, |$f:pat_param, $p:pat_param| $test:expr => $cond:ident [$lo:expr, $hi:expr]);+ $(;)?) => {
        vec![$(Rule::new(
            $when,
            |$f: &FeatureVector, $p: &Patient| $test,
            Condition::$cond,
            ConfidenceBand::literal($lo, $hi),
        )),+]
    };
}

#[derive(Debug, Clone)]
pub struct Cascade {
    pub region: Region,
    rules: Vec<Rule>,
}

impl Cascade {
    pub fn new(region: Region, rules: Vec<Rule>) -> Self {
        Self { region, rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// First matching rule, if any.
    pub fn evaluate(&self, features: &FeatureVector, patient: &Patient) -> Option<&Rule> {
        self.rules.iter().find(|r| r.matches(features, patient))
    }

    pub fn standard(region: Region) -> Self {
        let rules = match region {
            Region::Chest => rules! {
                "bright_patch > 0.15 && abnormal > 0.12",
                    |f, _| f.bright_patch_ratio > 0.15 && f.abnormal_density > 0.12 => Covid19 [0.78, 0.91];
                "bright_patch > 0.15", |f, _| f.bright_patch_ratio > 0.15 => Pneumonia [0.82, 0.94];
                "dark > 0.4 && age > 50", |f, p| f.dark_ratio > 0.4 && p.older_than(50) => LungCancer [0.70, 0.85];
                "dark > 0.4", |f, _| f.dark_ratio > 0.4 => Tuberculosis [0.73, 0.87];
                "abnormal > 0.08", |f, _| f.abnormal_density > 0.08 => Pneumothorax [0.68, 0.82];
                "otherwise", |_, _| true => Normal [0.85, 0.95];
            },
            Region::Hand => rules! {
                "abnormal > 0.15", |f, _| f.abnormal_density > 0.15 => Fracture [0.85, 0.95];
                "bone < 0.5 && age > 40", |f, p| f.bone_density < 0.5 && p.older_than(40) => Arthritis [0.75, 0.89];
                "abnormal > 0.08", |f, _| f.abnormal_density > 0.08 => Dislocation [0.70, 0.85];
                "otherwise", |_, _| true => Normal [0.88, 0.96];
            },
            Region::Leg => rules! {
                "abnormal > 0.12", |f, _| f.abnormal_density > 0.12 => Fracture [0.82, 0.93];
                "bone < 0.3", |f, _| f.bone_density < 0.3 => BoneTumor [0.68, 0.82];
                "bone < 0.45", |f, _| f.bone_density < 0.45 => Arthritis [0.72, 0.86];
                "otherwise", |_, _| true => Normal [0.86, 0.94];
            },
            Region::Skull => rules! {
                "abnormal > 0.15", |f, _| f.abnormal_density > 0.15 => Fracture [0.78, 0.90];
                "dark > 0.5", |f, _| f.dark_ratio > 0.5 => Hemorrhage [0.72, 0.88];
                "dark > 0.35", |f, _| f.dark_ratio > 0.35 => Tumor [0.70, 0.85];
                "otherwise", |_, _| true => Normal [0.87, 0.95];
            },
            Region::Spine => rules! {
                "abnormal > 0.13", |f, _| f.abnormal_density > 0.13 => Fracture [0.80, 0.91];
                "abnormal > 0.08 && bone < 0.5",
                    |f, _| f.abnormal_density > 0.08 && f.bone_density < 0.5 => DiscHerniation [0.70, 0.85];
                "abnormal > 0.06", |f, _| f.abnormal_density > 0.06 => Scoliosis [0.75, 0.88];
                "otherwise", |_, _| true => Normal [0.85, 0.93];
            },
            Region::Pelvis => rules! {
                "abnormal > 0.12", |f, _| f.abnormal_density > 0.12 => Fracture [0.81, 0.92];
                "bone < 0.45", |f, _| f.bone_density < 0.45 => Arthritis [0.71, 0.85];
                "abnormal > 0.07", |f, _| f.abnormal_density > 0.07 => HipDysplasia [0.73, 0.87];
                "otherwise", |_, _| true => Normal [0.86, 0.94];
            },
        };
        Self::new(region, rules)
    }
}

/// Cascades keyed by region; regions without one use the demographic fallback.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    cascades: HashMap<Region, Cascade>,
}

impl Classifier {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        Region::ALL
            .iter()
            .fold(Self::empty(), |c, &r| c.with_cascade(Cascade::standard(r)))
    }

    pub fn with_cascade(mut self, cascade: Cascade) -> Self {
        self.cascades.insert(cascade.region, cascade);
        self
    }

    pub fn without_cascade(mut self, region: Region) -> Self {
        self.cascades.remove(&region);
        self
    }

    pub fn cascade(&self, region: Region) -> Option<&Cascade> {
        self.cascades.get(&region)
    }

    /// Label chosen for these inputs, without sampling a confidence.
    pub fn decide(&self, features: &FeatureVector, region: Region, patient: &Patient) -> Option<&Rule> {
        self.cascade(region).and_then(|c| c.evaluate(features, patient))
    }

    /// Decide and sample a diagnosis. The label must belong to `profile`.
    pub fn classify<R: Rng + ?Sized>(
        &self,
        features: &FeatureVector,
        profile: &RegionProfile,
        patient: &Patient,
        rng: &mut R,
    ) -> Result<(Diagnosis, DecisionSource), EngineError> {
        let (diagnosis, source) = match self.decide(features, profile.region, patient) {
            Some(rule) => {
                debug!("{} cascade: `{}` -> {}", profile.region, rule.when, rule.condition);
                let diagnosis = Diagnosis {
                    condition: rule.condition,
                    confidence: rule.band.sample(rng),
                };
                (diagnosis, DecisionSource::Cascade)
            }
            None => {
                debug!("{}: no cascade rule applied, using demographic fallback", profile.region);
                (demographic_fallback(profile, patient, rng)?, DecisionSource::Demographic)
            }
        };
        if !profile.defines(diagnosis.condition) {
            return Err(EngineError::UndefinedCondition {
                region: profile.region,
                condition: diagnosis.condition,
            });
        }
        Ok((diagnosis, source))
    }
}

const ELDERLY_ARTHRITIS: ConfidenceBand = ConfidenceBand::literal(0.70, 0.85);
const ELDERLY_FRACTURE: ConfidenceBand = ConfidenceBand::literal(0.75, 0.88);
const YOUNG_NORMAL: ConfidenceBand = ConfidenceBand::literal(0.85, 0.95);
pub(crate) const UNIFORM_GUESS: ConfidenceBand = ConfidenceBand::literal(0.65, 0.85);

/// Age-driven default when no cascade rule decides.
pub fn demographic_fallback<R: Rng + ?Sized>(
    profile: &RegionProfile,
    patient: &Patient,
    rng: &mut R,
) -> Result<Diagnosis, EngineError> {
    let fixed = if patient.older_than(60) && profile.defines(Condition::Arthritis) {
        Some((Condition::Arthritis, ELDERLY_ARTHRITIS))
    } else if patient.older_than(60) && profile.defines(Condition::Fracture) {
        Some((Condition::Fracture, ELDERLY_FRACTURE))
    } else if patient.younger_than(30) {
        Some((Condition::Normal, YOUNG_NORMAL))
    } else {
        None
    };

    match fixed {
        Some((condition, band)) => Ok(Diagnosis {
            condition,
            confidence: band.sample(rng),
        }),
        None => uniform_guess(profile, rng),
    }
}

/// Uniform label over the region's table with a low-confidence band.
pub fn uniform_guess<R: Rng + ?Sized>(profile: &RegionProfile, rng: &mut R) -> Result<Diagnosis, EngineError> {
    let condition = profile.uniform_pick(rng)?;
    Ok(Diagnosis {
        condition,
        confidence: UNIFORM_GUESS.sample(rng),
    })
}
