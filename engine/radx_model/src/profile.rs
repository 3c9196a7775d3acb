//! Per-region condition tables: priors and calibrated confidence bands.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use radx_features::FeatureVector;
use serde::Serialize;

use crate::band::{quality_factor, ConfidenceBand};
use crate::condition::{Condition, Region};
use crate::error::EngineError;
use crate::patient::Patient;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionProfile {
    pub condition: Condition,
    pub prior: f64,
    pub band: ConfidenceBand,
}

/// Ordered condition table for one region. Priors sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionProfile {
    pub region: Region,
    conditions: Vec<ConditionProfile>,
}

macro_rules! table {
    ($($cond:ident => $prior:expr, [$lo:expr, $hi:expr]);+ $(;)?) => {
        vec![$(ConditionProfile {
            condition: Condition::$cond,
            prior: $prior,
            band: ConfidenceBand::literal($lo, $hi),
        }),+]
    };
}

fn standard_table(region: Region) -> Vec<ConditionProfile> {
    match region {
        Region::Chest => table! {
            Normal => 0.30, [0.85, 0.95];
            Pneumonia => 0.25, [0.75, 0.90];
            Covid19 => 0.15, [0.70, 0.85];
            Tuberculosis => 0.15, [0.72, 0.88];
            LungCancer => 0.10, [0.65, 0.82];
            Pneumothorax => 0.05, [0.68, 0.85];
        },
        Region::Hand => table! {
            Normal => 0.40, [0.88, 0.96];
            Fracture => 0.35, [0.80, 0.92];
            Arthritis => 0.15, [0.70, 0.85];
            Dislocation => 0.10, [0.75, 0.88];
        },
        Region::Leg => table! {
            Normal => 0.35, [0.86, 0.94];
            Fracture => 0.40, [0.82, 0.93];
            Arthritis => 0.15, [0.72, 0.86];
            BoneTumor => 0.10, [0.68, 0.82];
        },
        Region::Skull => table! {
            Normal => 0.45, [0.87, 0.95];
            Fracture => 0.30, [0.78, 0.90];
            Tumor => 0.15, [0.70, 0.85];
            Hemorrhage => 0.10, [0.72, 0.88];
        },
        Region::Spine => table! {
            Normal => 0.35, [0.85, 0.93];
            Fracture => 0.25, [0.80, 0.91];
            Scoliosis => 0.25, [0.75, 0.88];
            DiscHerniation => 0.15, [0.70, 0.85];
        },
        Region::Pelvis => table! {
            Normal => 0.40, [0.86, 0.94];
            Fracture => 0.35, [0.81, 0.92];
            HipDysplasia => 0.15, [0.73, 0.87];
            Arthritis => 0.10, [0.71, 0.85];
        },
    }
}

impl RegionProfile {
    pub fn standard(region: Region) -> Self {
        Self {
            region,
            conditions: standard_table(region),
        }
    }

    /// Build a custom table; priors are renormalized.
    pub fn from_conditions(region: Region, conditions: Vec<ConditionProfile>) -> Self {
        let mut profile = Self { region, conditions };
        profile.normalize();
        profile
    }

    pub fn conditions(&self) -> &[ConditionProfile] {
        &self.conditions
    }

    pub fn condition_names(&self) -> Vec<&'static str> {
        self.conditions.iter().map(|c| c.condition.label()).collect()
    }

    pub fn defines(&self, condition: Condition) -> bool {
        self.get(condition).is_some()
    }

    pub fn get(&self, condition: Condition) -> Option<&ConditionProfile> {
        self.conditions.iter().find(|c| c.condition == condition)
    }

    fn get_mut(&mut self, condition: Condition) -> Option<&mut ConditionProfile> {
        self.conditions.iter_mut().find(|c| c.condition == condition)
    }

    fn scale_prior(&mut self, condition: Condition, factor: f64) {
        if let Some(c) = self.get_mut(condition) {
            c.prior *= factor;
        }
    }

    fn normalize(&mut self) {
        let total: f64 = self.conditions.iter().map(|c| c.prior).sum();
        if total > 0.0 {
            for c in &mut self.conditions {
                c.prior /= total;
            }
        }
    }

    /// Shift priors for age and gender, then renormalize.
    pub fn adjusted_for_demographics(&self, patient: &Patient) -> Self {
        let mut adjusted = self.clone();
        if patient.older_than(60) {
            adjusted.scale_prior(Condition::Arthritis, 1.5);
            adjusted.scale_prior(Condition::Fracture, 1.3);
            adjusted.scale_prior(Condition::Normal, 0.8);
        } else if patient.younger_than(30) {
            adjusted.scale_prior(Condition::Normal, 1.2);
            adjusted.scale_prior(Condition::Arthritis, 0.5);
        }
        if patient.is_female() && self.region == Region::Spine {
            adjusted.scale_prior(Condition::Scoliosis, 1.2);
        }
        adjusted.normalize();
        adjusted
    }

    /// Scale every band by the image's quality factor.
    pub fn adjusted_for_quality(&self, features: &FeatureVector) -> Result<Self, EngineError> {
        let factor = quality_factor(features);
        let mut adjusted = self.clone();
        for c in &mut adjusted.conditions {
            c.band = c.band.scaled(factor)?;
        }
        Ok(adjusted)
    }

    /// Pick a condition with integer weights `floor(prior * 100)` and draw
    /// its confidence.
    pub fn weighted_pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<(Condition, f64), EngineError> {
        if self.conditions.is_empty() {
            return Err(EngineError::NoConditions(self.region));
        }
        let weights: Vec<u32> = self
            .conditions
            .iter()
            .map(|c| (c.prior * 100.0).floor() as u32)
            .collect();
        let index = WeightedIndex::new(&weights)?;
        let chosen = &self.conditions[index.sample(rng)];
        Ok((chosen.condition, chosen.band.sample(rng)))
    }

    /// Uniform choice over the table, ignoring priors.
    pub fn uniform_pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Condition, EngineError> {
        if self.conditions.is_empty() {
            return Err(EngineError::NoConditions(self.region));
        }
        let i = rng.gen_range(0..self.conditions.len());
        Ok(self.conditions[i].condition)
    }
}
