//! Confidence intervals and quality scaling.

use rand::Rng;
use radx_features::FeatureVector;
use serde::{Deserialize, Serialize};

use crate::error::BandError;

/// Closed interval `[lo, hi]` from which a reported confidence is drawn
/// uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBand")]
pub struct ConfidenceBand {
    lo: f64,
    hi: f64,
}

#[derive(Deserialize)]
struct RawBand {
    lo: f64,
    hi: f64,
}

impl TryFrom<RawBand> for ConfidenceBand {
    type Error = BandError;

    fn try_from(raw: RawBand) -> Result<Self, Self::Error> {
        ConfidenceBand::new(raw.lo, raw.hi)
    }
}

impl ConfidenceBand {
    /// Hand-authored constant. Only used for literals already inside `(0, 1]`.
    pub(crate) const fn literal(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn new(lo: f64, hi: f64) -> Result<Self, BandError> {
        if lo > 0.0 && lo <= hi && hi <= 1.0 {
            Ok(Self { lo, hi })
        } else {
            Err(BandError { lo, hi })
        }
    }

    pub fn lo(&self) -> f64 {
        self.lo
    }

    pub fn hi(&self) -> f64 {
        self.hi
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lo && value <= self.hi
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        rng.gen_range(self.lo..=self.hi)
    }

    /// Multiply both endpoints by `factor`.
    pub fn scaled(&self, factor: f64) -> Result<Self, BandError> {
        Self::new(self.lo * factor, self.hi * factor)
    }
}

pub const POOR_QUALITY_FACTOR: f64 = 0.85;
pub const LOW_SHARPNESS_FACTOR: f64 = 0.90;
pub const HIGH_NOISE_FACTOR: f64 = 0.88;

/// Single scaling factor for an image; the first matching check wins.
pub fn quality_factor(features: &FeatureVector) -> f64 {
    if features.is_poor_quality() {
        POOR_QUALITY_FACTOR
    } else if features.sharpness < 0.5 {
        LOW_SHARPNESS_FACTOR
    } else if features.noise_level > 0.7 {
        HIGH_NOISE_FACTOR
    } else {
        1.0
    }
}
