//! Filename hints that short-circuit the cascade.

use rand::Rng;
use radx_features::HintTag;

use crate::band::ConfidenceBand;
use crate::diagnosis::Diagnosis;
use crate::condition::{Condition, Region};

/// The label and band a single hint maps to in `region`, if it applies there.
///
/// Fracture and arthritis hints apply to every region, including regions
/// whose table lists neither condition.
pub fn hint_match(tag: HintTag, region: Region) -> Option<(Condition, ConfidenceBand)> {
    let chest_only = |cond: Condition, lo: f64, hi: f64| {
        (region == Region::Chest).then(|| (cond, ConfidenceBand::literal(lo, hi)))
    };
    match tag {
        HintTag::Normal => Some((Condition::Normal, ConfidenceBand::literal(0.88, 0.96))),
        HintTag::Pneumonia => chest_only(Condition::Pneumonia, 0.82, 0.94),
        HintTag::Covid => chest_only(Condition::Covid19, 0.78, 0.91),
        HintTag::Tuberculosis => chest_only(Condition::Tuberculosis, 0.73, 0.87),
        HintTag::Fracture => Some((Condition::Fracture, ConfidenceBand::literal(0.85, 0.95))),
        HintTag::Arthritis => Some((Condition::Arthritis, ConfidenceBand::literal(0.75, 0.89))),
        HintTag::Tumor => match region {
            Region::Chest => Some((Condition::LungCancer, ConfidenceBand::literal(0.70, 0.85))),
            Region::Skull => Some((Condition::Tumor, ConfidenceBand::literal(0.72, 0.86))),
            Region::Leg => Some((Condition::BoneTumor, ConfidenceBand::literal(0.68, 0.83))),
            _ => None,
        },
    }
}

/// First hint, in extraction order, that applies to `region`.
pub fn resolve_label(hints: &[HintTag], region: Region) -> Option<(Condition, ConfidenceBand)> {
    hints.iter().find_map(|&tag| hint_match(tag, region))
}

pub fn resolve_hints<R: Rng + ?Sized>(hints: &[HintTag], region: Region, rng: &mut R) -> Option<Diagnosis> {
    resolve_label(hints, region).map(|(condition, band)| Diagnosis {
        condition,
        confidence: band.sample(rng),
    })
}
