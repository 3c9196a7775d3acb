//! Body regions and the diagnostic labels the engine can emit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Anatomical region with its own condition set and cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Chest,
    Hand,
    Leg,
    Skull,
    Spine,
    Pelvis,
}

impl Region {
    /// Every supported region, in registry order.
    pub const ALL: [Region; 6] = [
        Region::Chest,
        Region::Hand,
        Region::Leg,
        Region::Skull,
        Region::Spine,
        Region::Pelvis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Chest => "chest",
            Region::Hand => "hand",
            Region::Leg => "leg",
            Region::Skull => "skull",
            Region::Spine => "spine",
            Region::Pelvis => "pelvis",
        }
    }

    /// Exact lower-case lookup; anything else is unsupported.
    pub fn parse(s: &str) -> Option<Self> {
        Region::ALL.iter().copied().find(|r| r.as_str() == s)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRegion(pub String);

impl fmt::Display for UnknownRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported region: {}", self.0)
    }
}

impl std::error::Error for UnknownRegion {}

impl FromStr for Region {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::parse(s).ok_or_else(|| UnknownRegion(s.to_string()))
    }
}

/// A diagnostic label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "Normal")]
    Normal,
    #[serde(rename = "Pneumonia")]
    Pneumonia,
    #[serde(rename = "COVID-19")]
    Covid19,
    #[serde(rename = "Tuberculosis")]
    Tuberculosis,
    #[serde(rename = "Lung Cancer")]
    LungCancer,
    #[serde(rename = "Pneumothorax")]
    Pneumothorax,
    #[serde(rename = "Fracture")]
    Fracture,
    #[serde(rename = "Arthritis")]
    Arthritis,
    #[serde(rename = "Dislocation")]
    Dislocation,
    #[serde(rename = "Bone Tumor")]
    BoneTumor,
    #[serde(rename = "Tumor")]
    Tumor,
    #[serde(rename = "Hemorrhage")]
    Hemorrhage,
    #[serde(rename = "Scoliosis")]
    Scoliosis,
    #[serde(rename = "Disc Herniation")]
    DiscHerniation,
    #[serde(rename = "Hip Dysplasia")]
    HipDysplasia,
}

impl Condition {
    pub fn label(&self) -> &'static str {
        match self {
            Condition::Normal => "Normal",
            Condition::Pneumonia => "Pneumonia",
            Condition::Covid19 => "COVID-19",
            Condition::Tuberculosis => "Tuberculosis",
            Condition::LungCancer => "Lung Cancer",
            Condition::Pneumothorax => "Pneumothorax",
            Condition::Fracture => "Fracture",
            Condition::Arthritis => "Arthritis",
            Condition::Dislocation => "Dislocation",
            Condition::BoneTumor => "Bone Tumor",
            Condition::Tumor => "Tumor",
            Condition::Hemorrhage => "Hemorrhage",
            Condition::Scoliosis => "Scoliosis",
            Condition::DiscHerniation => "Disc Herniation",
            Condition::HipDysplasia => "Hip Dysplasia",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
