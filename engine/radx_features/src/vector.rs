//! The fixed feature vector produced for every inference call.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hints::HintTag;

/// Coarse acquisition quality derived from contrast and brightness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageQuality {
    Good,
    Poor,
}

impl ImageQuality {
    /// Quality is poor when contrast `<= 30` or brightness `<= 50`.
    pub fn assess(brightness: f64, contrast: f64) -> Self {
        if contrast > 30.0 && brightness > 50.0 {
            ImageQuality::Good
        } else {
            ImageQuality::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageQuality::Good => "good",
            ImageQuality::Poor => "poor",
        }
    }
}

impl fmt::Display for ImageQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image-derived measurements for a single radiograph.
///
/// Ratios are fractions of the total pixel count. The vector is built once
/// per call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Mean grayscale intensity, 0..=255.
    pub brightness: f64,
    /// Grayscale standard deviation.
    pub contrast: f64,
    /// Laplacian variance scaled into 0..=1.
    pub sharpness: f64,
    /// High-frequency residual scaled into 0..=1.
    pub noise_level: f64,
    pub quality: ImageQuality,
    /// Pixels below intensity 50.
    pub dark_ratio: f64,
    /// Pixels above intensity 200.
    pub bright_patch_ratio: f64,
    /// Pixels in the intensity band `[100, 200)`.
    pub bone_density: f64,
    /// Edge-pixel fraction from a dual-threshold edge detector.
    pub abnormal_density: f64,
    /// Condition keywords found in the file name, in table order.
    pub hints: Vec<HintTag>,
}

impl FeatureVector {
    /// The vector substituted when an image cannot be decoded or measured.
    pub fn neutral() -> Self {
        Self {
            brightness: 128.0,
            contrast: 50.0,
            sharpness: 0.7,
            noise_level: 0.3,
            quality: ImageQuality::Good,
            dark_ratio: 0.3,
            bright_patch_ratio: 0.2,
            bone_density: 0.6,
            abnormal_density: 0.1,
            hints: Vec::new(),
        }
    }

    pub fn with_hints(mut self, hints: Vec<HintTag>) -> Self {
        self.hints = hints;
        self
    }

    pub fn is_poor_quality(&self) -> bool {
        self.quality == ImageQuality::Poor
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::neutral()
    }
}
