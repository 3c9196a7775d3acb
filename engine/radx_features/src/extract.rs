//! Decode a radiograph and assemble its [`FeatureVector`].

use std::path::Path;

use image::{DynamicImage, GrayImage};
use log::{debug, warn};

use crate::error::FeatureError;
use crate::hints::{scan_path, HintTag};
use crate::measure;
use crate::vector::{FeatureVector, ImageQuality};

/// Extract features from an image file. Never fails: an unreadable file
/// yields [`FeatureVector::neutral`].
pub fn extract_path(path: &Path) -> FeatureVector {
    match try_extract_path(path) {
        Ok(features) => features,
        Err(e) => {
            warn!("feature extraction failed for {}: {e}", path.display());
            FeatureVector::neutral()
        }
    }
}

/// Fallible variant of [`extract_path`].
pub fn try_extract_path(path: &Path) -> Result<FeatureVector, FeatureError> {
    let img = image::open(path)?;
    extract_image(&img, scan_path(path))
}

pub fn extract_image(img: &DynamicImage, hints: Vec<HintTag>) -> Result<FeatureVector, FeatureError> {
    extract_gray(&img.to_luma8(), hints)
}

/// Measure a grayscale buffer.
///
/// Brightness and contrast are required; every other measurement falls back
/// to its neutral constant on its own when it fails.
pub fn extract_gray(gray: &GrayImage, hints: Vec<HintTag>) -> Result<FeatureVector, FeatureError> {
    let (brightness, contrast) = measure::intensity_stats(gray)?;
    let neutral = FeatureVector::neutral();

    let features = FeatureVector {
        brightness,
        contrast,
        sharpness: or_neutral("sharpness", measure::sharpness(gray), neutral.sharpness),
        noise_level: or_neutral("noise_level", measure::noise_level(gray), neutral.noise_level),
        quality: ImageQuality::assess(brightness, contrast),
        dark_ratio: or_neutral("dark_ratio", measure::dark_ratio(gray), neutral.dark_ratio),
        bright_patch_ratio: or_neutral(
            "bright_patch_ratio",
            measure::bright_patch_ratio(gray),
            neutral.bright_patch_ratio,
        ),
        bone_density: or_neutral("bone_density", measure::bone_density(gray), neutral.bone_density),
        abnormal_density: or_neutral(
            "abnormal_density",
            measure::edge_density(gray),
            neutral.abnormal_density,
        ),
        hints,
    };
    debug!(
        "features {}x{}: brightness={:.1} contrast={:.1} edges={:.3} hints={:?}",
        gray.width(),
        gray.height(),
        features.brightness,
        features.contrast,
        features.abnormal_density,
        features.hints
    );
    Ok(features)
}

fn or_neutral(name: &str, result: Result<f64, FeatureError>, fallback: f64) -> f64 {
    result.unwrap_or_else(|e| {
        warn!("{name} measurement failed ({e}); using {fallback}");
        fallback
    })
}
