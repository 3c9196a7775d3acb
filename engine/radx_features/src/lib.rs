//! Radiograph feature extraction
//!
//! Turns a decoded radiograph into a fixed [`FeatureVector`]: intensity
//! statistics, Laplacian sharpness, blur-residual noise, intensity band
//! ratios, Canny edge density and condition hints parsed from the file name.

pub mod error;
pub mod extract;
pub mod hints;
pub mod measure;
pub mod vector;

pub use error::FeatureError;
pub use extract::{extract_gray, extract_image, extract_path, try_extract_path};
pub use hints::{scan_file_name, scan_path, HintTag};
pub use vector::{FeatureVector, ImageQuality};
