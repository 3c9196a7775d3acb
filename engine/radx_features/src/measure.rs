//! Individual grayscale measurements.
//!
//! Every function works on an 8-bit grayscale buffer and fails only when the
//! buffer is empty or the arithmetic degenerates. Callers decide which
//! constant to substitute on failure.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::edges::canny;
use imageproc::filter::{filter3x3, gaussian_blur_f32};

use crate::error::FeatureError;

type GrayF32 = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Divisor mapping Laplacian variance into `[0, 1]`.
pub const SHARPNESS_SCALE: f64 = 1000.0;
/// Divisor mapping the blur residual deviation into `[0, 1]`.
pub const NOISE_SCALE: f64 = 50.0;
/// Sigma equivalent to a 5x5 Gaussian kernel with automatic sigma.
pub const NOISE_BLUR_SIGMA: f32 = 1.1;

pub const DARK_THRESHOLD: u8 = 50;
pub const BRIGHT_THRESHOLD: u8 = 200;
pub const BONE_BAND: (u8, u8) = (100, 200);

pub const EDGE_LOW: f32 = 50.0;
pub const EDGE_HIGH: f32 = 150.0;

const LAPLACIAN: [f32; 9] = [0.0, 1.0, 0.0, 1.0, -4.0, 1.0, 0.0, 1.0, 0.0];

fn ensure_pixels(gray: &GrayImage) -> Result<usize, FeatureError> {
    let n = gray.as_raw().len();
    if n == 0 {
        Err(FeatureError::EmptyImage)
    } else {
        Ok(n)
    }
}

fn finite(name: &'static str, v: f64) -> Result<f64, FeatureError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(FeatureError::NonFinite(name))
    }
}

/// Population mean and standard deviation of a sample.
fn mean_std<I>(values: I) -> (f64, f64)
where
    I: Iterator<Item = f64> + Clone,
{
    let (sum, count) = values.clone().fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        return (f64::NAN, f64::NAN);
    }
    let mean = sum / count as f64;
    let var = values.map(|v| (v - mean) * (v - mean)).sum::<f64>() / count as f64;
    (mean, var.sqrt())
}

fn to_f32(gray: &GrayImage) -> GrayF32 {
    ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([gray.get_pixel(x, y)[0] as f32])
    })
}

/// Mean intensity (brightness) and its standard deviation (contrast).
pub fn intensity_stats(gray: &GrayImage) -> Result<(f64, f64), FeatureError> {
    ensure_pixels(gray)?;
    let (mean, std) = mean_std(gray.as_raw().iter().map(|&v| v as f64));
    Ok((finite("brightness", mean)?, finite("contrast", std)?))
}

/// Variance of the 4-neighbour Laplacian response, scaled and clamped at 1.
pub fn sharpness(gray: &GrayImage) -> Result<f64, FeatureError> {
    ensure_pixels(gray)?;
    let response: GrayF32 = filter3x3(&to_f32(gray), &LAPLACIAN);
    let (_, std) = mean_std(response.as_raw().iter().map(|&v| v as f64));
    let var = finite("sharpness", std * std)?;
    Ok((var / SHARPNESS_SCALE).min(1.0))
}

/// Deviation of the image from its Gaussian-blurred self, scaled into `[0, 1]`.
pub fn noise_level(gray: &GrayImage) -> Result<f64, FeatureError> {
    ensure_pixels(gray)?;
    let original = to_f32(gray);
    let blurred = gaussian_blur_f32(&original, NOISE_BLUR_SIGMA);
    let residual = original
        .as_raw()
        .iter()
        .zip(blurred.as_raw().iter())
        .map(|(&a, &b)| (a - b) as f64);
    let (_, std) = mean_std(residual);
    let std = finite("noise_level", std)?;
    Ok((std / NOISE_SCALE).clamp(0.0, 1.0))
}

/// Fraction of pixels satisfying `pred`.
pub fn pixel_fraction<F>(gray: &GrayImage, pred: F) -> Result<f64, FeatureError>
where
    F: Fn(u8) -> bool,
{
    let total = ensure_pixels(gray)?;
    let hits = gray.as_raw().iter().filter(|&&v| pred(v)).count();
    Ok(hits as f64 / total as f64)
}

pub fn dark_ratio(gray: &GrayImage) -> Result<f64, FeatureError> {
    pixel_fraction(gray, |v| v < DARK_THRESHOLD)
}

pub fn bright_patch_ratio(gray: &GrayImage) -> Result<f64, FeatureError> {
    pixel_fraction(gray, |v| v > BRIGHT_THRESHOLD)
}

pub fn bone_density(gray: &GrayImage) -> Result<f64, FeatureError> {
    let (lo, hi) = BONE_BAND;
    pixel_fraction(gray, |v| v >= lo && v < hi)
}

/// Fraction of pixels marked as edges by a Canny detector.
pub fn edge_density(gray: &GrayImage) -> Result<f64, FeatureError> {
    ensure_pixels(gray)?;
    let edges = canny(gray, EDGE_LOW, EDGE_HIGH);
    pixel_fraction(&edges, |v| v > 0)
}
