//! Synthetic radiograph fixtures for the system tests.
//!
//! Each film is drawn without noise so its feature vector is predictable:
//! flat fills produce edges only along shape boundaries, and every intensity
//! is chosen to sit clearly inside one of the extractor's bands.

use std::path::{Path, PathBuf};

use image::{GrayImage, Luma};

pub const FILM_SIZE: u32 = 256;

/// Dark background with two flat consolidation patches, one per lung field.
/// Bright fraction is close to `2 * pi / 36`.
pub fn consolidated_chest(size: u32) -> GrayImage {
    let r = size as f64 / 6.0;
    let centers = [(0.28 * size as f64, 0.5 * size as f64), (0.72 * size as f64, 0.5 * size as f64)];
    GrayImage::from_fn(size, size, |x, y| {
        let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
        let inside = centers
            .iter()
            .any(|&(cx, cy)| (px - cx).powi(2) + (py - cy).powi(2) <= r * r);
        Luma([if inside { 230 } else { 20 }])
    })
}

/// Vertical stripes with a one-pixel mid-grey ramp at every transition,
/// which places exactly one edge pixel per boundary. Edge density is about
/// one quarter of the film.
pub fn striped_film(size: u32) -> GrayImage {
    const PERIOD: [u8; 8] = [0, 0, 0, 128, 255, 255, 255, 128];
    GrayImage::from_fn(size, size, |x, _| Luma([PERIOD[(x % 8) as usize]]))
}

/// Mostly bone-band intensity with a soft-tissue margin.
pub fn dense_limb(size: u32) -> GrayImage {
    let margin = size / 10;
    GrayImage::from_fn(size, size, |x, y| {
        let inner = x >= margin && x < size - margin && y >= margin && y < size - margin;
        Luma([if inner { 150 } else { 70 }])
    })
}

/// A narrow bone shaft on soft tissue: bone fraction well under 0.3.
pub fn osteopenic_limb(size: u32) -> GrayImage {
    let (lo, hi) = (size * 2 / 5, size * 3 / 5);
    GrayImage::from_fn(size, size, |x, _| Luma([if x >= lo && x < hi { 150 } else { 70 }]))
}

/// Save `film` as a PNG named `name` under `dir`.
pub fn write_film(dir: &Path, name: &str, film: &GrayImage) -> PathBuf {
    let path = dir.join(name);
    film.save(&path).expect("fixture film saves");
    path
}

/// A file with an image extension that does not decode.
pub fn write_corrupt(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"\x89PNG truncated").expect("fixture file writes");
    path
}
