use anyhow::{bail, Context, Result};
use image::GrayImage;
use std::path::Path;

/// The reference pattern, compiled once for repeated correlation scoring.
/// Pixel values are stored zero-mean so the matcher's cross term reduces to
/// a single dot product per window.
pub struct ReferencePattern {
    width: u32,
    height: u32,
    zero_mean: Vec<f64>,
    norm_sq: f64,
}

impl ReferencePattern {
    /// Loads and compiles the pattern image. A missing or unreadable file is
    /// a fatal setup error; callers must not enter the detection loop on Err.
    pub fn load(path: &Path) -> Result<Self> {
        let img = image::open(path)
            .with_context(|| format!("Failed to load reference pattern from {}", path.display()))?;
        Self::from_image(img.to_luma8())
    }

    pub fn from_image(pixels: GrayImage) -> Result<Self> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            bail!("reference pattern is empty");
        }

        let count = (width as u64 * height as u64) as f64;
        let sum: f64 = pixels.pixels().map(|p| p.0[0] as f64).sum();
        let mean = sum / count;

        let zero_mean: Vec<f64> = pixels.pixels().map(|p| p.0[0] as f64 - mean).collect();
        let norm_sq = zero_mean.iter().map(|v| v * v).sum();

        Ok(Self {
            width,
            height,
            zero_mean,
            norm_sq,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major zero-mean pixel table.
    pub(crate) fn zero_mean(&self) -> &[f64] {
        &self.zero_mean
    }

    /// Squared L2 norm of the zero-mean table. Zero for a flat pattern.
    pub(crate) fn norm_sq(&self) -> f64 {
        self.norm_sq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn rejects_empty_raster() {
        assert!(ReferencePattern::from_image(GrayImage::new(0, 0)).is_err());
        assert!(ReferencePattern::from_image(GrayImage::new(4, 0)).is_err());
    }

    #[test]
    fn zero_mean_table_sums_to_zero() {
        let pixels = GrayImage::from_fn(8, 6, |x, y| Luma([((x * 31 + y * 17) % 255) as u8]));
        let pattern = ReferencePattern::from_image(pixels).unwrap();

        let residual: f64 = pattern.zero_mean().iter().sum();
        assert!(residual.abs() < 1e-6);
        assert!(pattern.norm_sq() > 0.0);
    }

    #[test]
    fn flat_pattern_has_zero_norm() {
        let pixels = GrayImage::from_pixel(5, 5, Luma([128]));
        let pattern = ReferencePattern::from_image(pixels).unwrap();
        assert!(pattern.norm_sq().abs() < 1e-9);
    }
}
