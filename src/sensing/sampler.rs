use image::GrayImage;
use std::sync::Arc;

use crate::capture::{CaptureError, CaptureSource};
use crate::settings::RegionRect;

/// One monitored rectangle bound to the shared capture source. Every call
/// hits the source; rasters are never cached.
#[derive(Clone)]
pub struct RegionSampler {
    source: Arc<dyn CaptureSource>,
    rect: RegionRect,
}

impl RegionSampler {
    pub fn new(source: Arc<dyn CaptureSource>, rect: RegionRect) -> Self {
        Self { source, rect }
    }

    pub fn rect(&self) -> &RegionRect {
        &self.rect
    }

    /// Captures the region, enforcing the exact configured dimensions.
    pub fn sample(&self) -> Result<GrayImage, CaptureError> {
        let raster = self.source.capture_region(&self.rect)?;
        if raster.width() != self.rect.width || raster.height() != self.rect.height {
            return Err(CaptureError::SizeMismatch {
                want_w: self.rect.width,
                want_h: self.rect.height,
                got_w: raster.width(),
                got_h: raster.height(),
            });
        }
        Ok(raster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::StillCapture;
    use image::Luma;

    struct ShortRasterSource;

    impl CaptureSource for ShortRasterSource {
        fn capture_region(&self, _rect: &RegionRect) -> Result<GrayImage, CaptureError> {
            Ok(GrayImage::from_pixel(3, 3, Luma([0])))
        }
    }

    #[test]
    fn sample_returns_configured_dimensions() {
        let frame = GrayImage::from_fn(50, 50, |x, y| Luma([((x + y) % 255) as u8]));
        let source = Arc::new(StillCapture::new(frame));
        let rect = RegionRect {
            top: 5,
            left: 5,
            width: 20,
            height: 10,
        };

        let sampler = RegionSampler::new(source, rect);
        let raster = sampler.sample().unwrap();
        assert_eq!(raster.dimensions(), (20, 10));
    }

    #[test]
    fn sample_rejects_short_raster_from_backend() {
        let rect = RegionRect {
            top: 0,
            left: 0,
            width: 10,
            height: 10,
        };

        let sampler = RegionSampler::new(Arc::new(ShortRasterSource), rect);
        let err = sampler.sample().unwrap_err();
        assert!(matches!(err, CaptureError::SizeMismatch { .. }));
    }
}
