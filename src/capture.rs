use anyhow::Context;
use image::{imageops, GrayImage};
use std::path::Path;
use thiserror::Error;

use crate::settings::RegionRect;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("region ({left},{top}) {width}x{height} falls outside the capture surface")]
    OutOfBounds {
        top: u32,
        left: u32,
        width: u32,
        height: u32,
    },
    #[error("captured raster was {got_w}x{got_h}, expected {want_w}x{want_h}")]
    SizeMismatch {
        want_w: u32,
        want_h: u32,
        got_w: u32,
        got_h: u32,
    },
    #[error("capture backend error: {0}")]
    Backend(String),
}

/// Produces a grayscale raster for one rectangle of the capture surface,
/// refreshed at call time. The platform screen-grab backend lives outside
/// this crate and plugs in here; `StillCapture` below serves a loaded image
/// for development and tests.
pub trait CaptureSource: Send + Sync {
    fn capture_region(&self, rect: &RegionRect) -> Result<GrayImage, CaptureError>;
}

/// Capture source backed by a single still frame.
pub struct StillCapture {
    frame: GrayImage,
}

impl StillCapture {
    pub fn new(frame: GrayImage) -> Self {
        Self { frame }
    }

    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let frame = image::open(path)
            .with_context(|| format!("Failed to load capture frame from {}", path.display()))?
            .to_luma8();
        Ok(Self::new(frame))
    }
}

impl CaptureSource for StillCapture {
    fn capture_region(&self, rect: &RegionRect) -> Result<GrayImage, CaptureError> {
        let fits = rect
            .left
            .checked_add(rect.width)
            .is_some_and(|right| right <= self.frame.width())
            && rect
                .top
                .checked_add(rect.height)
                .is_some_and(|bottom| bottom <= self.frame.height());

        if !fits {
            return Err(CaptureError::OutOfBounds {
                top: rect.top,
                left: rect.left,
                width: rect.width,
                height: rect.height,
            });
        }

        Ok(imageops::crop_imm(&self.frame, rect.left, rect.top, rect.width, rect.height).to_image())
    }
}
