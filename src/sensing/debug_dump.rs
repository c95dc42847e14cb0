use anyhow::{Context, Result};
use image::{GrayImage, Rgb, RgbImage};
use log::warn;
use std::fs;
use std::path::PathBuf;

use crate::metrics::RegionSweepMetrics;

const BORDER_PX: u32 = 2;
const PRESENT_BORDER: Rgb<u8> = Rgb([220, 40, 40]);
const ABSENT_BORDER: Rgb<u8> = Rgb([40, 200, 80]);

/// Writes one annotated frame per region plus a `status.json` with the sweep
/// scores, overwritten every sweep. Used for headless threshold tuning; never
/// enabled alongside the production overlay. Everything here is best effort:
/// failures are logged and swallowed so the detection loop is unaffected.
pub struct DebugDump {
    dir: PathBuf,
}

impl DebugDump {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write_region(&self, index: usize, raster: &GrayImage, detected: bool) {
        if let Err(err) = self.try_write_region(index, raster, detected) {
            warn!("debug dump for region {index} failed: {err:#}");
        }
    }

    pub fn write_status(&self, regions: &[RegionSweepMetrics]) {
        if let Err(err) = self.try_write_status(regions) {
            warn!("debug dump status write failed: {err:#}");
        }
    }

    fn try_write_region(&self, index: usize, raster: &GrayImage, detected: bool) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create dump dir {}", self.dir.display()))?;

        let mut frame = colorize(raster);
        let border = if detected {
            PRESENT_BORDER
        } else {
            ABSENT_BORDER
        };
        draw_border(&mut frame, border);

        let path = self.dir.join(format!("region{index}.png"));
        frame
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    fn try_write_status(&self, regions: &[RegionSweepMetrics]) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create dump dir {}", self.dir.display()))?;

        let path = self.dir.join("status.json");
        let serialized = serde_json::to_string_pretty(regions)?;
        fs::write(&path, serialized)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

fn colorize(raster: &GrayImage) -> RgbImage {
    let mut frame = RgbImage::new(raster.width(), raster.height());
    for (x, y, pixel) in raster.enumerate_pixels() {
        let v = pixel.0[0];
        frame.put_pixel(x, y, Rgb([v, v, v]));
    }
    frame
}

fn draw_border(frame: &mut RgbImage, color: Rgb<u8>) {
    let (width, height) = frame.dimensions();
    for y in 0..height {
        for x in 0..width {
            let on_border = x < BORDER_PX
                || y < BORDER_PX
                || x >= width.saturating_sub(BORDER_PX)
                || y >= height.saturating_sub(BORDER_PX);
            if on_border {
                frame.put_pixel(x, y, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn temp_dir(suffix: &str) -> PathBuf {
        std::env::temp_dir().join(format!("regionwatch_dump_{}_{suffix}", std::process::id()))
    }

    #[test]
    fn region_frame_gets_state_colored_border() {
        let dir = temp_dir("region");
        let dump = DebugDump::new(dir.clone());
        let raster = GrayImage::from_pixel(20, 20, Luma([100]));

        dump.write_region(1, &raster, true);

        let written = image::open(dir.join("region1.png")).unwrap().to_rgb8();
        assert_eq!(written.dimensions(), (20, 20));
        assert_eq!(*written.get_pixel(0, 0), PRESENT_BORDER);
        assert_eq!(*written.get_pixel(10, 10), Rgb([100, 100, 100]));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn status_file_lists_every_region() {
        let dir = temp_dir("status");
        let dump = DebugDump::new(dir.clone());

        let regions: Vec<RegionSweepMetrics> = (0..3)
            .map(|region| RegionSweepMetrics {
                region,
                capture_ms: 2,
                match_ms: 3,
                score: 0.4,
                detected: false,
                capture_failed: false,
            })
            .collect();
        dump.write_status(&regions);

        let contents = fs::read_to_string(dir.join("status.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 3);

        fs::remove_dir_all(&dir).ok();
    }
}
