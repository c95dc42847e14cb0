use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegionRect {
    pub top: u32,
    pub left: u32,
    pub width: u32,
    pub height: u32,
}

/// Screen position where the external renderer places a region's counter.
/// Nothing in this crate draws; the anchors ride along in the settings so
/// renderer and watcher share one config file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnchorPoint {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSettings {
    pub regions: Vec<RegionRect>,
    pub display_anchors: Vec<AnchorPoint>,
    pub max_seconds: u64,
    pub match_threshold: f32,
    pub pattern_path: PathBuf,
    /// When set, the detection loop writes annotated frames here each sweep.
    /// Leave unset in production; the dump is for headless threshold tuning.
    pub debug_dump_dir: Option<PathBuf>,
}

impl Default for WatchSettings {
    fn default() -> Self {
        let regions = (0..4)
            .map(|row| RegionRect {
                top: 600 + row * 100,
                left: 200,
                width: 100,
                height: 100,
            })
            .collect();

        let display_anchors = (0..4)
            .map(|row| AnchorPoint {
                x: 270,
                y: 600 + row * 100,
            })
            .collect();

        Self {
            regions,
            display_anchors,
            max_seconds: 91,
            match_threshold: 0.85,
            pattern_path: PathBuf::from("img/hook.webp"),
            debug_dump_dir: None,
        }
    }
}

impl WatchSettings {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let settings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.regions.is_empty() {
            bail!("at least one region must be configured");
        }
        if self.display_anchors.len() != self.regions.len() {
            bail!(
                "{} display anchors configured for {} regions",
                self.display_anchors.len(),
                self.regions.len()
            );
        }
        for (index, rect) in self.regions.iter().enumerate() {
            if rect.width == 0 || rect.height == 0 {
                bail!("region {index} has a zero-sized rectangle");
            }
        }
        if self.max_seconds == 0 {
            bail!("max_seconds must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.match_threshold) {
            bail!(
                "match_threshold {} is outside [0, 1]",
                self.match_threshold
            );
        }
        Ok(())
    }

    pub fn cap_ms(&self) -> u64 {
        self.max_seconds.saturating_mul(1000)
    }
}
