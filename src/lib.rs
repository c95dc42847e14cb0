pub mod capture;
pub mod metrics;
pub mod sensing;
pub mod settings;
pub mod timer;

pub use capture::{CaptureError, CaptureSource, StillCapture};
pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use sensing::{DetectionController, DetectionLoop, ReferencePattern, RegionSampler};
pub use settings::{AnchorPoint, RegionRect, WatchSettings};
pub use timer::{RegionSnapshot, RegionState, StateStore, Transition};

use anyhow::{Context, Result};
use log::info;
use sensing::DebugDump;
use std::sync::Arc;

/// Running watcher: read access for the renderer, metrics, and shutdown.
pub struct WatchHandle {
    store: StateStore,
    metrics: MetricsCollector,
    controller: DetectionController,
}

impl WatchHandle {
    /// Cloneable store handle for a renderer running on its own schedule.
    pub fn store(&self) -> StateStore {
        self.store.clone()
    }

    /// Renderer query for region `index`: truncated whole seconds while the
    /// counter is live, empty string at rest.
    pub fn display_text(&self, index: usize) -> String {
        self.store.display_text(index)
    }

    pub fn snapshot(&self) -> Vec<RegionSnapshot> {
        self.store.snapshot()
    }

    pub async fn metrics(&self) -> MetricsSnapshot {
        self.metrics.get_snapshot().await
    }

    /// Cancels the detection loop and waits for it to finish.
    pub async fn shutdown(mut self) -> Result<()> {
        self.controller.stop().await
    }
}

/// Validates the settings, loads the reference pattern, and spawns the
/// detection loop. Must be called within a tokio runtime. A pattern that
/// cannot be loaded is a fatal setup error: nothing is spawned and the
/// process should exit after reporting.
pub fn start(settings: WatchSettings, source: Arc<dyn CaptureSource>) -> Result<WatchHandle> {
    settings.validate().context("invalid watch settings")?;

    let pattern = ReferencePattern::load(&settings.pattern_path)?;
    info!(
        "loaded reference pattern {} ({}x{})",
        settings.pattern_path.display(),
        pattern.width(),
        pattern.height()
    );

    let samplers: Vec<RegionSampler> = settings
        .regions
        .iter()
        .map(|rect| RegionSampler::new(Arc::clone(&source), *rect))
        .collect();

    let store = StateStore::new(settings.regions.len(), settings.cap_ms());
    let metrics = MetricsCollector::new();
    let dump = settings.debug_dump_dir.clone().map(DebugDump::new);

    let loop_worker = DetectionLoop::new(
        samplers,
        Arc::new(pattern),
        settings.match_threshold,
        store.clone(),
        metrics.clone(),
        dump,
    );

    let mut controller = DetectionController::new();
    controller.start(loop_worker)?;
    info!("watching {} regions", settings.regions.len());

    Ok(WatchHandle {
        store,
        metrics,
        controller,
    })
}
