use chrono::Utc;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::metrics::{MetricsCollector, RegionSweepMetrics, SweepMetrics};
use crate::timer::{StateStore, Transition};

use super::debug_dump::DebugDump;
use super::matcher::match_score;
use super::pattern::ReferencePattern;
use super::sampler::RegionSampler;

const SWEEP_INTERVAL_SECS: u64 = 1;

/// Runs the sample -> match -> threshold -> state-machine pipeline for every
/// configured region, one full sweep per interval, until cancelled. A failed
/// capture or match for one region degrades to "pattern absent" for that
/// region and never stops the rest of the sweep.
pub struct DetectionLoop {
    samplers: Vec<RegionSampler>,
    pattern: Arc<ReferencePattern>,
    threshold: f32,
    store: StateStore,
    metrics: MetricsCollector,
    dump: Option<DebugDump>,
    sweep_interval: Duration,
}

impl DetectionLoop {
    pub fn new(
        samplers: Vec<RegionSampler>,
        pattern: Arc<ReferencePattern>,
        threshold: f32,
        store: StateStore,
        metrics: MetricsCollector,
        dump: Option<DebugDump>,
    ) -> Self {
        Self {
            samplers,
            pattern,
            threshold,
            store,
            metrics,
            dump,
            sweep_interval: Duration::from_secs(SWEEP_INTERVAL_SECS),
        }
    }

    /// Overrides the sweep cadence. Tests use this to run sweeps in
    /// milliseconds instead of seconds.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub async fn run(self, cancel_token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.perform_sweep().await;
                }
                _ = cancel_token.cancelled() => {
                    info!("detection loop shutting down");
                    break;
                }
            }
        }
    }

    async fn perform_sweep(&self) {
        let sweep_start = Instant::now();
        let wall_now = Utc::now();

        let mut decisions = Vec::with_capacity(self.samplers.len());
        let mut region_metrics = Vec::with_capacity(self.samplers.len());

        // Capture and match happen out here, per region; only the state
        // arithmetic below runs under the store's write lock.
        for (index, sampler) in self.samplers.iter().enumerate() {
            let outcome = self.process_region(index, sampler).await;
            decisions.push(outcome.detected);
            region_metrics.push(outcome);
        }

        let transitions = self
            .store
            .advance_sweep(&decisions, Instant::now(), wall_now);

        for (index, transition) in transitions.iter().enumerate() {
            match transition {
                Some(Transition::Started) => {
                    info!("region {index}: pattern lost, counter started");
                }
                Some(Transition::Reset) => {
                    info!("region {index}: pattern back, counter reset");
                }
                None => {}
            }
        }

        if let Some(dump) = &self.dump {
            dump.write_status(&region_metrics);
        }

        let (cpu_percent, memory_mb) = self.metrics.sample_system_metrics().await;
        let total_ms = sweep_start.elapsed().as_millis() as u64;
        self.metrics
            .record_sweep(SweepMetrics {
                timestamp: wall_now,
                regions: region_metrics,
                total_ms,
                cpu_percent,
                memory_mb,
            })
            .await;

        debug!("sweep completed in {total_ms}ms");
    }

    async fn process_region(&self, index: usize, sampler: &RegionSampler) -> RegionSweepMetrics {
        let capture_start = Instant::now();
        let sampler_clone = sampler.clone();
        let capture_result = tokio::task::spawn_blocking(move || sampler_clone.sample()).await;
        let capture_ms = capture_start.elapsed().as_millis() as u64;

        let raster = match capture_result {
            Ok(Ok(raster)) => raster,
            Ok(Err(err)) => {
                warn!("region {index} capture failed: {err}");
                return failed_region(index, capture_ms);
            }
            Err(err) => {
                error!("region {index} capture worker join failed: {err}");
                return failed_region(index, capture_ms);
            }
        };

        let match_start = Instant::now();
        let pattern = Arc::clone(&self.pattern);
        let (raster, score) = match tokio::task::spawn_blocking(move || {
            let score = match_score(&raster, &pattern);
            (raster, score)
        })
        .await
        {
            Ok(result) => result,
            Err(err) => {
                error!("region {index} match worker join failed: {err}");
                return RegionSweepMetrics {
                    region: index,
                    capture_ms,
                    match_ms: match_start.elapsed().as_millis() as u64,
                    score: 0.0,
                    detected: false,
                    capture_failed: false,
                };
            }
        };
        let match_ms = match_start.elapsed().as_millis() as u64;

        let detected = score >= self.threshold;
        debug!(
            "region {index}: score={score:.3} detected={detected} (capture: {capture_ms}ms, match: {match_ms}ms)"
        );

        if let Some(dump) = &self.dump {
            dump.write_region(index, &raster, detected);
        }

        RegionSweepMetrics {
            region: index,
            capture_ms,
            match_ms,
            score,
            detected,
            capture_failed: false,
        }
    }
}

fn failed_region(index: usize, capture_ms: u64) -> RegionSweepMetrics {
    RegionSweepMetrics {
        region: index,
        capture_ms,
        match_ms: 0,
        score: 0.0,
        detected: false,
        capture_failed: true,
    }
}
