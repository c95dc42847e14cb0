mod types;

pub use types::{MetricsSnapshot, RegionSweepMetrics, SweepMetrics, SystemMetrics};

use std::sync::Arc;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::sync::Mutex;

const MAX_RECENT_SWEEPS: usize = 20;

pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsState>>,
}

struct MetricsState {
    recent_sweeps: Vec<SweepMetrics>,
    sweep_count: u64,
    detection_count: u64,
    capture_failure_count: u64,
    system: System,
    pid: Pid,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let mut system = System::new();
        let pid = Pid::from_u32(std::process::id());

        // Initial refresh to establish baseline for CPU calculation
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        Self {
            inner: Arc::new(Mutex::new(MetricsState {
                recent_sweeps: Vec::with_capacity(MAX_RECENT_SWEEPS),
                sweep_count: 0,
                detection_count: 0,
                capture_failure_count: 0,
                system,
                pid,
            })),
        }
    }

    /// Sample current CPU and memory usage. Call this during each sweep.
    /// CPU usage requires multiple refreshes over time to calculate delta.
    pub async fn sample_system_metrics(&self) -> (f32, f64) {
        let mut state = self.inner.lock().await;
        let pid = state.pid;
        state.system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        if let Some(process) = state.system.process(pid) {
            (
                process.cpu_usage(),
                process.memory() as f64 / 1024.0 / 1024.0,
            )
        } else {
            (0.0, 0.0)
        }
    }

    pub async fn record_sweep(&self, metrics: SweepMetrics) {
        let mut state = self.inner.lock().await;

        state.sweep_count += 1;
        state.detection_count += metrics.regions.iter().filter(|r| r.detected).count() as u64;
        state.capture_failure_count += metrics
            .regions
            .iter()
            .filter(|r| r.capture_failed)
            .count() as u64;

        state.recent_sweeps.push(metrics);

        if state.recent_sweeps.len() > MAX_RECENT_SWEEPS {
            state.recent_sweeps.remove(0);
        }
    }

    pub async fn get_snapshot(&self) -> MetricsSnapshot {
        let mut state = self.inner.lock().await;
        let pid = state.pid;

        // Refresh to get current CPU/RAM
        state.system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        let system_metrics = if let Some(process) = state.system.process(pid) {
            SystemMetrics {
                cpu_percent: process.cpu_usage(),
                memory_mb: process.memory() as f64 / 1024.0 / 1024.0,
            }
        } else {
            SystemMetrics {
                cpu_percent: 0.0,
                memory_mb: 0.0,
            }
        };

        MetricsSnapshot {
            system: system_metrics,
            recent_sweeps: state.recent_sweeps.clone(),
            sweep_count: state.sweep_count,
            detection_count: state.detection_count,
            capture_failure_count: state.capture_failure_count,
        }
    }

    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        let pid = state.pid;
        state.recent_sweeps.clear();
        state.sweep_count = 0;
        state.detection_count = 0;
        state.capture_failure_count = 0;
        // Re-establish baseline for CPU after reset
        state.system.refresh_processes(ProcessesToUpdate::Some(&[pid]));
    }
}

impl Clone for MetricsCollector {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
