use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionSweepMetrics {
    pub region: usize,
    pub capture_ms: u64,
    pub match_ms: u64,
    pub score: f32,
    pub detected: bool,
    pub capture_failed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepMetrics {
    pub timestamp: DateTime<Utc>,
    pub regions: Vec<RegionSweepMetrics>,
    pub total_ms: u64,
    pub cpu_percent: f32,
    pub memory_mb: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub cpu_percent: f32,
    pub memory_mb: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub system: SystemMetrics,
    pub recent_sweeps: Vec<SweepMetrics>,
    pub sweep_count: u64,
    pub detection_count: u64,
    pub capture_failure_count: u64,
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self {
            system: SystemMetrics {
                cpu_percent: 0.0,
                memory_mb: 0.0,
            },
            recent_sweeps: Vec::new(),
            sweep_count: 0,
            detection_count: 0,
            capture_failure_count: 0,
        }
    }
}
