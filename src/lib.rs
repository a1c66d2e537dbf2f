pub mod actors;
pub mod classify;
pub mod config;
pub mod counters;
pub mod health;
pub mod hook;
pub mod monitor;
pub mod snapshot;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::counters::CountersView;

/// One reading of host/process vitals, produced by the metrics sampler.
///
/// Only the latest sample is retained; there is no history buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSample {
    /// Average CPU usage across all cores, in percent
    pub cpu_load: f32,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
    pub load_average: LoadAverage,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

/// The merged, serializable view pushed to live clients and handed to the
/// page renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub counters: CountersView,
    /// `None` only before the sampler has taken its first successful reading
    pub metrics: Option<MetricsSample>,
    pub requests_per_second: f64,
    pub timestamp: DateTime<Utc>,
}
