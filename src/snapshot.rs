//! Snapshot assembly
//!
//! Merges the counter store with the latest host sample into the single
//! serializable unit pushed to live clients and handed to the page renderer.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::Utc;

use crate::Snapshot;
use crate::actors::sampler::LatestSample;
use crate::counters::CounterStore;

/// Windows shorter than this reuse the previous rate estimate: a page load
/// right after a broadcast tick must not divide by a near-zero interval.
const MIN_RATE_WINDOW_MS: u128 = 250;

/// Builds snapshots on demand from the shared counter store and the latest
/// sampler reading
pub struct SnapshotAssembler {
    counters: Arc<CounterStore>,
    latest_sample: LatestSample,
    rate: Mutex<RateTracker>,
}

struct RateTracker {
    last_total: u64,
    last_at: Instant,
    last_estimate: f64,
}

impl SnapshotAssembler {
    pub fn new(counters: Arc<CounterStore>, latest_sample: LatestSample) -> Self {
        Self {
            counters,
            latest_sample,
            rate: Mutex::new(RateTracker {
                last_total: 0,
                last_at: Instant::now(),
                last_estimate: 0.0,
            }),
        }
    }

    /// Build a snapshot from the current counters and the latest sample.
    ///
    /// Assembled fresh on every call; nothing is persisted.
    pub async fn assemble(&self) -> Snapshot {
        let counters = self.counters.snapshot_view();
        let metrics = self.latest_sample.read().await.clone();
        let requests_per_second = self.estimate_rate(counters.total_requests);

        Snapshot {
            counters,
            metrics,
            requests_per_second,
            timestamp: Utc::now(),
        }
    }

    /// Requests/sec over the window since the previous assembly
    fn estimate_rate(&self, total: u64) -> f64 {
        let mut rate = self.rate.lock().expect("rate tracker poisoned");

        let now = Instant::now();
        let window = now.duration_since(rate.last_at);
        if window.as_millis() < MIN_RATE_WINDOW_MS {
            return rate.last_estimate;
        }

        let delta = total.saturating_sub(rate.last_total);
        let estimate = delta as f64 / window.as_secs_f64();

        rate.last_total = total;
        rate.last_at = now;
        rate.last_estimate = estimate;

        estimate
    }
}
