//! Process-wide observation counters
//!
//! The counter store is the shared mutable heart of the dashboard: every
//! completed request folds into it and every snapshot reads from it. Writers
//! sit on the hot request path, so all cells are lock-free atomics; readers
//! accept an eventually consistent view.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::classify::{SpanBuckets, StatusClass};

/// Mutable table of observation counts keyed by (status class, span bucket),
/// plus the running total and cumulative elapsed time.
///
/// Created once at startup with all cells zero and never reset.
#[derive(Debug)]
pub struct CounterStore {
    buckets: SpanBuckets,
    cells: Box<[AtomicU64]>,
    total: AtomicU64,
    elapsed_ms_sum: AtomicU64,
}

impl CounterStore {
    pub fn new(buckets: SpanBuckets) -> Self {
        let cells = (0..StatusClass::COUNT * buckets.len())
            .map(|_| AtomicU64::new(0))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            buckets,
            cells,
            total: AtomicU64::new(0),
            elapsed_ms_sum: AtomicU64::new(0),
        }
    }

    /// Fold one completed request into the store.
    ///
    /// Bounded O(1) work: three relaxed `fetch_add`s. A bucket index past the
    /// grid is clamped to the last bucket instead of panicking on the request
    /// path.
    pub fn record(&self, class: StatusClass, bucket_index: usize, elapsed_ms: u64) {
        let bucket = bucket_index.min(self.buckets.len() - 1);
        let cell = class.index() * self.buckets.len() + bucket;

        self.cells[cell].fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);
        self.elapsed_ms_sum.fetch_add(elapsed_ms, Ordering::Relaxed);
    }

    /// Classify status code and latency, then record the observation.
    pub fn observe(&self, status_code: u16, elapsed_ms: u64) {
        let class = StatusClass::from_status_code(status_code);
        let bucket = self.buckets.classify(elapsed_ms);
        self.record(class, bucket, elapsed_ms);
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Immutable copy of the current counts for rendering and broadcast.
    ///
    /// Cells are read one by one without locking: a copy taken concurrently
    /// with writers may interleave with in-flight updates, which is
    /// acceptable for a monitoring display. Counts never decrease and no
    /// writer is ever blocked.
    pub fn snapshot_view(&self) -> CountersView {
        let bucket_count = self.buckets.len();
        let per_class = |class: StatusClass| -> Vec<u64> {
            (0..bucket_count)
                .map(|bucket| self.cells[class.index() * bucket_count + bucket].load(Ordering::Relaxed))
                .collect()
        };

        let total_requests = self.total.load(Ordering::Relaxed);
        let elapsed_ms_sum = self.elapsed_ms_sum.load(Ordering::Relaxed);

        CountersView {
            bucket_labels: self.buckets.labels(),
            success: per_class(StatusClass::Success),
            redirect: per_class(StatusClass::Redirect),
            client_error: per_class(StatusClass::ClientError),
            server_error: per_class(StatusClass::ServerError),
            total_requests,
            mean_latency_ms: if total_requests == 0 {
                0.0
            } else {
                elapsed_ms_sum as f64 / total_requests as f64
            },
        }
    }
}

/// Serializable copy of the counter grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountersView {
    pub bucket_labels: Vec<String>,
    pub success: Vec<u64>,
    pub redirect: Vec<u64>,
    pub client_error: Vec<u64>,
    pub server_error: Vec<u64>,
    pub total_requests: u64,
    pub mean_latency_ms: f64,
}

impl CountersView {
    /// Counts for one status class across all buckets
    pub fn class_counts(&self, class: StatusClass) -> &[u64] {
        match class {
            StatusClass::Success => &self.success,
            StatusClass::Redirect => &self.redirect,
            StatusClass::ClientError => &self.client_error,
            StatusClass::ServerError => &self.server_error,
        }
    }
}
