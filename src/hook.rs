//! Per-request instrumentation entry point
//!
//! The host pipeline calls [`RequestObserver::begin`] when a request enters
//! and finishes the returned timer once the response headers are final. The
//! completion path does bounded O(1) work and nothing in it can fail into
//! the monitored request.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::counters::CounterStore;

/// Routing decision for one inbound request
#[derive(Debug)]
pub enum RequestKind {
    /// Instrument this request; finish the timer when the response is done
    Instrumented(RequestTimer),
    /// The dashboard page itself: bypass instrumentation and render a page
    /// payload instead
    DashboardPage,
    /// Path matches the ignore prefix: not observed at all
    Ignored,
}

/// Per-request hook shared with the host pipeline
#[derive(Debug, Clone)]
pub struct RequestObserver {
    counters: Arc<CounterStore>,
    dashboard_path: Arc<str>,
    ignore_prefix: Arc<str>,
}

impl RequestObserver {
    pub fn new(counters: Arc<CounterStore>, dashboard_path: &str, ignore_prefix: &str) -> Self {
        Self {
            counters,
            dashboard_path: Arc::from(dashboard_path),
            ignore_prefix: Arc::from(ignore_prefix),
        }
    }

    /// Decide what to do with one inbound request, capturing the start
    /// instant for instrumented ones.
    pub fn begin(&self, path: &str) -> RequestKind {
        if path == &*self.dashboard_path {
            return RequestKind::DashboardPage;
        }

        // an empty prefix ignores nothing, not everything
        if !self.ignore_prefix.is_empty() && path.starts_with(&*self.ignore_prefix) {
            return RequestKind::Ignored;
        }

        RequestKind::Instrumented(RequestTimer {
            counters: self.counters.clone(),
            started_at: Instant::now(),
            completed: AtomicBool::new(false),
        })
    }
}

/// Fire-once timer for a single instrumented request.
///
/// The host's "response finished" signal may be wired to several exit paths
/// (normal completion, early termination, error handlers); the atomic guard
/// makes sure a request is only ever counted once.
#[derive(Debug)]
pub struct RequestTimer {
    counters: Arc<CounterStore>,
    started_at: Instant,
    completed: AtomicBool,
}

impl RequestTimer {
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Record the observation with the completion time taken now.
    pub fn finish(&self, status_code: u16) {
        self.finish_at(status_code, Instant::now());
    }

    /// Record the observation against an externally captured completion
    /// instant.
    ///
    /// A completion instant before the start clamps to zero elapsed instead
    /// of corrupting the bucket index.
    pub fn finish_at(&self, status_code: u16, completed_at: Instant) {
        if self.completed.swap(true, Ordering::Relaxed) {
            return;
        }

        let elapsed = completed_at.saturating_duration_since(self.started_at);
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.counters.observe(status_code, elapsed_ms);
    }
}
