//! Request instrumentation end to end
//!
//! These tests drive the monitor the way an embedding pipeline would: begin
//! a request, finish its timer when the response is done, and read the
//! resulting counters back out of a snapshot.

use std::time::Duration;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use statusdeck::hook::RequestKind;
use statusdeck::monitor::StatusMonitor;

use super::helpers::*;

fn finish_with(monitor: &StatusMonitor, path: &str, status: u16, elapsed_ms: u64) {
    let RequestKind::Instrumented(timer) = monitor.begin_request(path) else {
        panic!("expected {path} to be instrumented");
    };
    timer.finish_at(status, timer.started_at() + Duration::from_millis(elapsed_ms));
}

#[tokio::test]
async fn test_single_observation_lands_in_exact_cell() {
    let monitor = StatusMonitor::start(test_config()).unwrap();

    // 404 at 75ms: client error, second bucket of [0,50) [50,200) [200,1000) [1000,∞)
    finish_with(&monitor, "/api/users", 404, 75);

    let view = monitor.snapshot().await.counters;
    assert_eq!(view.client_error, vec![0, 1, 0, 0]);
    assert_eq!(view.success, vec![0, 0, 0, 0]);
    assert_eq!(view.redirect, vec![0, 0, 0, 0]);
    assert_eq!(view.server_error, vec![0, 0, 0, 0]);
    assert_eq!(view.total_requests, 1);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_observations_spread_across_grid() {
    let monitor = StatusMonitor::start(test_config()).unwrap();

    finish_with(&monitor, "/a", 200, 10);
    finish_with(&monitor, "/b", 200, 60);
    finish_with(&monitor, "/c", 301, 250);
    finish_with(&monitor, "/d", 500, 1500);
    finish_with(&monitor, "/e", 503, 1500);

    let view = monitor.snapshot().await.counters;
    assert_eq!(view.success, vec![1, 1, 0, 0]);
    assert_eq!(view.redirect, vec![0, 0, 1, 0]);
    assert_eq!(view.server_error, vec![0, 0, 0, 2]);
    assert_eq!(view.total_requests, 5);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_ignored_prefix_never_touches_counters() {
    let monitor = StatusMonitor::start(test_config()).unwrap();
    let before = monitor.snapshot().await.counters;

    assert_matches!(monitor.begin_request("/admin"), RequestKind::Ignored);
    assert_matches!(monitor.begin_request("/admin/users/42"), RequestKind::Ignored);

    let after = monitor.snapshot().await.counters;
    assert_eq!(before.total_requests, after.total_requests);
    assert_eq!(after.total_requests, 0);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_dashboard_path_is_routed_to_page() {
    let monitor = StatusMonitor::start(test_config()).unwrap();

    assert_matches!(monitor.begin_request("/status"), RequestKind::DashboardPage);
    // only exact matches serve the page
    assert_matches!(monitor.begin_request("/status/x"), RequestKind::Instrumented(_));

    assert_eq!(monitor.snapshot().await.counters.total_requests, 0);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_unfinished_timer_records_nothing() {
    let monitor = StatusMonitor::start(test_config()).unwrap();

    let RequestKind::Instrumented(timer) = monitor.begin_request("/api/slow") else {
        panic!("expected instrumented request");
    };
    drop(timer);

    assert_eq!(monitor.snapshot().await.counters.total_requests, 0);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_mean_latency_reflects_observations() {
    let monitor = StatusMonitor::start(test_config()).unwrap();

    finish_with(&monitor, "/a", 200, 100);
    finish_with(&monitor, "/b", 200, 300);

    let view = monitor.snapshot().await.counters;
    assert_eq!(view.mean_latency_ms, 200.0);

    monitor.shutdown().await;
}
