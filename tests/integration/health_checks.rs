//! Health-check orchestration against real HTTP endpoints
//!
//! Uses wiremock to stand in for the probed services: healthy endpoints,
//! failing ones, slow ones that must time out, and unreachable hosts.

use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use statusdeck::config::{HealthCheckConfig, MonitorConfig};
use statusdeck::health::HealthStatus;
use statusdeck::monitor::StatusMonitor;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::helpers::*;

async fn mock_health_endpoint(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_healthy_endpoint_passes() {
    init_tracing();

    let server = mock_health_endpoint(200).await;

    let monitor = StatusMonitor::start(MonitorConfig {
        health_checks: vec![health_check_for(&server.uri(), "users", 1_000)],
        ..test_config()
    })
    .unwrap();

    let payload = monitor.page_payload().await;
    assert_eq!(payload.health.len(), 1);
    assert_eq!(payload.health[0].name, "users");
    assert_eq!(payload.health[0].status, HealthStatus::Pass);
    assert_eq!(payload.health[0].message.as_deref(), Some("HTTP 200"));

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_unhealthy_endpoint_fails() {
    let server = mock_health_endpoint(500).await;

    let monitor = StatusMonitor::start(MonitorConfig {
        health_checks: vec![health_check_for(&server.uri(), "users", 1_000)],
        ..test_config()
    })
    .unwrap();

    let payload = monitor.page_payload().await;
    assert_eq!(payload.health[0].status, HealthStatus::Fail);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_expected_status_overrides_default() {
    let server = mock_health_endpoint(418).await;

    let mut check = health_check_for(&server.uri(), "teapot", 1_000);
    check.expected_status = Some(vec![418]);

    let monitor = StatusMonitor::start(MonitorConfig {
        health_checks: vec![check],
        ..test_config()
    })
    .unwrap();

    let payload = monitor.page_payload().await;
    assert_eq!(payload.health[0].status, HealthStatus::Pass);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_host_errors() {
    // nothing is listening here
    let monitor = StatusMonitor::start(MonitorConfig {
        health_checks: vec![HealthCheckConfig {
            name: Some(String::from("gone")),
            protocol: String::from("http"),
            host: String::from("127.0.0.1"),
            port: Some(9),
            path: String::from("/health"),
            expected_status: None,
            timeout_ms: 2_000,
        }],
        ..test_config()
    })
    .unwrap();

    let payload = monitor.page_payload().await;
    assert_eq!(payload.health[0].status, HealthStatus::Error);
    assert!(payload.health[0].message.is_some());

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_slow_endpoint_times_out_within_bound() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let monitor = StatusMonitor::start(MonitorConfig {
        health_checks: vec![health_check_for(&server.uri(), "slow", 100)],
        ..test_config()
    })
    .unwrap();

    let started = Instant::now();
    let payload = monitor.page_payload().await;

    assert_eq!(payload.health[0].status, HealthStatus::Timeout);
    // resolved near the 100ms deadline, nowhere near the 10s response
    assert!(started.elapsed() < Duration::from_secs(2));

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_mixed_batch_keeps_order_and_isolation() {
    let healthy = mock_health_endpoint(200).await;
    let unhealthy = mock_health_endpoint(503).await;

    let slow = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&slow)
        .await;

    let monitor = StatusMonitor::start(MonitorConfig {
        health_checks: vec![
            health_check_for(&healthy.uri(), "a", 2_000),
            health_check_for(&slow.uri(), "b", 100),
            health_check_for(&unhealthy.uri(), "c", 2_000),
            HealthCheckConfig {
                name: Some(String::from("d")),
                protocol: String::from("http"),
                host: String::from("127.0.0.1"),
                port: Some(9),
                path: String::from("/health"),
                expected_status: None,
                timeout_ms: 2_000,
            },
            health_check_for(&healthy.uri(), "e", 2_000),
        ],
        ..test_config()
    })
    .unwrap();

    let payload = monitor.page_payload().await;

    let names: Vec<_> = payload.health.iter().map(|result| result.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c", "d", "e"]);

    let statuses: Vec<_> = payload.health.iter().map(|result| result.status).collect();
    assert_eq!(
        statuses,
        vec![
            HealthStatus::Pass,
            HealthStatus::Timeout,
            HealthStatus::Fail,
            HealthStatus::Error,
            HealthStatus::Pass,
        ]
    );

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_each_page_load_runs_fresh_checks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let monitor = StatusMonitor::start(MonitorConfig {
        health_checks: vec![health_check_for(&server.uri(), "users", 1_000)],
        ..test_config()
    })
    .unwrap();

    monitor.page_payload().await;
    monitor.page_payload().await;

    // wiremock verifies the expectation of exactly 2 requests on drop
    monitor.shutdown().await;
}
