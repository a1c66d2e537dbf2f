//! Test helpers and utilities for the integration suites

use statusdeck::config::{HealthCheckConfig, MonitorConfig};

/// Opt-in log output for debugging test runs
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Default test configuration: known buckets, periodic work parked far away
pub fn test_config() -> MonitorConfig {
    MonitorConfig {
        span_boundaries_ms: Some(vec![50, 200, 1000]),
        broadcast_interval_ms: Some(3_600_000),
        sample_interval_ms: Some(3_600_000),
        ..Default::default()
    }
}

/// Test configuration with a fast broadcast cadence
pub fn config_with_broadcast_interval(interval_ms: u64) -> MonitorConfig {
    MonitorConfig {
        broadcast_interval_ms: Some(interval_ms),
        ..test_config()
    }
}

/// Build a health-check definition pointing at a mock server URI
pub fn health_check_for(uri: &str, name: &str, timeout_ms: u64) -> HealthCheckConfig {
    let url = url::Url::parse(uri).unwrap();

    HealthCheckConfig {
        name: Some(name.to_string()),
        protocol: url.scheme().to_string(),
        host: url.host_str().unwrap().to_string(),
        port: url.port(),
        path: String::from("/health"),
        expected_status: None,
        timeout_ms,
    }
}
