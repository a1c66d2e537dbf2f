//! Dashboard configuration
//!
//! The embedding application hands over a [`MonitorConfig`] once;
//! [`MonitorConfig::resolve`] applies the documented defaults and validates
//! the result into the immutable [`ResolvedMonitorConfig`] the core runs on.
//! Validation failures are fatal: the core refuses to start on a malformed
//! configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::classify::SpanBuckets;
use crate::health::{HealthCheck, HttpProbe};

const DEFAULT_TITLE: &str = "Status";
const DEFAULT_THEME: &str = "default.css";
const DEFAULT_PATH: &str = "/status";
const DEFAULT_IGNORE_PREFIX: &str = "/admin";
const DEFAULT_SPAN_BOUNDARIES_MS: [u64; 3] = [50, 200, 1000];
const DEFAULT_INTERVAL_MS: u64 = 1_000;

/// Result type alias for configuration resolution
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that make the core refuse to start
#[derive(Debug)]
pub enum ConfigError {
    /// Span boundaries not strictly ascending from a positive first value
    UnorderedSpanBoundaries { previous: u64, next: u64 },

    /// Broadcast or sample interval of zero
    ZeroInterval(&'static str),

    /// Health-check timeout of zero
    ZeroProbeTimeout { check: String },

    /// Health-check endpoint does not form a valid URL
    InvalidHealthCheckUrl { check: String, url: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnorderedSpanBoundaries { previous, next } => write!(
                f,
                "span boundaries must be strictly ascending and start above zero: {} follows {}",
                next, previous
            ),
            ConfigError::ZeroInterval(field) => write!(f, "{} must be greater than zero", field),
            ConfigError::ZeroProbeTimeout { check } => {
                write!(f, "health check '{}' has a zero timeout", check)
            }
            ConfigError::InvalidHealthCheckUrl { check, url } => {
                write!(f, "health check '{}' has an invalid endpoint: {}", check, url)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Raw configuration as supplied by the embedding application.
///
/// Every field is optional; [`MonitorConfig::resolve`] fills in the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Dashboard page title (pass-through for the renderer)
    pub title: Option<String>,

    /// Stylesheet name (pass-through for the renderer)
    pub theme: Option<String>,

    /// Path that serves the dashboard page
    pub path: Option<String>,

    /// Requests whose path starts with this prefix are not instrumented
    pub ignore_starts_with: Option<String>,

    /// Ascending upper boundaries of the latency buckets, in milliseconds
    pub span_boundaries_ms: Option<Vec<u64>>,

    /// Cadence of live-update pushes, in milliseconds
    pub broadcast_interval_ms: Option<u64>,

    /// Cadence of host vitals sampling, in milliseconds
    pub sample_interval_ms: Option<u64>,

    pub health_checks: Vec<HealthCheckConfig>,

    pub chart_visibility: Option<ChartVisibility>,

    /// Allow embedding the dashboard page in an iframe
    pub iframe: Option<bool>,
}

/// One configured health-check endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct HealthCheckConfig {
    /// Display name; defaults to the endpoint URL
    pub name: Option<String>,

    #[serde(default = "default_protocol")]
    pub protocol: String,

    pub host: String,

    pub port: Option<u16>,

    #[serde(default = "default_probe_path")]
    pub path: String,

    /// Accepted status codes; any 2xx when unset
    pub expected_status: Option<Vec<u16>>,

    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_protocol() -> String {
    String::from("http")
}

fn default_probe_path() -> String {
    String::from("/")
}

fn default_probe_timeout_ms() -> u64 {
    5_000
}

/// Which charts the page renderer should show.
///
/// Pass-through for the rendering collaborator; the core only carries it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartVisibility {
    pub cpu: bool,
    pub mem: bool,
    pub load: bool,
    pub response_time: bool,
    pub rps: bool,
    pub status_codes: bool,
}

impl Default for ChartVisibility {
    fn default() -> Self {
        Self {
            cpu: true,
            mem: true,
            load: true,
            response_time: true,
            rps: true,
            status_codes: true,
        }
    }
}

/// Fully-defaulted, validated configuration
#[derive(Debug, Clone)]
pub struct ResolvedMonitorConfig {
    pub title: String,
    pub theme: String,
    pub path: String,
    pub ignore_starts_with: String,
    pub buckets: SpanBuckets,
    pub broadcast_interval: Duration,
    pub sample_interval: Duration,
    pub health_checks: Vec<HealthCheck>,
    pub chart_visibility: ChartVisibility,
    pub iframe: bool,
}

impl MonitorConfig {
    /// Apply defaults and validate.
    pub fn resolve(self) -> ConfigResult<ResolvedMonitorConfig> {
        let boundaries = self
            .span_boundaries_ms
            .unwrap_or_else(|| DEFAULT_SPAN_BOUNDARIES_MS.to_vec());
        let buckets = SpanBuckets::from_boundaries(&boundaries)?;

        let broadcast_interval_ms = self.broadcast_interval_ms.unwrap_or(DEFAULT_INTERVAL_MS);
        if broadcast_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("broadcast_interval_ms"));
        }

        let sample_interval_ms = self.sample_interval_ms.unwrap_or(DEFAULT_INTERVAL_MS);
        if sample_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("sample_interval_ms"));
        }

        // one client shared across every HTTP probe; timeouts are enforced by
        // the orchestrator race, not the client
        let client = reqwest::Client::builder()
            .build()
            .expect("Failed to build HTTP client");

        let health_checks = self
            .health_checks
            .into_iter()
            .map(|check| check.resolve(&client))
            .collect::<ConfigResult<Vec<_>>>()?;

        let resolved = ResolvedMonitorConfig {
            title: self.title.unwrap_or_else(|| String::from(DEFAULT_TITLE)),
            theme: self.theme.unwrap_or_else(|| String::from(DEFAULT_THEME)),
            path: self.path.unwrap_or_else(|| String::from(DEFAULT_PATH)),
            ignore_starts_with: self
                .ignore_starts_with
                .unwrap_or_else(|| String::from(DEFAULT_IGNORE_PREFIX)),
            buckets,
            broadcast_interval: Duration::from_millis(broadcast_interval_ms),
            sample_interval: Duration::from_millis(sample_interval_ms),
            health_checks,
            chart_visibility: self.chart_visibility.unwrap_or_default(),
            iframe: self.iframe.unwrap_or(false),
        };

        trace!("resolved config: {resolved:?}");
        Ok(resolved)
    }
}

impl HealthCheckConfig {
    fn endpoint(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}{}", self.protocol, self.host, port, self.path),
            None => format!("{}://{}{}", self.protocol, self.host, self.path),
        }
    }

    fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.endpoint())
    }

    fn resolve(self, client: &reqwest::Client) -> ConfigResult<HealthCheck> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroProbeTimeout {
                check: self.display_name(),
            });
        }

        let endpoint = self.endpoint();
        let url = reqwest::Url::parse(&endpoint).map_err(|_| ConfigError::InvalidHealthCheckUrl {
            check: self.display_name(),
            url: endpoint.clone(),
        })?;

        let name = self.name.unwrap_or_else(|| endpoint.clone());
        let probe = HttpProbe::new(client.clone(), url, self.expected_status);

        Ok(HealthCheck::with_probe(
            name,
            Duration::from_millis(self.timeout_ms),
            Arc::new(probe),
        ))
    }
}
