//! Concurrent health-check orchestration
//!
//! Every configured probe runs concurrently, raced against its own timeout.
//! One probe timing out, failing, or erroring never affects the others and
//! never fails the batch; results come back in input order.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

/// What a probe found out about its target
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub healthy: bool,
    pub message: Option<String>,
}

/// A single health-check unit of work
#[async_trait]
pub trait Probe: Send + Sync {
    /// Resolve the probe. `Err` marks an unexpected failure, distinct from a
    /// probe that resolved and reported its target unhealthy.
    async fn check(&self) -> anyhow::Result<ProbeReport>;
}

/// HTTP GET probe: healthy when the response status is in the accepted set
pub struct HttpProbe {
    /// Reused across requests for efficiency
    client: reqwest::Client,
    url: reqwest::Url,
    /// Accepted status codes; any 2xx when unset
    expected_status: Option<Vec<u16>>,
}

impl HttpProbe {
    pub fn new(client: reqwest::Client, url: reqwest::Url, expected_status: Option<Vec<u16>>) -> Self {
        Self {
            client,
            url,
            expected_status,
        }
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn check(&self) -> anyhow::Result<ProbeReport> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .context("HTTP request failed")?;

        let status = response.status().as_u16();
        let healthy = match &self.expected_status {
            Some(expected) => expected.contains(&status),
            None => (200..300).contains(&status),
        };

        Ok(ProbeReport {
            healthy,
            message: Some(format!("HTTP {status}")),
        })
    }
}

/// Outcome of one health-check run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Probe resolved successfully within its timeout
    Pass,
    /// Probe resolved but reported its target unhealthy
    Fail,
    /// No resolution before the deadline; a late result is discarded
    Timeout,
    /// Probe raised an unexpected failure
    Error,
}

/// Result of one health-check run; fresh per batch, never persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub name: String,
    pub status: HealthStatus,
    pub latency_ms: u64,
    pub message: Option<String>,
}

/// A named probe with its own deadline
#[derive(Clone)]
pub struct HealthCheck {
    name: String,
    timeout: Duration,
    probe: Arc<dyn Probe>,
}

impl fmt::Debug for HealthCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthCheck")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HealthCheck {
    pub fn with_probe(name: impl Into<String>, timeout: Duration, probe: Arc<dyn Probe>) -> Self {
        Self {
            name: name.into(),
            timeout,
            probe,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Race the probe against its timeout. Never fails: every outcome folds
    /// into a [`HealthCheckResult`].
    #[instrument(skip(self), fields(check = %self.name))]
    async fn run(&self) -> HealthCheckResult {
        let started = Instant::now();

        match tokio::time::timeout(self.timeout, self.probe.check()).await {
            Err(_) => {
                warn!("probe did not resolve within {:?}", self.timeout);
                HealthCheckResult {
                    name: self.name.clone(),
                    status: HealthStatus::Timeout,
                    latency_ms: self.timeout.as_millis() as u64,
                    message: Some(format!("no result within {} ms", self.timeout.as_millis())),
                }
            }
            Ok(Err(e)) => {
                warn!("probe raised an error: {e:#}");
                HealthCheckResult {
                    name: self.name.clone(),
                    status: HealthStatus::Error,
                    latency_ms: started.elapsed().as_millis() as u64,
                    message: Some(format!("{e:#}")),
                }
            }
            Ok(Ok(report)) => HealthCheckResult {
                name: self.name.clone(),
                status: if report.healthy {
                    HealthStatus::Pass
                } else {
                    HealthStatus::Fail
                },
                latency_ms: started.elapsed().as_millis() as u64,
                message: report.message,
            },
        }
    }
}

/// Run every check concurrently; results preserve input order.
///
/// A timed-out probe's future is dropped on the spot, so repeated batches
/// never pile up abandoned waits. Whatever work the probe's target started
/// keeps running on its own; only the waiting stops.
pub async fn run_all(checks: &[HealthCheck]) -> Vec<HealthCheckResult> {
    futures::future::join_all(checks.iter().map(HealthCheck::run)).await
}
