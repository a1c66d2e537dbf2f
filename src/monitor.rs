//! StatusMonitor - the wired-together dashboard core
//!
//! Constructed once from a validated configuration; owns the counter store
//! and the sampler/broadcaster actors, and exposes the three entry points
//! the embedding pipeline needs: the per-request hook, live-update
//! subscription, and the dashboard page payload.

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use crate::Snapshot;
use crate::actors::broadcaster::{BroadcastHandle, LiveClient};
use crate::actors::sampler::SamplerHandle;
use crate::config::{ChartVisibility, ConfigError, MonitorConfig, ResolvedMonitorConfig};
use crate::counters::CounterStore;
use crate::health::{self, HealthCheckResult};
use crate::hook::{RequestKind, RequestObserver};
use crate::snapshot::SnapshotAssembler;

/// Response-header mutations the embedding layer should apply when serving
/// the dashboard page. Policy only; the collaborator does the mutating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderDirective {
    /// Strip X-Frame-Options so the page can be embedded in an iframe
    RemoveFrameOptions,
}

/// Everything the page-rendering collaborator needs for one dashboard view
#[derive(Debug, Clone, Serialize)]
pub struct PagePayload {
    pub title: String,
    pub theme: String,
    pub chart_visibility: ChartVisibility,
    pub snapshot: Snapshot,
    pub health: Vec<HealthCheckResult>,
    pub header_directives: Vec<HeaderDirective>,
}

/// The dashboard core: counter store, sampler, broadcaster, and health
/// orchestrator behind one facade
pub struct StatusMonitor {
    config: ResolvedMonitorConfig,
    counters: Arc<CounterStore>,
    observer: RequestObserver,
    assembler: Arc<SnapshotAssembler>,
    sampler: SamplerHandle,
    broadcaster: BroadcastHandle,
}

impl StatusMonitor {
    /// Validate the configuration and start the background tasks.
    ///
    /// Must be called from within a Tokio runtime. Fails only on
    /// configuration errors; everything after construction is contained
    /// per-component.
    pub fn start(config: MonitorConfig) -> Result<Self, ConfigError> {
        Ok(Self::start_resolved(config.resolve()?))
    }

    /// Start from an already-resolved configuration
    pub fn start_resolved(config: ResolvedMonitorConfig) -> Self {
        let counters = Arc::new(CounterStore::new(config.buckets.clone()));
        let observer =
            RequestObserver::new(counters.clone(), &config.path, &config.ignore_starts_with);

        let sampler = SamplerHandle::spawn(config.sample_interval);
        let assembler = Arc::new(SnapshotAssembler::new(
            counters.clone(),
            sampler.latest_cell(),
        ));
        let broadcaster = BroadcastHandle::spawn(assembler.clone(), config.broadcast_interval);

        Self {
            config,
            counters,
            observer,
            assembler,
            sampler,
            broadcaster,
        }
    }

    /// Route one inbound request: instrument it, serve the dashboard, or
    /// skip it.
    pub fn begin_request(&self, path: &str) -> RequestKind {
        self.observer.begin(path)
    }

    /// Shared counter store (observations recorded here are reflected in
    /// every later snapshot)
    pub fn counters(&self) -> &Arc<CounterStore> {
        &self.counters
    }

    pub fn config(&self) -> &ResolvedMonitorConfig {
        &self.config
    }

    /// Current merged snapshot without running health checks
    pub async fn snapshot(&self) -> Snapshot {
        self.assembler.assemble().await
    }

    /// Register a live-update client; it receives one snapshot immediately
    /// and the latest one on every broadcast tick after that.
    pub async fn subscribe(&self) -> Result<LiveClient> {
        self.broadcaster.connect().await
    }

    /// Remove a live-update client from the broadcast set
    pub async fn unsubscribe(&self, client_id: u64) -> Result<()> {
        self.broadcaster.disconnect(client_id).await
    }

    /// Assemble the full dashboard page payload: snapshot, a fresh health
    /// check run, and the header policy for the embedding layer.
    pub async fn page_payload(&self) -> PagePayload {
        let snapshot = self.assembler.assemble().await;
        let health = health::run_all(&self.config.health_checks).await;

        let header_directives = if self.config.iframe {
            vec![HeaderDirective::RemoveFrameOptions]
        } else {
            Vec::new()
        };

        PagePayload {
            title: self.config.title.clone(),
            theme: self.config.theme.clone(),
            chart_visibility: self.config.chart_visibility.clone(),
            snapshot,
            health,
            header_directives,
        }
    }

    /// Stop the background tasks. Connected live clients see their channels
    /// close.
    pub async fn shutdown(&self) {
        let _ = self.sampler.shutdown().await;
        let _ = self.broadcaster.shutdown().await;
    }
}
