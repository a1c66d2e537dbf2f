//! MetricsSamplerActor - periodically reads host vitals
//!
//! Keeps the single "latest sample" cell fresh on a fixed period. Sampling is
//! independent of request volume and keeps ticking with zero traffic; a
//! failed read is logged and the previous sample is retained for that tick.
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → read vitals → store latest sample ← SnapshotAssembler reads
//!     ↑
//!     └─── Commands (SampleNow, Shutdown)
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use sysinfo::System;
use tokio::sync::{RwLock, mpsc, oneshot};
use tokio::time::interval;
use tracing::{debug, instrument, trace, warn};

use crate::{LoadAverage, MetricsSample};

use super::messages::SamplerCommand;

/// Shared cell holding the most recent host sample
pub type LatestSample = Arc<RwLock<Option<MetricsSample>>>;

/// Actor that samples host vitals on a fixed period
pub struct MetricsSamplerActor {
    sys: System,

    /// Shared cell updated on every successful read
    latest: LatestSample,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<SamplerCommand>,

    interval_duration: Duration,
}

impl MetricsSamplerActor {
    fn new(
        latest: LatestSample,
        command_rx: mpsc::Receiver<SamplerCommand>,
        interval_duration: Duration,
    ) -> Self {
        let mut sys = System::new();
        // seed refresh so the first tick reports real cpu deltas
        sys.refresh_all();

        Self {
            sys,
            latest,
            command_rx,
            interval_duration,
        }
    }

    /// Run the actor's main loop
    ///
    /// This is the entry point for the actor. It runs until:
    /// - A Shutdown command is received
    /// - The command channel is closed
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting metrics sampler actor");

        let mut ticker = interval(self.interval_duration);

        loop {
            tokio::select! {
                // Timer tick - read host vitals
                _ = ticker.tick() => {
                    if let Err(e) = self.sample().await {
                        warn!("failed to read host vitals: {e:#}; keeping previous sample");
                    }
                }

                // Handle commands
                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        SamplerCommand::SampleNow { respond_to } => {
                            debug!("received SampleNow command");
                            let result = self.sample().await;
                            let _ = respond_to.send(result);
                        }

                        SamplerCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                // Command channel closed - exit
                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        debug!("metrics sampler actor stopped");
    }

    async fn sample(&mut self) -> Result<()> {
        let sample = self.read_sample()?;
        trace!(cpu = sample.cpu_load, "sampled host vitals");

        *self.latest.write().await = Some(sample);
        Ok(())
    }

    fn read_sample(&mut self) -> Result<MetricsSample> {
        self.sys.refresh_all();

        let cpus = self.sys.cpus();
        if cpus.is_empty() {
            anyhow::bail!("no CPUs reported by the system");
        }
        let cpu_load = cpus.iter().map(|cpu| cpu.cpu_usage()).sum::<f32>() / cpus.len() as f32;

        let load = System::load_average();

        Ok(MetricsSample {
            cpu_load,
            memory_used_bytes: self.sys.used_memory(),
            memory_total_bytes: self.sys.total_memory(),
            load_average: LoadAverage {
                one: load.one,
                five: load.five,
                fifteen: load.fifteen,
            },
            uptime_seconds: System::uptime(),
            timestamp: Utc::now(),
        })
    }
}

/// Handle for controlling a MetricsSamplerActor
#[derive(Clone)]
pub struct SamplerHandle {
    sender: mpsc::Sender<SamplerCommand>,
    latest: LatestSample,
}

impl SamplerHandle {
    /// Spawn a new sampler actor ticking at `sample_interval`
    pub fn spawn(sample_interval: Duration) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let latest: LatestSample = Arc::new(RwLock::new(None));

        let actor = MetricsSamplerActor::new(latest.clone(), cmd_rx, sample_interval);

        tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            latest,
        }
    }

    /// Shared cell the snapshot assembler reads from
    pub fn latest_cell(&self) -> LatestSample {
        self.latest.clone()
    }

    /// Most recent sample, if one has been taken yet
    pub async fn latest(&self) -> Option<MetricsSample> {
        self.latest.read().await.clone()
    }

    /// Take a sample immediately, bypassing the interval timer
    pub async fn sample_now(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SamplerCommand::SampleNow { respond_to: tx })
            .await
            .context("failed to send SampleNow command")?;

        rx.await.context("failed to receive response")??;
        Ok(())
    }

    /// Gracefully shut down the sampler
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(SamplerCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}
