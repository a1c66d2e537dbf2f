//! Command types for actor control channels

use tokio::sync::oneshot;

use super::broadcaster::LiveClient;

/// Commands that can be sent to the MetricsSamplerActor
#[derive(Debug)]
pub enum SamplerCommand {
    /// Take a sample immediately, bypassing the interval timer
    SampleNow {
        /// Channel to send the result back
        respond_to: oneshot::Sender<anyhow::Result<()>>,
    },

    /// Gracefully shut down the sampler
    Shutdown,
}

/// Commands that can be sent to the BroadcastActor
#[derive(Debug)]
pub enum BroadcastCommand {
    /// Register a new live-update client
    ///
    /// The client receives one snapshot immediately instead of waiting for
    /// the next broadcast tick.
    Connect {
        respond_to: oneshot::Sender<LiveClient>,
    },

    /// Remove a client from the broadcast set
    Disconnect { client_id: u64 },

    /// Push the latest snapshot to every client now (bypasses the ticker)
    ///
    /// Used for testing and manual refresh operations.
    BroadcastNow { respond_to: oneshot::Sender<()> },

    /// Gracefully shut down the broadcaster
    Shutdown,
}
