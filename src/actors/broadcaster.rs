//! BroadcastActor - pushes live snapshots to connected clients
//!
//! Owns the set of connected live-update channels. On every tick the latest
//! snapshot goes out to all of them; clients that went away (or stopped
//! draining their channel) are dropped from the set without disturbing the
//! rest. New connections get one snapshot immediately instead of waiting a
//! full interval.
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → assemble snapshot → try_send to every client → prune dead ones
//!     ↑
//!     └─── Commands (Connect, Disconnect, BroadcastNow, Shutdown)
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::time::interval;
use tracing::{debug, instrument, trace, warn};

use crate::Snapshot;
use crate::snapshot::SnapshotAssembler;

use super::messages::BroadcastCommand;

/// Per-client channel capacity. A client lagging this far behind is treated
/// as gone.
const CLIENT_CHANNEL_CAPACITY: usize = 8;

/// One connected live-update client
#[derive(Debug)]
pub struct LiveClient {
    pub id: u64,
    /// Snapshot pushes; closed once the client is dropped from the set
    pub updates: mpsc::Receiver<Snapshot>,
}

/// Actor that owns the broadcast set and the push cadence
pub struct BroadcastActor {
    assembler: Arc<SnapshotAssembler>,

    /// Connected clients by id
    clients: HashMap<u64, mpsc::Sender<Snapshot>>,
    next_client_id: u64,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<BroadcastCommand>,

    interval_duration: Duration,
}

impl BroadcastActor {
    fn new(
        assembler: Arc<SnapshotAssembler>,
        command_rx: mpsc::Receiver<BroadcastCommand>,
        interval_duration: Duration,
    ) -> Self {
        Self {
            assembler,
            clients: HashMap::new(),
            next_client_id: 0,
            command_rx,
            interval_duration,
        }
    }

    /// Run the actor's main loop
    ///
    /// Connect/disconnect arriving during a broadcast tick is serialized by
    /// this loop, so the set is never mutated mid-delivery.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting broadcast actor");

        let mut ticker = interval(self.interval_duration);

        loop {
            tokio::select! {
                // Timer tick - push the latest snapshot to everyone
                _ = ticker.tick() => {
                    self.broadcast().await;
                }

                // Handle commands
                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        BroadcastCommand::Connect { respond_to } => {
                            let client = self.connect().await;
                            let _ = respond_to.send(client);
                        }

                        BroadcastCommand::Disconnect { client_id } => {
                            debug!("removing client {client_id}");
                            self.clients.remove(&client_id);
                        }

                        BroadcastCommand::BroadcastNow { respond_to } => {
                            debug!("received BroadcastNow command");
                            self.broadcast().await;
                            let _ = respond_to.send(());
                        }

                        BroadcastCommand::Shutdown => {
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

        debug!("broadcast actor stopped");
    }

    async fn connect(&mut self) -> LiveClient {
        let (tx, rx) = mpsc::channel(CLIENT_CHANNEL_CAPACITY);
        let id = self.next_client_id;
        self.next_client_id += 1;

        // the dashboard renders from this first push; the next tick only
        // refreshes it
        let snapshot = self.assembler.assemble().await;
        let _ = tx.try_send(snapshot);

        self.clients.insert(id, tx);
        debug!("client {id} connected ({} total)", self.clients.len());

        LiveClient { id, updates: rx }
    }

    async fn broadcast(&mut self) {
        if self.clients.is_empty() {
            return;
        }

        let snapshot = self.assembler.assemble().await;
        let before = self.clients.len();

        // try_send never blocks: one slow or closed client cannot stall the
        // tick or delivery to the others
        self.clients.retain(|id, tx| match tx.try_send(snapshot.clone()) {
            Ok(()) => true,
            Err(e) => {
                debug!("dropping client {id}: {e}");
                false
            }
        });

        trace!(
            "broadcast snapshot to {} clients ({} dropped)",
            self.clients.len(),
            before - self.clients.len()
        );
    }
}

/// Handle for controlling a BroadcastActor
#[derive(Clone)]
pub struct BroadcastHandle {
    sender: mpsc::Sender<BroadcastCommand>,
}

impl BroadcastHandle {
    /// Spawn a new broadcast actor ticking at `broadcast_interval`
    pub fn spawn(assembler: Arc<SnapshotAssembler>, broadcast_interval: Duration) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = BroadcastActor::new(assembler, cmd_rx, broadcast_interval);

        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Register a new live-update client
    ///
    /// The returned client already has one snapshot queued.
    pub async fn connect(&self) -> Result<LiveClient> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(BroadcastCommand::Connect { respond_to: tx })
            .await
            .context("failed to send Connect command")?;

        rx.await.context("failed to receive client registration")
    }

    /// Remove a client from the broadcast set
    pub async fn disconnect(&self, client_id: u64) -> Result<()> {
        self.sender
            .send(BroadcastCommand::Disconnect { client_id })
            .await
            .context("failed to send Disconnect command")?;
        Ok(())
    }

    /// Push the latest snapshot to every client immediately
    pub async fn broadcast_now(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(BroadcastCommand::BroadcastNow { respond_to: tx })
            .await
            .context("failed to send BroadcastNow command")?;

        rx.await.context("failed to receive response")?;
        Ok(())
    }

    /// Gracefully shut down the broadcaster
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(BroadcastCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}
