//! Actor tasks behind the dashboard core
//!
//! Each long-running concern runs as an independent async task owned by a
//! typed handle and controlled via a command channel.
//!
//! ## Actor Types
//!
//! - **MetricsSamplerActor**: samples host vitals on a fixed period and keeps
//!   the latest-sample cell fresh
//! - **BroadcastActor**: pushes the latest snapshot to every connected
//!   live-update client on each tick
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: each actor has an mpsc command channel for control messages
//! 2. **Push channels**: the broadcaster feeds every connected client through
//!    its own bounded mpsc channel
//! 3. **Request/Response**: oneshot channels for synchronous queries

pub mod broadcaster;
pub mod messages;
pub mod sampler;
