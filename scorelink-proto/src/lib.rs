//! # scorelink-proto
//!
//! Shared channel protocol types for scorelink.
//!
//! This crate provides the wire-level types used by both the bridge core
//! and test harnesses:
//!
//! - [`Frame`]: Phoenix-style channel frame (`[join_ref, ref, topic, event, payload]`)
//! - [`ScoreEvent`]: the score payload exchanged in both directions
//! - Well-known event names and the `score:<game-id>` topic helper
//!
//! ## Layer Diagram
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ scorelink (Bridge Layer)                │
//! │ - Socket, Channel, PortBridge (wiring)  │
//! └────────────────────┬────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────┐
//! │ scorelink-proto (Wire Layer)            │
//! │ - Frame, ScoreEvent (JSON)              │  ← This crate
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use scorelink_proto::{Frame, score_topic, events};
//!
//! let frame = Frame::join("1", score_topic(1));
//! assert_eq!(frame.event, events::PHX_JOIN);
//! let raw = frame.encode();
//! assert_eq!(Frame::decode(&raw).unwrap().topic, "score:1");
//! ```

mod frame;
mod score;

pub use frame::Frame;
pub use score::ScoreEvent;

/// Well-known channel event names.
pub mod events {
    /// Topic join request.
    pub const PHX_JOIN: &str = "phx_join";
    /// Reply to a referenced request (`status: "ok" | "error"`).
    pub const PHX_REPLY: &str = "phx_reply";
    /// Channel terminated with an error.
    pub const PHX_ERROR: &str = "phx_error";
    /// Channel closed by the remote.
    pub const PHX_CLOSE: &str = "phx_close";
    /// Socket keepalive, sent on [`PHOENIX_TOPIC`](super::PHOENIX_TOPIC).
    pub const HEARTBEAT: &str = "heartbeat";
    /// A client broadcast a live score.
    pub const BROADCAST_SCORE: &str = "broadcast_score";
    /// A client asked for a score to be persisted.
    pub const SAVE_SCORE: &str = "save_score";
}

/// Reserved topic for socket-level control frames (heartbeats).
pub const PHOENIX_TOPIC: &str = "phoenix";

/// Topic name for a game's score channel.
#[inline]
pub fn score_topic(game_id: i64) -> String {
    format!("score:{game_id}")
}
