//! # scorelink
//!
//! Real-time bridge between an embedded game UI and a server-side score
//! channel.
//!
//! ## Features
//!
//! - **Connection manager**: one shared socket per page, opened eagerly,
//!   optional player token, failures absorbed by the transport's own retry
//! - **Channel subscription**: join handshake per `score:<game-id>` topic
//!   with fire-and-forget publishes and per-event subscriptions
//! - **Port bridge**: translates the UI's outbound score ports into channel
//!   publishes and inbound channel events into the UI's receive port, with
//!   defensive defaulting of malformed inbound payloads
//! - **Host wiring**: a capability table of optional UI surfaces; a surface
//!   whose mount point is absent costs nothing
//!
//! ## Pump Model
//!
//! Everything runs on the host's single-threaded tick loop. `connect` and
//! `join` return immediately; outcomes arrive asynchronously when the host
//! calls [`Host::pump`] (or [`Socket::pump`]), which drains the transport
//! and runs registered handlers to completion, one frame at a time.
//!
//! ## Example
//!
//! ```rust,ignore
//! use scorelink::{Host, SocketConfig, StaticProbe, Surface};
//!
//! let probe = StaticProbe::new(["platformer"]);
//! let surfaces = vec![
//!     Surface::new("platformer", 1, Box::new(|token| make_platformer_ui(token)))
//!         .with_player_identity(),
//! ];
//! let host = Host::wire_ws(&probe, surfaces, &SocketConfig::default())?;
//! loop {
//!     host.pump();
//!     // ... advance the game ...
//! }
//! ```

mod bridge;
mod channel;
mod error;
mod host;
mod socket;

pub use bridge::{GameUi, PortBridge, PortHandler};
pub use channel::{Channel, ChannelState, EventHandler};
pub use error::{BridgeError, Result};
pub use host::{Host, MountProbe, StaticProbe, Surface, UiFactory};
pub use socket::{Socket, SocketConfig, SocketState};

pub use scorelink_proto::{events, score_topic, Frame, ScoreEvent};
pub use scorelink_ws::{Transport, WsTransport};

// Tracing macros - no-op when feature disabled
#[cfg(feature = "tracing")]
macro_rules! trace_debug { ($($arg:tt)*) => { tracing::debug!($($arg)*) } }
#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug { ($($arg:tt)*) => { () } }

#[cfg(feature = "tracing")]
macro_rules! trace_warn { ($($arg:tt)*) => { tracing::warn!($($arg)*) } }
#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn { ($($arg:tt)*) => { () } }

pub(crate) use {trace_debug, trace_warn};
