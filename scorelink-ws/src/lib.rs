//! # scorelink-ws
//!
//! WebSocket transport for the scorelink bridge.
//!
//! ## Features
//!
//! - **RFC 6455 compliant**: Full WebSocket protocol support via tungstenite
//! - **Composable**: Implements the `Transport` trait so tests can swap in
//!   an in-memory transport
//! - **Non-blocking**: Designed to be polled from a host tick loop
//! - **Self-healing**: Owns its reconnect/backoff policy; callers never see
//!   a connection failure
//!
//! ## Example
//!
//! ```rust,ignore
//! use scorelink_ws::{endpoint_url, Transport, WsTransport};
//!
//! let url = endpoint_url("ws://localhost:4000/socket", "")?;
//! let mut transport = WsTransport::open(url);
//! transport.send(br#"["1","1","score:1","phx_join",{}]"#)?;
//! ```

mod error;
mod transport;

pub use error::{Result, WsError};
pub use transport::{endpoint_url, WsTransport};

// Tracing macros - no-op when feature disabled
#[cfg(feature = "tracing")]
macro_rules! trace_debug { ($($arg:tt)*) => { tracing::debug!($($arg)*) } }
#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug { ($($arg:tt)*) => {} }

#[cfg(feature = "tracing")]
macro_rules! trace_warn { ($($arg:tt)*) => { tracing::warn!($($arg)*) } }
#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn { ($($arg:tt)*) => {} }

pub(crate) use {trace_debug, trace_warn};

/// Transport trait - one bidirectional message pipe to the server.
pub trait Transport {
    /// Send one message, returns bytes sent
    fn send(&mut self, data: &[u8]) -> std::io::Result<usize>;

    /// Receive into callback, returns count received
    fn receive<F: FnMut(&[u8])>(&mut self, handler: F) -> usize;

    /// Flush pending operations
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    /// Check if connection is open
    fn is_open(&self) -> bool;

    /// Close the connection
    fn close(&mut self) -> std::io::Result<()>;
}
