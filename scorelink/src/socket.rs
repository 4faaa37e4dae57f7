//! Socket connection management and the frame pump.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use scorelink_proto::Frame;
use scorelink_ws::{endpoint_url, Transport, WsTransport};

use crate::channel::{Channel, ChannelHandle, ChannelInner, ChannelState};
use crate::{trace_debug, trace_warn};

/// Socket configuration.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// Channel endpoint, e.g. `ws://localhost:4000/socket`.
    pub endpoint: String,
    /// Player token. Empty means anonymous: no credential is sent at all.
    pub token: String,
    /// Keepalive cadence on the reserved `phoenix` topic. Zero disables.
    pub heartbeat_interval: Duration,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:4000/socket".to_string(),
            token: String::new(),
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SocketState {
    /// No connection attempt has been made.
    #[default]
    Disconnected,
    /// A connection attempt is in flight (or queued behind backoff).
    Connecting,
    /// The transport is open.
    Connected,
    /// The transport dropped; its retry policy owns recovery.
    Failed,
}

pub(crate) struct SocketCore<T: Transport> {
    transport: T,
    state: SocketState,
    next_ref: u64,
    heartbeat_interval: Duration,
    last_heartbeat_at: Instant,
    channels: Vec<ChannelHandle>,
}

impl<T: Transport> SocketCore<T> {
    pub(crate) fn next_ref(&mut self) -> String {
        let next = self.next_ref;
        self.next_ref += 1;
        next.to_string()
    }

    pub(crate) fn send_frame(&mut self, frame: &Frame) -> crate::Result<()> {
        trace_debug!("-> {} {} on {}", frame.event, frame.encode(), frame.topic);
        self.transport.send(frame.encode().as_bytes())?;
        Ok(())
    }
}

/// One transport session, shared by every channel on the page.
///
/// Cheap to clone; clones refer to the same underlying connection.
pub struct Socket<T: Transport> {
    core: Arc<Mutex<SocketCore<T>>>,
}

impl<T: Transport> Clone for Socket<T> {
    fn clone(&self) -> Self {
        Self { core: self.core.clone() }
    }
}

impl Socket<WsTransport> {
    /// Open a WebSocket connection per `config`.
    ///
    /// Connecting is eager but failure is not surfaced: a server that is
    /// down leaves the transport in its retry loop. The only error here is
    /// a malformed endpoint.
    pub fn connect(config: &SocketConfig) -> crate::Result<Self> {
        let url = endpoint_url(&config.endpoint, &config.token)?;
        Ok(Self::with_transport(config, WsTransport::open(url)))
    }
}

impl<T: Transport> Socket<T> {
    /// Wrap an already-constructed transport.
    pub fn with_transport(config: &SocketConfig, transport: T) -> Self {
        let state = if transport.is_open() {
            SocketState::Connected
        } else {
            SocketState::Connecting
        };
        Self {
            core: Arc::new(Mutex::new(SocketCore {
                transport,
                state,
                next_ref: 1,
                heartbeat_interval: config.heartbeat_interval,
                last_heartbeat_at: Instant::now(),
                channels: Vec::new(),
            })),
        }
    }

    /// Current connection state.
    pub fn state(&self) -> SocketState {
        self.core.lock().state
    }

    /// Join `topic`, returning the channel immediately.
    ///
    /// The `phx_join` request (empty payload) goes out now; the join outcome
    /// arrives through [`pump`](Self::pump). Callers register their event
    /// handlers right away, before the outcome, so nothing that arrives
    /// concurrently with the handshake is lost. A join request the transport
    /// cannot even send moves the channel straight to errored; there is no
    /// retry at this layer.
    pub fn channel(&self, topic: impl Into<String>) -> Channel<T> {
        let topic = topic.into();
        let mut core = self.core.lock();
        let join_ref = core.next_ref();
        let inner = Arc::new(Mutex::new(ChannelInner::new()));
        core.channels.push(ChannelHandle::new(
            topic.clone(),
            join_ref.clone(),
            inner.clone(),
        ));

        if let Err(_e) = core.send_frame(&Frame::join(&join_ref, &topic)) {
            trace_warn!("join request for '{topic}' failed to send: {_e}");
            inner.lock().state = ChannelState::Errored;
        }
        drop(core);

        Channel::new(topic, join_ref, self.core.clone(), inner)
    }

    /// Drain the transport and dispatch inbound frames.
    ///
    /// Call once per host tick. Handlers run to completion on the calling
    /// thread, one frame at a time.
    pub fn pump(&self) {
        let (frames, handles) = {
            let mut core = self.core.lock();

            let mut frames: Vec<Frame> = Vec::new();
            core.transport.receive(|bytes| {
                let Ok(text) = std::str::from_utf8(bytes) else {
                    trace_debug!("discarding non-utf8 frame ({} bytes)", bytes.len());
                    return;
                };
                match Frame::decode(text) {
                    Some(frame) => frames.push(frame),
                    None => trace_debug!("discarding undecodable frame: {text}"),
                }
            });

            core.state = match (core.transport.is_open(), core.state) {
                (true, _) => SocketState::Connected,
                (false, SocketState::Connected) => SocketState::Failed,
                (false, other) => other,
            };

            if !core.heartbeat_interval.is_zero()
                && core.state == SocketState::Connected
                && core.last_heartbeat_at.elapsed() >= core.heartbeat_interval
            {
                let reference = core.next_ref();
                if let Err(_e) = core.send_frame(&Frame::heartbeat(reference)) {
                    trace_warn!("heartbeat failed to send: {_e}");
                }
                core.last_heartbeat_at = Instant::now();
            }

            (frames, core.channels.clone())
        };

        // Dispatch with the socket unlocked so handlers can push.
        for frame in frames {
            let mut routed = false;
            for handle in handles.iter().filter(|h| h.topic() == frame.topic) {
                handle.deliver(&frame);
                routed = true;
            }
            if !routed && frame.topic != scorelink_proto::PHOENIX_TOPIC {
                trace_debug!("no channel for topic '{}', dropping {}", frame.topic, frame.event);
            }
        }
    }
}
