//! Topic subscriptions and the join handshake.

use std::sync::Arc;

use parking_lot::Mutex;
use scorelink_proto::{events, Frame};
use scorelink_ws::Transport;
use serde_json::Value;

use crate::socket::SocketCore;
use crate::{trace_debug, trace_warn};

/// Join handshake state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelState {
    /// Join request sent, no reply yet.
    #[default]
    Pending,
    /// Join accepted.
    Joined,
    /// Join rejected, the send failed, or the channel was closed remotely.
    Errored,
}

/// Handler for one inbound event's payload.
pub type EventHandler = Box<dyn FnMut(&Value)>;

pub(crate) struct ChannelInner {
    pub(crate) state: ChannelState,
    handlers: Vec<(String, EventHandler)>,
}

impl ChannelInner {
    pub(crate) fn new() -> Self {
        Self { state: ChannelState::Pending, handlers: Vec::new() }
    }
}

/// The socket's routing view of a channel.
#[derive(Clone)]
pub(crate) struct ChannelHandle {
    topic: String,
    join_ref: String,
    inner: Arc<Mutex<ChannelInner>>,
}

impl ChannelHandle {
    pub(crate) fn new(topic: String, join_ref: String, inner: Arc<Mutex<ChannelInner>>) -> Self {
        Self { topic, join_ref, inner }
    }

    pub(crate) fn topic(&self) -> &str {
        &self.topic
    }

    /// Apply one inbound frame for this channel's topic.
    pub(crate) fn deliver(&self, frame: &Frame) {
        if frame.is_reply_to(&self.join_ref) {
            let ok = frame.reply_status() == "ok";
            self.inner.lock().state = if ok {
                trace_debug!("joined '{}'", self.topic);
                ChannelState::Joined
            } else {
                trace_warn!("join of '{}' rejected: {}", self.topic, frame.payload);
                ChannelState::Errored
            };
            return;
        }

        match frame.event.as_str() {
            // Replies to pushes are diagnostics only.
            events::PHX_REPLY => {
                trace_debug!("push reply on '{}': {}", self.topic, frame.reply_status());
            }
            events::PHX_ERROR | events::PHX_CLOSE => {
                trace_warn!("channel '{}' closed by remote ({})", self.topic, frame.event);
                self.inner.lock().state = ChannelState::Errored;
            }
            _ => {
                let mut inner = self.inner.lock();
                for (_, handler) in inner
                    .handlers
                    .iter_mut()
                    .filter(|(event, _)| *event == frame.event)
                {
                    handler(&frame.payload);
                }
            }
        }
    }
}

/// One joined topic on a socket.
///
/// Cheap to clone; clones share handlers and join state.
pub struct Channel<T: Transport> {
    topic: String,
    join_ref: String,
    socket: Arc<Mutex<SocketCore<T>>>,
    inner: Arc<Mutex<ChannelInner>>,
}

impl<T: Transport> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            topic: self.topic.clone(),
            join_ref: self.join_ref.clone(),
            socket: self.socket.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<T: Transport> Channel<T> {
    pub(crate) fn new(
        topic: String,
        join_ref: String,
        socket: Arc<Mutex<SocketCore<T>>>,
        inner: Arc<Mutex<ChannelInner>>,
    ) -> Self {
        Self { topic, join_ref, socket, inner }
    }

    /// The channel's topic name.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Current join state.
    pub fn state(&self) -> ChannelState {
        self.inner.lock().state
    }

    /// Fire-and-forget publish on this topic.
    ///
    /// No acknowledgement is awaited; the remote's reply, if any, is logged
    /// by the pump. The returned error only reports a local send failure.
    pub fn push(&self, event: &str, payload: Value) -> crate::Result<()> {
        let mut core = self.socket.lock();
        let reference = core.next_ref();
        core.send_frame(&Frame::new(
            self.join_ref.clone(),
            reference,
            self.topic.clone(),
            event,
            payload,
        ))
    }

    /// Register `handler` for every inbound `event` on this topic, for the
    /// lifetime of the subscription.
    ///
    /// Payloads are handed over unvalidated; interpreting them is the
    /// caller's job.
    pub fn on(&self, event: impl Into<String>, handler: EventHandler) {
        self.inner.lock().handlers.push((event.into(), handler));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket::{Socket, SocketConfig};
    use scorelink_test_support::MemoryTransport;
    use serde_json::json;
    use std::time::Duration;

    fn socket_pair() -> (MemoryTransport, Socket<MemoryTransport>) {
        let transport = MemoryTransport::new();
        let config = SocketConfig {
            heartbeat_interval: Duration::ZERO,
            ..SocketConfig::default()
        };
        let socket = Socket::with_transport(&config, transport.clone());
        (transport, socket)
    }

    #[test]
    fn test_push_carries_join_ref_and_fresh_ref() {
        let (transport, socket) = socket_pair();
        let channel = socket.channel("score:1");
        channel.push("broadcast_score", json!({"player_score": 10})).unwrap();

        let sent = transport.sent_frames();
        assert_eq!(sent.len(), 2);
        let join = &sent[0];
        let push = &sent[1];
        assert_eq!(push.join_ref, join.join_ref);
        assert_ne!(push.reference, join.reference);
        assert_eq!(push.payload, json!({"player_score": 10}));
    }

    #[test]
    fn test_on_receives_matching_events_only() {
        let (transport, socket) = socket_pair();
        let channel = socket.channel("score:1");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        channel.on("broadcast_score", Box::new(move |payload| {
            sink.lock().push(payload.clone());
        }));

        transport.push_inbound(&Frame {
            join_ref: None,
            reference: None,
            topic: "score:1".to_string(),
            event: "broadcast_score".to_string(),
            payload: json!({"player_score": 3}),
        });
        transport.push_inbound(&Frame {
            join_ref: None,
            reference: None,
            topic: "score:1".to_string(),
            event: "save_score".to_string(),
            payload: json!({"player_score": 4}),
        });
        socket.pump();

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], json!({"player_score": 3}));
    }

    #[test]
    fn test_handler_may_push_back() {
        let (transport, socket) = socket_pair();
        let channel = socket.channel("score:1");
        let echo = channel.clone();
        channel.on("broadcast_score", Box::new(move |payload| {
            let _ = echo.push("save_score", payload.clone());
        }));

        transport.push_inbound(&Frame {
            join_ref: None,
            reference: None,
            topic: "score:1".to_string(),
            event: "broadcast_score".to_string(),
            payload: json!({"player_score": 9}),
        });
        socket.pump();

        let sent = transport.sent_frames();
        assert_eq!(sent.last().unwrap().event, "save_score");
    }

    #[test]
    fn test_remote_close_errors_channel() {
        let (transport, socket) = socket_pair();
        let channel = socket.channel("score:1");
        transport.push_inbound(&Frame {
            join_ref: None,
            reference: None,
            topic: "score:1".to_string(),
            event: events::PHX_ERROR.to_string(),
            payload: json!({}),
        });
        socket.pump();
        assert_eq!(channel.state(), ChannelState::Errored);
    }
}
