//! Port-to-channel translation.
//!
//! The bridge sits between the embedded UI component's named ports and one
//! score channel. Trust is asymmetric: outbound port payloads come from code
//! we control and pass through verbatim, inbound network payloads come from
//! other clients and are defaulted field-by-field before they touch the
//! UI's typed boundary.

use std::sync::Arc;

use parking_lot::Mutex;
use scorelink_proto::{events, ScoreEvent};
use scorelink_ws::Transport;
use serde_json::json;

use crate::channel::Channel;
use crate::trace_warn;

/// Handler for an outbound UI port emission. The payload is the raw score
/// the component emitted.
pub type PortHandler = Box<dyn FnMut(i64)>;

/// The embedded game component's port boundary.
///
/// Port names and payload shapes are fixed at component build time; the
/// bridge matches them exactly (`broadcastScore`, `saveScore`,
/// `receiveScoreFromPhoenix`).
pub trait GameUi {
    /// Register the handler for the `broadcastScore` outbound port.
    fn on_broadcast_score(&mut self, handler: PortHandler);

    /// Register the handler for the `saveScore` outbound port.
    ///
    /// Persistence is version-dependent: components without the port keep
    /// this default, which drops the handler, and no `save_score` publish
    /// can ever happen for them.
    fn on_save_score(&mut self, handler: PortHandler) {
        let _ = handler;
    }

    /// The `receiveScoreFromPhoenix` inbound port.
    fn receive_score(&mut self, event: ScoreEvent);
}

/// One-to-one wiring between a UI component's ports and its score channel.
pub struct PortBridge<T: Transport> {
    channel: Channel<T>,
}

impl<T: Transport + 'static> PortBridge<T> {
    /// Wire `ui` to `channel`.
    ///
    /// All wiring happens here, synchronously, so it is in place before any
    /// pump can deliver the join confirmation; events racing the handshake
    /// are not lost. Publish failures are logged and swallowed - the UI
    /// keeps running without live sync.
    pub fn wire(channel: Channel<T>, ui: Arc<Mutex<dyn GameUi>>) -> Self {
        let outbound = channel.clone();
        ui.lock().on_broadcast_score(Box::new(move |score| {
            if let Err(_e) = outbound.push(events::BROADCAST_SCORE, json!({ "player_score": score })) {
                trace_warn!("broadcast_score publish failed: {_e}");
            }
        }));

        let outbound = channel.clone();
        ui.lock().on_save_score(Box::new(move |score| {
            if let Err(_e) = outbound.push(events::SAVE_SCORE, json!({ "player_score": score })) {
                trace_warn!("save_score publish failed: {_e}");
            }
        }));

        let inbound_ui = ui.clone();
        channel.on(
            events::BROADCAST_SCORE,
            Box::new(move |payload| {
                inbound_ui.lock().receive_score(ScoreEvent::from_untrusted(payload));
            }),
        );

        Self { channel }
    }

    /// The channel this bridge publishes on.
    pub fn channel(&self) -> &Channel<T> {
        &self.channel
    }
}
