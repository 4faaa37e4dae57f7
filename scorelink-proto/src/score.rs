//! The score payload exchanged over a game's channel.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A score event as delivered to the UI component.
///
/// Every field is always present. Payloads built from the UI side carry its
/// values verbatim; payloads built from the network go through
/// [`ScoreEvent::from_untrusted`], which fills gaps with `0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEvent {
    pub game_id: i64,
    pub player_id: i64,
    pub player_score: i64,
}

impl ScoreEvent {
    /// Parse a payload that crossed the trust boundary.
    ///
    /// Inbound payloads come from other clients or the server and may be
    /// missing fields or carry junk. Each field is taken as an integer when
    /// it is one and defaults to `0` otherwise, so the UI's strongly-typed
    /// boundary never sees an absent field. A present `0` and an absent
    /// field are indistinguishable on purpose.
    pub fn from_untrusted(payload: &Value) -> Self {
        Self {
            game_id: int_field(payload, "game_id"),
            player_id: int_field(payload, "player_id"),
            player_score: int_field(payload, "player_score"),
        }
    }
}

#[inline]
fn int_field(payload: &Value, key: &str) -> i64 {
    payload.get(key).and_then(Value::as_i64).unwrap_or(0)
}
