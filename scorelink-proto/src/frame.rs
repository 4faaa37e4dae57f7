//! Channel frame encoding and decoding.
//!
//! Frames follow the Phoenix V2 serializer: a five-element JSON array
//! `[join_ref, ref, topic, event, payload]` where the two refs may be null.

use serde_json::{json, Value};

use crate::events;

/// One channel frame, in either direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Ref of the join that opened the frame's channel, if any.
    pub join_ref: Option<String>,
    /// Per-request ref used to correlate replies.
    pub reference: Option<String>,
    /// Topic the frame belongs to.
    pub topic: String,
    /// Event name.
    pub event: String,
    /// Event payload.
    pub payload: Value,
}

impl Frame {
    /// Create a frame with both refs set.
    pub fn new(
        join_ref: impl Into<String>,
        reference: impl Into<String>,
        topic: impl Into<String>,
        event: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            join_ref: Some(join_ref.into()),
            reference: Some(reference.into()),
            topic: topic.into(),
            event: event.into(),
            payload,
        }
    }

    /// Create a `phx_join` request with an empty payload.
    ///
    /// The join ref doubles as the request ref, matching how Phoenix
    /// clients open a channel.
    pub fn join(join_ref: impl Into<String>, topic: impl Into<String>) -> Self {
        let join_ref = join_ref.into();
        Self {
            join_ref: Some(join_ref.clone()),
            reference: Some(join_ref),
            topic: topic.into(),
            event: events::PHX_JOIN.to_string(),
            payload: json!({}),
        }
    }

    /// Create a socket heartbeat frame.
    pub fn heartbeat(reference: impl Into<String>) -> Self {
        Self {
            join_ref: None,
            reference: Some(reference.into()),
            topic: crate::PHOENIX_TOPIC.to_string(),
            event: events::HEARTBEAT.to_string(),
            payload: json!({}),
        }
    }

    /// `true` if this is a `phx_reply` correlated with `reference`.
    #[inline]
    pub fn is_reply_to(&self, reference: &str) -> bool {
        self.event == events::PHX_REPLY && self.reference.as_deref() == Some(reference)
    }

    /// Reply status (`"ok"` / `"error"`); anything malformed reads as error.
    pub fn reply_status(&self) -> &str {
        self.payload
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("error")
    }

    /// Serialize to the wire format.
    pub fn encode(&self) -> String {
        let array = json!([
            self.join_ref,
            self.reference,
            self.topic,
            self.event,
            self.payload,
        ]);
        array.to_string()
    }

    /// Parse a frame from raw text.
    ///
    /// Returns `None` for anything that is not a five-element array with
    /// string topic and event. Unknown payload shapes are kept as-is;
    /// interpreting them is the bridge's job.
    pub fn decode(raw: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(raw).ok()?;
        let parts = value.as_array()?;
        if parts.len() != 5 {
            return None;
        }
        let as_opt_string = |v: &Value| match v {
            Value::Null => Some(None),
            Value::String(s) => Some(Some(s.clone())),
            _ => None,
        };
        Some(Self {
            join_ref: as_opt_string(&parts[0])?,
            reference: as_opt_string(&parts[1])?,
            topic: parts[2].as_str()?.to_string(),
            event: parts[3].as_str()?.to_string(),
            payload: parts[4].clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        let frame = Frame::new("1", "2", "score:1", "broadcast_score", json!({"player_score": 42}));
        let decoded = Frame::decode(&frame.encode()).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_join_frame_shape() {
        let frame = Frame::join("7", "score:3");
        assert_eq!(frame.event, events::PHX_JOIN);
        assert_eq!(frame.join_ref.as_deref(), Some("7"));
        assert_eq!(frame.reference.as_deref(), Some("7"));
        assert_eq!(frame.payload, json!({}));
    }

    #[test]
    fn test_decode_null_refs() {
        let frame = Frame::decode(r#"[null,null,"score:1","broadcast_score",{}]"#).unwrap();
        assert_eq!(frame.join_ref, None);
        assert_eq!(frame.reference, None);
        assert_eq!(frame.topic, "score:1");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(Frame::decode("not json").is_none());
        assert!(Frame::decode(r#"{"topic":"score:1"}"#).is_none());
        assert!(Frame::decode(r#"[null,null,"score:1","ev"]"#).is_none());
        assert!(Frame::decode(r#"[3,null,"score:1","ev",{}]"#).is_none());
    }

    #[test]
    fn test_reply_correlation() {
        let frame = Frame::decode(r#"["1","4","score:1","phx_reply",{"status":"ok","response":{}}]"#)
            .unwrap();
        assert!(frame.is_reply_to("4"));
        assert!(!frame.is_reply_to("5"));
        assert_eq!(frame.reply_status(), "ok");
    }

    #[test]
    fn test_reply_status_defaults_to_error() {
        let frame = Frame::decode(r#"["1","4","score:1","phx_reply",{}]"#).unwrap();
        assert_eq!(frame.reply_status(), "error");
        let frame = Frame::decode(r#"["1","4","score:1","phx_reply",null]"#).unwrap();
        assert_eq!(frame.reply_status(), "error");
    }
}
