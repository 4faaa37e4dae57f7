//! Test support utilities for scorelink.
//!
//! Provides an in-memory [`MemoryTransport`] so bridge behavior can be
//! verified deterministically, without a server: inbound frames are
//! scripted, outbound frames are captured, and the connection can be
//! flipped open or closed mid-test.

mod memory;

pub use memory::MemoryTransport;

use scorelink_proto::Frame;
use serde_json::json;

/// Build the `phx_reply` a server would send for `join` with `status`
/// (`"ok"` or `"error"`).
pub fn join_reply(join: &Frame, status: &str) -> Frame {
    Frame {
        join_ref: join.join_ref.clone(),
        reference: join.reference.clone(),
        topic: join.topic.clone(),
        event: scorelink_proto::events::PHX_REPLY.to_string(),
        payload: json!({ "status": status, "response": {} }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_reply_correlates() {
        let join = Frame::join("3", "score:1");
        let reply = join_reply(&join, "ok");
        assert!(reply.is_reply_to("3"));
        assert_eq!(reply.reply_status(), "ok");
        assert_eq!(reply.topic, "score:1");
    }
}
