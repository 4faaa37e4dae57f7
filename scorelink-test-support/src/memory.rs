//! In-memory transport backed by shared queues.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use scorelink_proto::Frame;
use scorelink_ws::Transport;

#[derive(Default)]
struct Shared {
    inbound: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    open: bool,
    closed_by_client: bool,
}

/// Scriptable in-memory transport.
///
/// Clones share the same queues, so a test can hand one clone to the socket
/// and keep another to script the server side.
#[derive(Clone)]
pub struct MemoryTransport {
    shared: Arc<Mutex<Shared>>,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    /// New transport, initially open.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                open: true,
                ..Shared::default()
            })),
        }
    }

    /// Script one inbound frame, delivered on the next `receive`.
    pub fn push_inbound(&self, frame: &Frame) {
        self.push_inbound_raw(frame.encode().into_bytes());
    }

    /// Script raw inbound bytes (for malformed-input tests).
    pub fn push_inbound_raw(&self, bytes: Vec<u8>) {
        self.shared.lock().inbound.push_back(bytes);
    }

    /// Everything sent so far, decoded. Panics on undecodable output -
    /// the client must only ever send well-formed frames.
    pub fn sent_frames(&self) -> Vec<Frame> {
        self.shared
            .lock()
            .sent
            .iter()
            .map(|bytes| {
                let text = std::str::from_utf8(bytes).expect("client sent non-utf8");
                Frame::decode(text).expect("client sent undecodable frame")
            })
            .collect()
    }

    /// Everything sent so far, raw.
    pub fn sent_raw(&self) -> Vec<Vec<u8>> {
        self.shared.lock().sent.clone()
    }

    /// Simulate the connection dropping (`false`) or recovering (`true`).
    pub fn set_open(&self, open: bool) {
        self.shared.lock().open = open;
    }

    /// `true` once the client called `close`.
    pub fn closed_by_client(&self) -> bool {
        self.shared.lock().closed_by_client
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut shared = self.shared.lock();
        if !shared.open {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "not connected"));
        }
        shared.sent.push(data.to_vec());
        Ok(data.len())
    }

    fn receive<F: FnMut(&[u8])>(&mut self, mut handler: F) -> usize {
        let mut count = 0;
        loop {
            // Re-lock per message so handlers can send from the callback.
            let Some(bytes) = ({
                let mut shared = self.shared.lock();
                if !shared.open {
                    None
                } else {
                    shared.inbound.pop_front()
                }
            }) else {
                break;
            };
            handler(&bytes);
            count += 1;
        }
        count
    }

    fn is_open(&self) -> bool {
        self.shared.lock().open
    }

    fn close(&mut self) -> io::Result<()> {
        let mut shared = self.shared.lock();
        shared.open = false;
        shared.closed_by_client = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_send_and_capture() {
        let mut transport = MemoryTransport::new();
        let frame = Frame::join("1", "score:1");
        transport.send(frame.encode().as_bytes()).unwrap();
        assert_eq!(transport.sent_frames(), vec![frame]);
    }

    #[test]
    fn test_scripted_inbound_delivery() {
        let mut transport = MemoryTransport::new();
        let handle = transport.clone();
        handle.push_inbound(&Frame {
            join_ref: None,
            reference: None,
            topic: "score:1".to_string(),
            event: "broadcast_score".to_string(),
            payload: json!({"player_score": 1}),
        });

        let mut seen = Vec::new();
        let count = transport.receive(|bytes| seen.push(bytes.to_vec()));
        assert_eq!(count, 1);
        assert_eq!(seen.len(), 1);
        // Queue drained.
        assert_eq!(transport.receive(|_| {}), 0);
    }

    #[test]
    fn test_closed_transport_rejects_send() {
        let mut transport = MemoryTransport::new();
        transport.set_open(false);
        assert!(transport.send(b"x").is_err());
        assert_eq!(transport.receive(|_| {}), 0);
    }

    #[test]
    fn test_close_is_recorded() {
        let mut transport = MemoryTransport::new();
        let handle = transport.clone();
        transport.close().unwrap();
        assert!(!handle.is_open());
        assert!(handle.closed_by_client());
    }
}
