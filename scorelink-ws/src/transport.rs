//! WebSocket transport implementation.

use std::io;
use std::net::TcpStream;
use std::time::{Duration, Instant};

use tungstenite::protocol::WebSocket;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{client, Message};

use crate::{trace_debug, trace_warn, Transport, WsError};

/// Base delay before the first reconnect attempt.
const RECONNECT_BASE_DELAY_MS: u64 = 500;
/// Ceiling for the reconnect delay.
const RECONNECT_MAX_DELAY_MS: u64 = 30_000;

type ClientSocket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Build the full connect URL for a channel endpoint.
///
/// `token` is the player's credential; when it is empty no `token` query
/// parameter is sent at all rather than a meaningless `token=`.
pub fn endpoint_url(endpoint: &str, token: &str) -> crate::Result<String> {
    let endpoint = endpoint.trim_end_matches('/');
    if !endpoint.starts_with("ws://") && !endpoint.starts_with("wss://") {
        return Err(WsError::invalid_url(endpoint));
    }

    let mut url = format!("{endpoint}/websocket?vsn=2.0.0");
    if !token.is_empty() {
        url.push_str("&token=");
        url.push_str(token);
    }
    Ok(url)
}

/// Non-blocking WebSocket client transport.
///
/// Connection failures are absorbed here: a transport that cannot reach the
/// server keeps retrying with exponential backoff every time it is polled,
/// and reports `is_open() == false` in the meantime. Only an explicit
/// [`close`](Transport::close) is terminal.
pub struct WsTransport {
    url: String,
    ws: Option<ClientSocket>,
    closed: bool,
    attempts: u32,
    next_retry_at: Instant,
}

impl WsTransport {
    /// Connect to a WebSocket server, failing fast.
    pub fn connect(url: impl Into<String>) -> crate::Result<Self> {
        let url = url.into();
        let ws = open_socket(&url)?;
        Ok(Self {
            url,
            ws: Some(ws),
            closed: false,
            attempts: 0,
            next_retry_at: Instant::now(),
        })
    }

    /// Connect to a WebSocket server, absorbing failure.
    ///
    /// If the first attempt fails the transport starts disconnected and
    /// retries on subsequent polls.
    pub fn open(url: impl Into<String>) -> Self {
        let url = url.into();
        let mut transport = Self {
            url,
            ws: None,
            closed: false,
            attempts: 0,
            next_retry_at: Instant::now(),
        };
        transport.try_reconnect();
        transport
    }

    /// The URL this transport connects to.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn try_reconnect(&mut self) {
        if self.closed || self.ws.is_some() || Instant::now() < self.next_retry_at {
            return;
        }
        match open_socket(&self.url) {
            Ok(ws) => {
                trace_debug!("connected to {}", self.url);
                self.ws = Some(ws);
                self.attempts = 0;
            }
            Err(_e) => {
                trace_warn!("connect to {} failed: {}", self.url, _e);
                self.attempts = self.attempts.saturating_add(1);
                self.next_retry_at = Instant::now() + reconnect_backoff(self.attempts);
            }
        }
    }

    fn drop_socket(&mut self) {
        self.ws = None;
        self.attempts = self.attempts.saturating_add(1);
        self.next_retry_at = Instant::now() + reconnect_backoff(self.attempts);
    }
}

fn open_socket(url: &str) -> crate::Result<ClientSocket> {
    let (ws, _response) = client::connect(url)?;

    // Set non-blocking for game loop compatibility
    if let MaybeTlsStream::Plain(ref stream) = ws.get_ref() {
        stream.set_nonblocking(true)?;
    }

    Ok(ws)
}

/// Doubling backoff with a capped exponent and a hard ceiling.
fn reconnect_backoff(attempt: u32) -> Duration {
    let multiplier = 2_u64.saturating_pow(attempt.min(6));
    let delay = RECONNECT_BASE_DELAY_MS.saturating_mul(multiplier);
    Duration::from_millis(delay.min(RECONNECT_MAX_DELAY_MS))
}

impl Transport for WsTransport {
    fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "connection closed"));
        }
        self.try_reconnect();
        let Some(ws) = self.ws.as_mut() else {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "not connected"));
        };

        let text = std::str::from_utf8(data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if let Err(e) = ws.send(Message::Text(text.to_string())) {
            self.drop_socket();
            return Err(ws_to_io(e));
        }
        Ok(data.len())
    }

    fn receive<F: FnMut(&[u8])>(&mut self, mut handler: F) -> usize {
        if self.closed {
            return 0;
        }
        self.try_reconnect();
        let Some(ws) = self.ws.as_mut() else {
            return 0;
        };

        let mut count = 0;
        let mut lost = false;

        loop {
            match ws.read() {
                Ok(msg) => match msg {
                    Message::Text(text) => {
                        handler(text.as_bytes());
                        count += 1;
                    }
                    Message::Binary(data) => {
                        handler(&data);
                        count += 1;
                    }
                    Message::Ping(data) => {
                        let _ = ws.send(Message::Pong(data));
                    }
                    Message::Pong(_) => {}
                    Message::Close(_) => {
                        lost = true;
                        break;
                    }
                    Message::Frame(_) => {}
                },
                Err(tungstenite::Error::Io(ref e)) if e.kind() == io::ErrorKind::WouldBlock => {
                    break;
                }
                Err(_e) => {
                    trace_warn!("receive failed: {}", _e);
                    lost = true;
                    break;
                }
            }
        }

        if lost {
            self.drop_socket();
        }
        count
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.ws.as_mut() {
            Some(ws) => ws.flush().map_err(ws_to_io),
            None => Ok(()),
        }
    }

    fn is_open(&self) -> bool {
        !self.closed && self.ws.as_ref().is_some_and(|ws| ws.can_write())
    }

    fn close(&mut self) -> io::Result<()> {
        if !self.closed {
            if let Some(ws) = self.ws.as_mut() {
                let _ = ws.close(None);
            }
            self.ws = None;
            self.closed = true;
        }
        Ok(())
    }
}

fn ws_to_io(e: tungstenite::Error) -> io::Error {
    match e {
        tungstenite::Error::Io(io_err) => io_err,
        tungstenite::Error::ConnectionClosed => {
            io::Error::new(io::ErrorKind::ConnectionReset, "WebSocket connection closed")
        }
        tungstenite::Error::AlreadyClosed => {
            io::Error::new(io::ErrorKind::NotConnected, "WebSocket already closed")
        }
        other => io::Error::other(other.to_string()),
    }
}
