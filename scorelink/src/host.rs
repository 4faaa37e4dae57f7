//! Host wiring: the capability table of optional UI surfaces.
//!
//! A page declares which surfaces it could host; at startup each surface's
//! mount point is probed exactly once, and only present surfaces get a UI
//! instance, a channel, and a bridge. The socket itself is created lazily on
//! the first present surface, so a page with no game on it never touches the
//! network.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use scorelink_proto::score_topic;
use scorelink_ws::{endpoint_url, Transport, WsTransport};

use crate::bridge::{GameUi, PortBridge};
use crate::socket::{Socket, SocketConfig};
use crate::trace_debug;

/// Mount point presence query, answered by the hosting environment.
pub trait MountProbe {
    /// `true` if the page contains the mount point `mount_id`.
    fn is_present(&self, mount_id: &str) -> bool;
}

/// Fixed set of present mount points. Handy for tests and headless hosts.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    present: HashSet<String>,
}

impl StaticProbe {
    pub fn new<I, S>(mount_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            present: mount_ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl MountProbe for StaticProbe {
    fn is_present(&self, mount_id: &str) -> bool {
        self.present.contains(mount_id)
    }
}

/// Builds a surface's UI component. Receives the player token when the
/// surface requires identity and one is configured.
pub type UiFactory = Box<dyn Fn(Option<&str>) -> Arc<Mutex<dyn GameUi>>>;

/// One entry in the host's capability table.
pub struct Surface {
    mount_id: String,
    game_id: i64,
    requires_token: bool,
    factory: UiFactory,
}

impl Surface {
    pub fn new(mount_id: impl Into<String>, game_id: i64, factory: UiFactory) -> Self {
        Self {
            mount_id: mount_id.into(),
            game_id,
            requires_token: false,
            factory,
        }
    }

    /// Mark this surface as needing per-player identity; its factory then
    /// receives the configured token.
    pub fn with_player_identity(mut self) -> Self {
        self.requires_token = true;
        self
    }

    pub fn mount_id(&self) -> &str {
        &self.mount_id
    }

    pub fn game_id(&self) -> i64 {
        self.game_id
    }
}

/// All bridges wired for one page, sharing one socket.
pub struct Host<T: Transport> {
    socket: Option<Socket<T>>,
    bridges: Vec<PortBridge<T>>,
}

impl<T: Transport + 'static> Host<T> {
    /// Probe every surface once and wire the present ones.
    ///
    /// `connect` is invoked at most once, when the first present surface
    /// needs the shared socket; with no present surface there is no socket,
    /// no join, and no wiring at all.
    pub fn wire<P, C>(probe: &P, surfaces: Vec<Surface>, config: &SocketConfig, connect: C) -> Self
    where
        P: MountProbe + ?Sized,
        C: FnOnce(&SocketConfig) -> Socket<T>,
    {
        let mut connect = Some(connect);
        let mut socket: Option<Socket<T>> = None;
        let mut bridges = Vec::new();

        for surface in surfaces {
            if !probe.is_present(&surface.mount_id) {
                trace_debug!("mount '{}' absent, surface skipped", surface.mount_id);
                continue;
            }

            let token = (surface.requires_token && !config.token.is_empty())
                .then_some(config.token.as_str());
            let ui = (surface.factory)(token);

            if socket.is_none() {
                if let Some(make) = connect.take() {
                    socket = Some(make(config));
                }
            }
            let Some(socket) = socket.as_ref() else {
                // connect was consumed and produced nothing; cannot happen
                // with the FnOnce contract above.
                continue;
            };

            let channel = socket.channel(score_topic(surface.game_id));
            bridges.push(PortBridge::wire(channel, ui));
        }

        Self { socket, bridges }
    }

    /// `true` if at least one surface was wired.
    pub fn is_active(&self) -> bool {
        !self.bridges.is_empty()
    }

    /// Number of wired bridges.
    pub fn bridge_count(&self) -> usize {
        self.bridges.len()
    }

    /// The shared socket, if any surface needed one.
    pub fn socket(&self) -> Option<&Socket<T>> {
        self.socket.as_ref()
    }

    /// The wired bridges, in registry order.
    pub fn bridges(&self) -> &[PortBridge<T>] {
        &self.bridges
    }

    /// Drive the shared socket. No-op for an inactive host.
    pub fn pump(&self) {
        if let Some(socket) = &self.socket {
            socket.pump();
        }
    }
}

impl Host<WsTransport> {
    /// Wire every present surface over a real WebSocket connection.
    pub fn wire_ws<P>(probe: &P, surfaces: Vec<Surface>, config: &SocketConfig) -> crate::Result<Self>
    where
        P: MountProbe + ?Sized,
    {
        let url = endpoint_url(&config.endpoint, &config.token)?;
        Ok(Self::wire(probe, surfaces, config, move |cfg| {
            Socket::with_transport(cfg, WsTransport::open(url))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::PortHandler;
    use scorelink_proto::{events, ScoreEvent};
    use scorelink_test_support::MemoryTransport;
    use std::time::Duration;

    struct NullUi;

    impl GameUi for NullUi {
        fn on_broadcast_score(&mut self, _handler: PortHandler) {}

        fn receive_score(&mut self, _event: ScoreEvent) {}
    }

    fn config() -> SocketConfig {
        SocketConfig {
            token: "secret".to_string(),
            heartbeat_interval: Duration::ZERO,
            ..SocketConfig::default()
        }
    }

    fn surface_with_sink(
        mount_id: &str,
        game_id: i64,
        sink: Arc<Mutex<Vec<Option<String>>>>,
    ) -> Surface {
        Surface::new(
            mount_id,
            game_id,
            Box::new(move |token| {
                sink.lock().push(token.map(str::to_string));
                Arc::new(Mutex::new(NullUi))
            }),
        )
    }

    #[test]
    fn test_absent_mount_is_a_no_op() {
        let transport = MemoryTransport::new();
        let built = Arc::new(Mutex::new(Vec::new()));
        let connects = Arc::new(Mutex::new(0));
        let connect_count = connects.clone();

        let host = Host::wire(
            &StaticProbe::default(),
            vec![surface_with_sink("platformer", 1, built.clone())],
            &config(),
            move |cfg| {
                *connect_count.lock() += 1;
                Socket::with_transport(cfg, transport.clone())
            },
        );

        assert!(!host.is_active());
        assert!(host.socket().is_none());
        assert!(built.lock().is_empty());
        assert_eq!(*connects.lock(), 0);
    }

    #[test]
    fn test_present_mount_joins_its_topic() {
        let transport = MemoryTransport::new();
        let probe = StaticProbe::new(["platformer"]);
        let built = Arc::new(Mutex::new(Vec::new()));
        let captured = transport.clone();

        let host = Host::wire(
            &probe,
            vec![surface_with_sink("platformer", 1, built.clone())],
            &config(),
            move |cfg| Socket::with_transport(cfg, captured),
        );

        assert!(host.is_active());
        let sent = transport.sent_frames();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].event, events::PHX_JOIN);
        assert_eq!(sent[0].topic, "score:1");
    }

    #[test]
    fn test_token_reaches_identity_surfaces_only() {
        let transport = MemoryTransport::new();
        let probe = StaticProbe::new(["platformer", "pong"]);
        let built = Arc::new(Mutex::new(Vec::new()));

        let surfaces = vec![
            surface_with_sink("platformer", 1, built.clone()).with_player_identity(),
            surface_with_sink("pong", 2, built.clone()),
        ];
        let captured = transport.clone();
        let _host = Host::wire(&probe, surfaces, &config(), move |cfg| {
            Socket::with_transport(cfg, captured)
        });

        assert_eq!(
            *built.lock(),
            vec![Some("secret".to_string()), None]
        );
    }

    #[test]
    fn test_empty_token_never_reaches_factories() {
        let transport = MemoryTransport::new();
        let probe = StaticProbe::new(["platformer"]);
        let built = Arc::new(Mutex::new(Vec::new()));
        let cfg = SocketConfig {
            token: String::new(),
            heartbeat_interval: Duration::ZERO,
            ..SocketConfig::default()
        };

        let surfaces = vec![surface_with_sink("platformer", 1, built.clone()).with_player_identity()];
        let captured = transport.clone();
        let _host = Host::wire(&probe, surfaces, &cfg, move |c| {
            Socket::with_transport(c, captured)
        });

        assert_eq!(*built.lock(), vec![None]);
    }

    #[test]
    fn test_surfaces_share_one_socket() {
        let transport = MemoryTransport::new();
        let probe = StaticProbe::new(["platformer", "pong"]);
        let built = Arc::new(Mutex::new(Vec::new()));
        let connects = Arc::new(Mutex::new(0));
        let connect_count = connects.clone();

        let surfaces = vec![
            surface_with_sink("platformer", 1, built.clone()),
            surface_with_sink("pong", 2, built.clone()),
        ];
        let captured = transport.clone();
        let host = Host::wire(&probe, surfaces, &config(), move |cfg| {
            *connect_count.lock() += 1;
            Socket::with_transport(cfg, captured)
        });

        assert_eq!(host.bridge_count(), 2);
        assert_eq!(*connects.lock(), 1);
        let topics: Vec<_> = transport.sent_frames().into_iter().map(|f| f.topic).collect();
        assert_eq!(topics, vec!["score:1", "score:2"]);
    }
}
