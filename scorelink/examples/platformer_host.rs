//! Host wiring demo: a console stand-in for the platformer page.
//!
//! Run a Phoenix-style channel server on ws://localhost:4000/socket and:
//!
//! ```sh
//! cargo run --example platformer_host
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use scorelink::{GameUi, Host, PortHandler, ScoreEvent, SocketConfig, StaticProbe, Surface};

/// Console "game": prints scores received from other players and broadcasts
/// a fake score of its own every few seconds.
#[derive(Default)]
struct ConsoleGame {
    broadcast: Option<PortHandler>,
}

impl ConsoleGame {
    fn tick(&mut self, score: i64) {
        if let Some(handler) = self.broadcast.as_mut() {
            println!("[game] broadcasting score {score}");
            handler(score);
        }
    }
}

impl GameUi for ConsoleGame {
    fn on_broadcast_score(&mut self, handler: PortHandler) {
        self.broadcast = Some(handler);
    }

    fn receive_score(&mut self, event: ScoreEvent) {
        println!(
            "[game] player {} scored {} (game {})",
            event.player_id, event.player_score, event.game_id
        );
    }
}

fn main() -> scorelink::Result<()> {
    let config = SocketConfig {
        token: std::env::var("USER_TOKEN").unwrap_or_default(),
        ..SocketConfig::default()
    };

    // The "page" has the platformer mounted but not pong.
    let probe = StaticProbe::new(["platformer"]);
    let game = Arc::new(Mutex::new(ConsoleGame::default()));

    let handle = game.clone();
    let surfaces = vec![
        Surface::new("platformer", 1, Box::new(move |_token| handle.clone()))
            .with_player_identity(),
        Surface::new("pong", 2, Box::new(|_token| Arc::new(Mutex::new(ConsoleGame::default())))),
    ];

    let host = Host::wire_ws(&probe, surfaces, &config)?;
    println!("wired {} bridge(s)", host.bridge_count());

    let mut last_emit = Instant::now();
    let mut score = 0;
    loop {
        host.pump();

        if last_emit.elapsed() >= Duration::from_secs(3) {
            score += 10;
            game.lock().tick(score);
            last_emit = Instant::now();
        }

        std::thread::sleep(Duration::from_millis(16));
    }
}
