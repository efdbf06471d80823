// Keyboard teleop for the diff-drive base
//
// W/S drive, A/D turn, R/F change speed, Q or Esc quit. Commands are
// published every poll so the runtime watchdog stays fed; releasing the keys
// lets the command fall back to zero after HOLD.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use diffdrive_ddsm115::config::TOPIC_CMD_BASE;
use diffdrive_ddsm115::messages::BaseCommand;
use std::time::{Duration, Instant};
use tracing::info;

/// (label, forward m/s, turn rad/s)
const GEARS: [(&str, f64, f64); 3] = [("LOW", 0.05, 0.3), ("MED", 0.15, 0.8), ("HIGH", 0.3, 1.5)];
const POLL: Duration = Duration::from_millis(20);
const HOLD: Duration = Duration::from_millis(100);

struct Teleop {
    gear: usize,
    forward: f64, // -1, 0 or 1
    turn: f64,    // -1, 0 or 1, counter-clockwise positive
    last_input: Instant,
}

impl Teleop {
    fn new() -> Self {
        Self {
            gear: 0,
            forward: 0.0,
            turn: 0.0,
            last_input: Instant::now(),
        }
    }

    /// Apply one key; returns false when the user asked to quit
    fn on_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('w') => self.steer(Some(1.0), None),
            KeyCode::Char('s') => self.steer(Some(-1.0), None),
            KeyCode::Char('a') => self.steer(None, Some(1.0)),
            KeyCode::Char('d') => self.steer(None, Some(-1.0)),
            KeyCode::Char('r') => self.shift(self.gear + 1),
            KeyCode::Char('f') => self.shift(self.gear.saturating_sub(1)),
            KeyCode::Char('q') | KeyCode::Esc => return false,
            _ => {}
        }
        true
    }

    fn steer(&mut self, forward: Option<f64>, turn: Option<f64>) {
        if let Some(f) = forward {
            self.forward = f;
        }
        if let Some(t) = turn {
            self.turn = t;
        }
        self.last_input = Instant::now();
    }

    fn shift(&mut self, gear: usize) {
        self.gear = gear.min(GEARS.len() - 1);
        info!("Speed: {}", GEARS[self.gear].0);
    }

    fn command(&mut self) -> BaseCommand {
        if self.last_input.elapsed() > HOLD {
            self.forward = 0.0;
            self.turn = 0.0;
        }
        let (_, x, theta) = GEARS[self.gear];
        BaseCommand {
            x_vel: self.forward * x,
            theta_vel: self.turn * theta,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD_BASE).await?;
    info!("Publishing to {}", TOPIC_CMD_BASE);
    info!("Controls: W/S=drive, A/D=turn, R/F=speed, Q=quit");

    enable_raw_mode()?;
    let mut teleop = Teleop::new();
    let result = async {
        loop {
            if event::poll(POLL)? {
                if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                    if kind != KeyEventKind::Release && !teleop.on_key(code) {
                        return Ok::<(), Box<dyn std::error::Error + Send + Sync>>(());
                    }
                }
            }
            let payload = serde_json::to_string(&teleop.command())?;
            publisher.put(payload).await?;
        }
    }
    .await;
    disable_raw_mode()?;

    result
}
