#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives a headless Grid Assault session.
//!
//! An autopilot chases the nearest invader column and keeps firing while the
//! session advances at a fixed tick rate; the run ends after the configured
//! number of frames or at game over, printing a scoreboard summary.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use grid_assault_core::{
    BattlefieldConfig, Event, FormationTemplate, InputFrame, InvaderPhase, PlayfieldBounds,
    Transition,
};
use grid_assault_platform::{
    KeyValueStore, MemoryStore, NullAudio, SceneDirector, TomlStore,
};
use grid_assault_session::{GameSession, SessionHooks};
use grid_assault_world::{query, World};

/// Arguments controlling the headless demo loop.
#[derive(Debug, Parser)]
#[command(name = "grid-assault", about = "Headless Grid Assault demo loop")]
struct Args {
    /// Number of frames to simulate before stopping.
    #[arg(long, default_value_t = 3600)]
    frames: u64,

    /// Session seed feeding the formation's firing pattern.
    #[arg(long, default_value_t = 0x1959)]
    seed: u64,

    /// Simulated frames per second.
    #[arg(long, default_value_t = 60)]
    tick_rate: u32,

    /// Durable store file; state is kept in memory when omitted.
    #[arg(long)]
    store: Option<PathBuf>,
}

/// Scene director that narrates transitions into the log.
#[derive(Debug, Default)]
struct LoggingDirector;

impl SceneDirector for LoggingDirector {
    fn level_complete(&mut self) {
        tracing::info!("level complete");
    }

    fn game_over(&mut self) {
        tracing::info!("game over");
    }
}

/// Entry point for the Grid Assault command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let store: Box<dyn KeyValueStore> = match &args.store {
        Some(path) => Box::new(TomlStore::open(path.clone())?),
        None => Box::new(MemoryStore::new()),
    };

    let bounds = PlayfieldBounds::new(800.0, 600.0);
    let mut session = GameSession::new(
        BattlefieldConfig::open(bounds, 16.0),
        args.seed,
        SessionHooks {
            audio: Box::new(NullAudio),
            director: Box::new(LoggingDirector),
            store,
        },
    );
    let _ = session.begin_game(FormationTemplate::classic());

    let dt = Duration::from_secs_f64(1.0 / f64::from(args.tick_rate.max(1)));
    let mut defeated = false;
    for frame in 0..args.frames {
        let input = autopilot(frame, session.world());
        let report = session.advance_frame(input, dt);
        let mut next_wave = false;
        for event in &report.events {
            match event {
                Event::WaveCleared { wave } => {
                    tracing::info!(wave = *wave, "wave cleared");
                }
                Event::TransitionDue { transition } => match transition {
                    Transition::LevelComplete => next_wave = true,
                    Transition::GameOver => defeated = true,
                },
                _ => {}
            }
        }
        if defeated {
            break;
        }
        if next_wave {
            let _ = session.begin_wave(FormationTemplate::classic());
        }
    }

    let summary = session.end();
    println!(
        "wave {:>2}  score {:>6}  high {:>6}  lives {}  accuracy {:>3.0}%",
        summary.wave,
        summary.score,
        summary.high_score,
        summary.lives,
        summary.accuracy() * 100.0,
    );
    Ok(())
}

/// Chases the nearest marching invader column while holding fire.
fn autopilot(frame: u64, world: &World) -> InputFrame {
    let player = query::player(world);
    let target_x = query::invader_view(world)
        .iter()
        .filter(|snapshot| snapshot.phase == InvaderPhase::Marching)
        .map(|snapshot| snapshot.position.x())
        .min_by(|a, b| {
            let da = (a - player.position.x()).abs();
            let db = (b - player.position.x()).abs();
            da.partial_cmp(&db).expect("finite coordinates")
        });

    let mut input = InputFrame {
        fire_pressed: frame % 24 == 0,
        fire_held: true,
        ..InputFrame::default()
    };
    if let Some(x) = target_x {
        if x < player.position.x() - 4.0 {
            input.left = true;
        } else if x > player.position.x() + 4.0 {
            input.right = true;
        }
    }
    input
}
