#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-level composition root wiring the world, systems, and platform.
//!
//! A [`GameSession`] advances the simulation one frame at a time in a fixed
//! order: player-control commands, then the world tick, then the formation
//! director's reaction to the tick's events, pumped until no system has
//! further commands. Events flowing out of the world are mapped onto audio
//! cues, scene transitions, and durable-storage writes; storage failures are
//! logged and swallowed so the loop never stalls on I/O.

use std::time::Duration;

use grid_assault_core::{
    BattlefieldConfig, Command, Directive, Event, FormationTemplate, GunKind, InputFrame,
    PersistedRecord, PowerupGrant, ScoreboardSnapshot, Transition,
};
use grid_assault_platform::{
    load_record, store_directives, store_high_score, store_selected_gun, AudioCue, AudioSink,
    KeyValueStore, MemoryStore, NullAudio, NullDirector, SceneDirector,
};
use grid_assault_system_formation::{Config as FormationConfig, FormationDirector};
use grid_assault_system_player_control::PlayerControl;
use grid_assault_world::{apply, query, World};

/// Platform collaborators a session is wired to at construction.
pub struct SessionHooks {
    /// Fire-and-forget audio trigger.
    pub audio: Box<dyn AudioSink>,
    /// Receiver of terminal scene transitions.
    pub director: Box<dyn SceneDirector>,
    /// Durable key-value store for high score, directives, and gun choice.
    pub store: Box<dyn KeyValueStore>,
}

impl SessionHooks {
    /// Hooks for a headless run: silent audio, inert scenes, memory storage.
    #[must_use]
    pub fn headless() -> Self {
        Self {
            audio: Box::new(NullAudio),
            director: Box::new(NullDirector),
            store: Box::new(MemoryStore::new()),
        }
    }
}

/// Events produced while advancing one frame or applying one request.
#[derive(Clone, Debug, Default)]
pub struct FrameReport {
    /// Every event the world broadcast during the frame, in order.
    pub events: Vec<Event>,
}

/// One active level: the authoritative world plus its systems and hooks.
pub struct GameSession {
    world: World,
    player_control: PlayerControl,
    formation: FormationDirector,
    audio: Box<dyn AudioSink>,
    director: Box<dyn SceneDirector>,
    store: Box<dyn KeyValueStore>,
    level_complete_sent: bool,
    game_over_sent: bool,
}

impl GameSession {
    /// Builds a session over the given battlefield, restoring durable state.
    ///
    /// A failing store costs only its stored values: the session continues
    /// with defaults and logs the failure once.
    #[must_use]
    pub fn new(config: BattlefieldConfig, seed: u64, hooks: SessionHooks) -> Self {
        let mut session = Self {
            world: World::new(),
            player_control: PlayerControl::new(),
            formation: FormationDirector::new(FormationConfig::new(seed)),
            audio: hooks.audio,
            director: hooks.director,
            store: hooks.store,
            level_complete_sent: false,
            game_over_sent: false,
        };

        let _ = session.run_commands(vec![Command::ConfigureBattlefield { config }]);

        let record = match load_record(session.store.as_ref()) {
            Ok(record) => record,
            Err(error) => {
                tracing::warn!(error = %error, "durable store unavailable, using defaults");
                PersistedRecord::default()
            }
        };
        let _ = session.run_commands(vec![Command::RestorePersisted { record }]);
        session
    }

    /// Read access to the underlying world for queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Starts a fresh game over the provided formation template.
    pub fn begin_game(&mut self, formation: FormationTemplate) -> FrameReport {
        tracing::info!("starting a fresh session");
        self.run_commands(vec![Command::BeginGame { formation }])
    }

    /// Advances to the next wave.
    pub fn begin_wave(&mut self, formation: FormationTemplate) -> FrameReport {
        self.run_commands(vec![Command::BeginWave { formation }])
    }

    /// Replays the current wave from its wave-start snapshot.
    pub fn replay_wave(&mut self, formation: FormationTemplate) -> FrameReport {
        self.run_commands(vec![Command::ReplayWave { formation }])
    }

    /// Advances the simulation by one frame of input and elapsed time.
    pub fn advance_frame(&mut self, input: InputFrame, dt: Duration) -> FrameReport {
        let mut commands = Vec::new();
        self.player_control
            .handle(query::phase(&self.world), &input, &mut commands);
        commands.push(Command::Tick { dt });
        self.run_commands(commands)
    }

    /// Applies one executive-order change.
    pub fn issue_directive(&mut self, directive: Directive) -> FrameReport {
        self.run_commands(vec![Command::IssueDirective { directive }])
    }

    /// Persists a new gun selection.
    pub fn select_gun(&mut self, gun: GunKind) -> FrameReport {
        self.run_commands(vec![Command::SelectGun { gun }])
    }

    /// Grants a temporary gun override.
    pub fn grant_powerup(&mut self, gun: GunKind, grant: PowerupGrant) -> FrameReport {
        self.run_commands(vec![Command::GrantPowerup { gun, grant }])
    }

    /// Tears the session down, returning the final scoreboard.
    ///
    /// Dropping the session drops the world and with it every scheduled
    /// action, so nothing pending can fire into a later session.
    #[must_use]
    pub fn end(self) -> ScoreboardSnapshot {
        let snapshot = query::scoreboard(&self.world);
        tracing::info!(score = snapshot.score, wave = snapshot.wave, "session ended");
        snapshot
    }

    /// Applies commands and pumps system reactions until quiescent.
    fn run_commands(&mut self, commands: Vec<Command>) -> FrameReport {
        let mut report = FrameReport::default();
        let mut pending = commands;

        while !pending.is_empty() {
            let mut events = Vec::new();
            for command in pending.drain(..) {
                apply(&mut self.world, command, &mut events);
            }

            let mut reactions = Vec::new();
            {
                let phase = query::phase(&self.world);
                let view = query::invader_view(&self.world);
                let heading = query::formation_heading(&self.world);
                let bounds = query::bounds(&self.world);
                let tuning = query::tuning(&self.world).formation;
                let difficulty = query::scoreboard(&self.world).directives.difficulty;
                let terrain = query::terrain(&self.world);
                self.formation.handle(
                    &events,
                    phase,
                    &view,
                    heading,
                    bounds,
                    &tuning,
                    difficulty,
                    |x, y| terrain.is_blocked(x, y),
                    &mut reactions,
                );
            }

            self.dispatch(&events);
            report.events.extend(events);
            pending = reactions;
        }

        report
    }

    /// Maps world events onto platform effects.
    fn dispatch(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::GameStarted { .. } | Event::WaveStarted { .. } => {
                    self.level_complete_sent = false;
                    self.game_over_sent = false;
                }
                Event::GunFired { .. } => self.audio.play(AudioCue::PlayerShot),
                Event::InvaderBulletFired { .. } => self.audio.play(AudioCue::InvaderShot),
                Event::InvaderHit { .. } => self.audio.play(AudioCue::InvaderExplosion),
                Event::PlayerStruck { .. } => self.audio.play(AudioCue::PlayerExplosion),
                Event::ExtraLifeAwarded { .. } => self.audio.play(AudioCue::ExtraLife),
                Event::BigRedButtonPressed => self.audio.play(AudioCue::Detonation),
                Event::WaveCleared { .. } => {
                    self.audio.play(AudioCue::WaveClear);
                    self.persist_high_score();
                }
                Event::GameEnded { .. } => {
                    self.audio.play(AudioCue::GameOver);
                    self.persist_high_score();
                }
                Event::GunSelected { gun } => {
                    if let Err(error) = store_selected_gun(self.store.as_mut(), *gun) {
                        tracing::warn!(error = %error, "failed to persist gun selection");
                    }
                }
                Event::DirectiveChanged { .. } => {
                    let directives = query::scoreboard(&self.world).directives;
                    if let Err(error) = store_directives(self.store.as_mut(), &directives) {
                        tracing::warn!(error = %error, "failed to persist directives");
                    }
                }
                Event::TransitionDue { transition } => match transition {
                    Transition::LevelComplete => {
                        if !self.level_complete_sent {
                            self.level_complete_sent = true;
                            self.director.level_complete();
                        }
                    }
                    Transition::GameOver => {
                        if !self.game_over_sent {
                            self.game_over_sent = true;
                            self.director.game_over();
                        }
                    }
                },
                _ => {}
            }
        }
    }

    fn persist_high_score(&mut self) {
        let high_score = query::scoreboard(&self.world).high_score;
        if let Err(error) = store_high_score(self.store.as_mut(), high_score) {
            tracing::warn!(error = %error, "failed to persist high score");
        }
    }
}
