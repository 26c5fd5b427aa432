#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Grid Assault.
//!
//! The world owns every entity of a running session — player ship, invader
//! formation, bullets, the scoring state machine, and the scheduled-action
//! queue — and is mutated exclusively through [`apply`]. Consumers read it
//! through the [`query`] module, which hands out per-tick snapshots rather
//! than references into live state.

use std::time::Duration;

use grid_assault_core::{
    BattlefieldConfig, BattlefieldTuning, Command, Event, FormationCoord, FormationMovement,
    FormationTemplate, PlayfieldBounds, SessionPhase, Transition, WorldPoint,
};

mod arsenal;
mod bullets;
mod formation;
mod player;
mod schedule;
mod scoreboard;
mod terrain;

use arsenal::Arsenal;
use bullets::{BulletSwarm, InvaderStrike};
use formation::Formation;
use player::PlayerShip;
use schedule::{ActionQueue, SessionAction};
use scoreboard::Scoreboard;
pub use terrain::TerrainGrid;

const DEFAULT_WIDTH: f32 = 800.0;
const DEFAULT_HEIGHT: f32 = 600.0;
const DEFAULT_CELL_LENGTH: f32 = 16.0;

/// Distance from the bottom edge at which the player ship sits.
const PLAYER_GROUND_MARGIN: f32 = 48.0;

/// Distance from the bottom edge at which a descending formation has landed.
const LANDING_MARGIN: f32 = 96.0;

/// Represents the authoritative Grid Assault world state.
#[derive(Debug)]
pub struct World {
    phase: SessionPhase,
    bounds: PlayfieldBounds,
    tuning: BattlefieldTuning,
    terrain: TerrainGrid,
    player: PlayerShip,
    formation: Option<Formation>,
    bullets: BulletSwarm,
    scoreboard: Scoreboard,
    arsenal: Arsenal,
    schedule: ActionQueue,
    clock: Duration,
    last_shot_at: Option<Duration>,
}

impl World {
    /// Creates a new world with an open default battlefield.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(BattlefieldConfig::open(
            PlayfieldBounds::new(DEFAULT_WIDTH, DEFAULT_HEIGHT),
            DEFAULT_CELL_LENGTH,
        ))
    }

    fn from_config(config: BattlefieldConfig) -> Self {
        let bounds = config.bounds;
        let spawn = WorldPoint::new(
            bounds.width() / 2.0,
            bounds.height() - PLAYER_GROUND_MARGIN,
        );
        Self {
            phase: SessionPhase::Dormant,
            terrain: TerrainGrid::new(&config.terrain, config.terrain_cell_length),
            player: PlayerShip::new(spawn),
            formation: None,
            bullets: BulletSwarm::default(),
            scoreboard: Scoreboard::new(),
            arsenal: Arsenal::default(),
            schedule: ActionQueue::default(),
            clock: Duration::ZERO,
            last_shot_at: None,
            tuning: config.tuning,
            bounds,
        }
    }

    fn player_spawn_point(&self) -> WorldPoint {
        WorldPoint::new(
            self.bounds.width() / 2.0,
            self.bounds.height() - PLAYER_GROUND_MARGIN,
        )
    }

    /// Resets entities and pending actions for a fresh wave.
    fn spawn_wave(&mut self, template: &FormationTemplate) {
        self.formation = Some(Formation::spawn(
            template,
            self.bounds,
            &self.tuning.formation,
        ));
        self.bullets.clear();
        self.schedule.clear();
        let spawn = self.player_spawn_point();
        self.player.reset(spawn);
        self.last_shot_at = None;
        self.phase = SessionPhase::Combat;
    }

    fn advance_frame(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.player.advance(
            dt,
            &self.terrain,
            self.bounds,
            &self.tuning.player,
            self.tuning.formation.explosion_frame,
        );

        let targets = self
            .formation
            .as_ref()
            .map(Formation::bullet_targets)
            .unwrap_or_default();
        let player_target = if self.player.is_active() {
            Some(self.player.position())
        } else {
            None
        };
        let report = self.bullets.advance(
            dt,
            &self.terrain,
            self.bounds,
            &targets,
            self.tuning.formation.invader_radius,
            player_target,
            self.tuning.player.collision_radius,
        );
        for position in &report.wall_impacts {
            out_events.push(Event::BulletBlocked {
                position: *position,
            });
        }
        for strike in &report.invader_hits {
            self.strike_invader(*strike, out_events);
        }
        if report.player_struck {
            self.strike_player(out_events);
        }

        let removed = match self.formation.as_mut() {
            Some(formation) => {
                formation.advance_explosions(dt, self.tuning.formation.explosion_frame)
            }
            None => Vec::new(),
        };
        for invader in removed {
            let award = self.scoreboard.award_kill(invader.row, &self.tuning.scoring);
            out_events.push(Event::InvaderDestroyed {
                invader: invader.id,
                row: invader.row,
                remaining: award.remaining,
            });
            out_events.push(Event::ScoreChanged {
                score: award.score,
                high_score: award.high_score,
                delta: i64::from(award.points),
            });
            if award.lives_awarded > 0 {
                out_events.push(Event::ExtraLifeAwarded {
                    lives: award.lives,
                });
                self.schedule.schedule(
                    self.clock + self.tuning.transition.extra_life_flag,
                    SessionAction::ClearExtraLifeFlag,
                );
            }
        }

        if self.phase == SessionPhase::Combat
            && self
                .formation
                .as_ref()
                .map_or(false, Formation::is_cleared)
        {
            self.phase = SessionPhase::Cleared;
            self.player.begin_exit();
            self.schedule.schedule(
                self.clock + self.tuning.transition.level_complete_delay,
                SessionAction::Transition(Transition::LevelComplete),
            );
            out_events.push(Event::WaveCleared {
                wave: self.scoreboard.wave(),
            });
        }

        if self.phase == SessionPhase::Combat && self.player.is_active() {
            let overlapping = self.formation.as_ref().map_or(false, |formation| {
                formation.overlaps_circle(
                    self.player.position(),
                    self.tuning.player.collision_radius,
                    self.tuning.formation.invader_radius,
                )
            });
            if overlapping {
                self.strike_player(out_events);
            }
        }

        for action in self.schedule.drain_due(self.clock) {
            match action {
                SessionAction::IgniteInvader(id) => {
                    if let Some(formation) = self.formation.as_mut() {
                        if formation.ignite(id).is_some() {
                            out_events.push(Event::InvaderHit { invader: id });
                        }
                    }
                }
                SessionAction::ClearExtraLifeFlag => {
                    self.scoreboard.clear_extra_life_flag();
                    out_events.push(Event::ExtraLifeFlagCleared);
                }
                SessionAction::RespawnPlayer => {
                    if self.phase == SessionPhase::Combat {
                        self.player.respawn();
                        out_events.push(Event::PlayerRespawned);
                    }
                }
                SessionAction::Transition(transition) => {
                    out_events.push(Event::TransitionDue { transition });
                }
            }
        }

        if let Some(reverted) = self.arsenal.expire_by_clock(self.clock) {
            out_events.push(Event::PowerupExpired {
                reverted_to: reverted,
            });
        }

        if self.phase == SessionPhase::Combat {
            self.scoreboard.tick_timer(dt);
        }
    }

    /// Ignites the kill ring around a hit, radius zero immediately and each
    /// further ring after its scheduled delay.
    fn ignite_ring(
        &mut self,
        center: FormationCoord,
        max_radius: u32,
        out_events: &mut Vec<Event>,
    ) {
        let Some(formation) = self.formation.as_mut() else {
            return;
        };
        let targets = formation.ring_targets(center, max_radius);
        for (radius, id) in targets {
            if radius == 0 {
                if formation.ignite(id).is_some() {
                    out_events.push(Event::InvaderHit { invader: id });
                }
            } else {
                self.schedule.schedule(
                    self.clock + self.tuning.formation.ring_delay * radius,
                    SessionAction::IgniteInvader(id),
                );
            }
        }
    }

    fn strike_invader(&mut self, strike: InvaderStrike, out_events: &mut Vec<Event>) {
        let Some(formation) = self.formation.as_mut() else {
            return;
        };
        let Some(coord) = formation.ignite(strike.target) else {
            return;
        };
        out_events.push(Event::InvaderHit {
            invader: strike.target,
        });
        if strike.blast_radius > 0 {
            let max_radius = strike
                .blast_radius
                .min(self.tuning.formation.max_spread_radius);
            self.ignite_ring(coord, max_radius, out_events);
        }
    }

    /// The single damage entry point for the player.
    ///
    /// God mode is honored here so no call site can forget the guard;
    /// `Scoreboard::lose_life` stays a pure clamped decrement.
    fn strike_player(&mut self, out_events: &mut Vec<Event>) {
        if self.scoreboard.directives().god_mode {
            return;
        }
        if !self.player.is_active() {
            return;
        }
        let remaining = self.scoreboard.lose_life();
        self.player.ignite_explosion();
        out_events.push(Event::PlayerStruck {
            lives_remaining: remaining,
        });
        if remaining == 0 {
            self.defeat(out_events);
        } else {
            self.schedule.schedule(
                self.clock + self.tuning.transition.respawn_delay,
                SessionAction::RespawnPlayer,
            );
        }
    }

    fn defeat(&mut self, out_events: &mut Vec<Event>) {
        if self.phase == SessionPhase::Defeated {
            return;
        }
        self.phase = SessionPhase::Defeated;
        self.schedule.schedule(
            self.clock + self.tuning.transition.game_over_delay,
            SessionAction::Transition(Transition::GameOver),
        );
        out_events.push(Event::GameEnded {
            score: self.scoreboard.score(),
        });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureBattlefield { config } => {
            *world = World::from_config(config);
            out_events.push(Event::BattlefieldConfigured);
        }
        Command::RestorePersisted { record } => {
            world.scoreboard.restore(&record);
            world.arsenal.select(record.selected_gun);
        }
        Command::BeginGame { formation } => {
            world
                .scoreboard
                .begin_game(formation.count(), &world.tuning.scoring);
            world.arsenal.clear_powerup();
            world.spawn_wave(&formation);
            out_events.push(Event::GameStarted {
                lives: world.tuning.scoring.starting_lives,
            });
            out_events.push(Event::WaveStarted {
                wave: 1,
                invaders: formation.count(),
            });
        }
        Command::BeginWave { formation } => {
            world.scoreboard.begin_wave(formation.count());
            world.spawn_wave(&formation);
            out_events.push(Event::WaveStarted {
                wave: world.scoreboard.wave(),
                invaders: formation.count(),
            });
        }
        Command::ReplayWave { formation } => {
            world
                .scoreboard
                .replay_wave(formation.count(), &world.tuning.scoring);
            world.spawn_wave(&formation);
            out_events.push(Event::WaveReplayed {
                wave: world.scoreboard.wave(),
            });
            out_events.push(Event::WaveStarted {
                wave: world.scoreboard.wave(),
                invaders: formation.count(),
            });
        }
        Command::Tick { dt } => {
            world.clock = world.clock.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
            world.advance_frame(dt, out_events);
        }
        Command::SteerPlayer { steering } => {
            world.player.set_steering(steering);
        }
        Command::TriggerGun { pressed, held } => {
            if world.phase != SessionPhase::Combat || !world.player.is_active() {
                return;
            }
            let gun = world.arsenal.effective();
            let spec = gun.spec();
            if !(pressed || (spec.automatic && held)) {
                return;
            }
            let ready = world.last_shot_at.map_or(true, |last| {
                world.clock.saturating_sub(last) >= spec.fire_interval
            });
            if !ready {
                return;
            }
            let muzzle = world
                .player
                .position()
                .offset_by(0.0, -world.tuning.player.collision_radius);
            if !world.bullets.spawn_player(gun, muzzle) {
                return;
            }
            world.last_shot_at = Some(world.clock);
            world.scoreboard.record_shot();
            out_events.push(Event::GunFired {
                gun,
                position: muzzle,
            });
            if let Some(reverted) = world.arsenal.consume_shot() {
                out_events.push(Event::PowerupExpired {
                    reverted_to: reverted,
                });
            }
        }
        Command::SelectGun { gun } => {
            world.arsenal.select(gun);
            out_events.push(Event::GunSelected { gun });
        }
        Command::GrantPowerup { gun, grant } => {
            world.arsenal.grant(gun, grant, world.clock);
            out_events.push(Event::PowerupApplied { gun });
        }
        Command::ShiftFormation { movement } => {
            if world.phase != SessionPhase::Combat {
                return;
            }
            let Some(formation) = world.formation.as_mut() else {
                return;
            };
            formation.shift(movement, &world.tuning.formation);
            out_events.push(Event::FormationShifted { movement });
            if movement == FormationMovement::Descend {
                let floor = world.bounds.height() - LANDING_MARGIN;
                let landed = formation.lowest_y().map_or(false, |lowest| {
                    lowest + world.tuning.formation.invader_radius >= floor
                });
                if landed {
                    out_events.push(Event::FormationLanded);
                    world.defeat(out_events);
                }
            }
        }
        Command::SpawnInvaderBullet { shooter } => {
            if world.phase != SessionPhase::Combat {
                return;
            }
            let Some(formation) = world.formation.as_ref() else {
                return;
            };
            let Some(position) = formation.shooter_position(shooter) else {
                return;
            };
            let muzzle = position.offset_by(0.0, world.tuning.formation.invader_radius);
            let speed = world
                .tuning
                .formation
                .invader_bullet_speed(formation.live_count(), formation.initial_count());
            let accepted = world.bullets.spawn_invader(
                muzzle,
                speed,
                world.tuning.formation.bullet_radius,
                world.tuning.formation.bullet_cap,
            );
            if accepted {
                out_events.push(Event::InvaderBulletFired {
                    shooter,
                    position: muzzle,
                });
            }
        }
        Command::PressBigRedButton => {
            if world.phase != SessionPhase::Combat
                || !world.scoreboard.directives().big_red_button
            {
                return;
            }
            let Some(center) = world
                .formation
                .as_ref()
                .and_then(Formation::center_coord)
            else {
                return;
            };
            let penalty = world
                .scoreboard
                .penalize(world.tuning.scoring.big_red_button_cost);
            out_events.push(Event::BigRedButtonPressed);
            if penalty.applied > 0 {
                out_events.push(Event::ScoreChanged {
                    score: penalty.score,
                    high_score: penalty.high_score,
                    delta: -i64::from(penalty.applied),
                });
            }
            world.ignite_ring(center, u32::MAX, out_events);
        }
        Command::IssueDirective { directive } => {
            world.scoreboard.apply_directive(directive);
            out_events.push(Event::DirectiveChanged { directive });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use grid_assault_core::{
        BattlefieldTuning, BulletView, HorizontalHeading, InvaderView, PlayerSnapshot,
        PlayfieldBounds, ScoreboardSnapshot, SessionPhase,
    };

    use super::{Formation, TerrainGrid, World};

    /// Current lifecycle phase of the session.
    #[must_use]
    pub fn phase(world: &World) -> SessionPhase {
        world.phase
    }

    /// Playable bounds of the battlefield.
    #[must_use]
    pub fn bounds(world: &World) -> PlayfieldBounds {
        world.bounds
    }

    /// Tuning profile threaded through the session.
    #[must_use]
    pub fn tuning(world: &World) -> &BattlefieldTuning {
        &world.tuning
    }

    /// The static collision grid of the battlefield.
    #[must_use]
    pub fn terrain(world: &World) -> &TerrainGrid {
        &world.terrain
    }

    /// Reports whether the wall cell under the world position blocks movement.
    #[must_use]
    pub fn is_blocked(world: &World, world_x: f32, world_y: f32) -> bool {
        world.terrain.is_blocked(world_x, world_y)
    }

    /// Captures a read-only view of the invader formation.
    #[must_use]
    pub fn invader_view(world: &World) -> InvaderView {
        match world.formation.as_ref() {
            Some(formation) => {
                InvaderView::from_snapshots(formation.snapshots(), formation.march_frame())
            }
            None => InvaderView::default(),
        }
    }

    /// Current horizontal heading of the formation.
    #[must_use]
    pub fn formation_heading(world: &World) -> HorizontalHeading {
        world
            .formation
            .as_ref()
            .map_or(HorizontalHeading::Right, Formation::heading)
    }

    /// Captures a read-only view of all live bullets.
    #[must_use]
    pub fn bullet_view(world: &World) -> BulletView {
        BulletView::from_snapshots(world.bullets.snapshots())
    }

    /// Captures a snapshot of the player ship.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        world.player.snapshot()
    }

    /// Captures a snapshot of the scoring state machine.
    #[must_use]
    pub fn scoreboard(world: &World) -> ScoreboardSnapshot {
        world
            .scoreboard
            .snapshot(world.arsenal.selected(), world.arsenal.effective())
    }

    /// Number of scheduled actions still pending against the session clock.
    #[must_use]
    pub fn pending_actions(world: &World) -> usize {
        world.schedule.len()
    }
}
