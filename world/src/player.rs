//! Player ship movement model and lifecycle.

use std::time::Duration;

use grid_assault_core::{
    PlayerPhase, PlayerSnapshot, PlayerTuning, PlayfieldBounds, Steering, WorldPoint, WorldVector,
};

use crate::terrain::TerrainGrid;

const EXPLOSION_FRAMES: u8 = 3;
const EXIT_SPEED_FACTOR: f32 = 1.2;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Active,
    Exploding { frame: u8, elapsed: Duration },
    Down,
    Exiting,
}

/// The one player ship of a session.
///
/// Velocity is eased toward the steering intent rather than applied
/// instantaneously, and movement is rejected per axis against wall cells.
#[derive(Debug)]
pub(crate) struct PlayerShip {
    position: WorldPoint,
    velocity: WorldVector,
    steering: Steering,
    phase: Phase,
    spawn_point: WorldPoint,
}

impl PlayerShip {
    pub(crate) fn new(spawn_point: WorldPoint) -> Self {
        Self {
            position: spawn_point,
            velocity: WorldVector::default(),
            steering: Steering::default(),
            phase: Phase::Active,
            spawn_point,
        }
    }

    pub(crate) fn set_steering(&mut self, steering: Steering) {
        self.steering = steering;
    }

    pub(crate) fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    pub(crate) fn position(&self) -> WorldPoint {
        self.position
    }

    /// Starts the death animation; further hits are ignored until respawn.
    pub(crate) fn ignite_explosion(&mut self) {
        self.phase = Phase::Exploding {
            frame: 0,
            elapsed: Duration::ZERO,
        };
    }

    /// Brings the ship back at its spawn point with neutral momentum.
    pub(crate) fn respawn(&mut self) {
        self.position = self.spawn_point;
        self.velocity = WorldVector::default();
        self.steering = Steering::default();
        self.phase = Phase::Active;
    }

    /// Sends an active ship flying off the field after a cleared wave.
    pub(crate) fn begin_exit(&mut self) {
        if self.phase == Phase::Active {
            self.phase = Phase::Exiting;
        }
    }

    /// Resets the ship for a fresh wave at the provided spawn point.
    pub(crate) fn reset(&mut self, spawn_point: WorldPoint) {
        self.spawn_point = spawn_point;
        self.respawn();
    }

    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        terrain: &TerrainGrid,
        bounds: PlayfieldBounds,
        tuning: &PlayerTuning,
        explosion_frame: Duration,
    ) {
        match self.phase {
            Phase::Active => self.advance_active(dt, terrain, bounds, tuning),
            Phase::Exploding { frame, elapsed } => {
                let mut frame = frame;
                let mut elapsed = elapsed.saturating_add(dt);
                while elapsed >= explosion_frame && frame < EXPLOSION_FRAMES {
                    elapsed -= explosion_frame;
                    frame += 1;
                }
                self.phase = if frame >= EXPLOSION_FRAMES {
                    Phase::Down
                } else {
                    Phase::Exploding { frame, elapsed }
                };
            }
            Phase::Down => {
                self.velocity = WorldVector::default();
            }
            Phase::Exiting => {
                let ascent = tuning.speed * EXIT_SPEED_FACTOR;
                self.velocity = WorldVector::new(0.0, -ascent);
                self.position = self.position.offset_by(0.0, -ascent * dt.as_secs_f32());
            }
        }
    }

    fn advance_active(
        &mut self,
        dt: Duration,
        terrain: &TerrainGrid,
        bounds: PlayfieldBounds,
        tuning: &PlayerTuning,
    ) {
        let seconds = dt.as_secs_f32();
        let speed = if self.steering.run {
            tuning.speed * tuning.run_multiplier
        } else {
            tuning.speed
        };
        let target = WorldVector::new(
            self.steering.horizontal.sign() * speed,
            self.steering.vertical.sign() * speed,
        );

        let blend = (tuning.easing * seconds).min(1.0);
        self.velocity = WorldVector::new(
            self.velocity.dx() + (target.dx() - self.velocity.dx()) * blend,
            self.velocity.dy() + (target.dy() - self.velocity.dy()) * blend,
        );

        let radius = tuning.collision_radius;

        let next_x = self.position.x() + self.velocity.dx() * seconds;
        let next_x = next_x.clamp(radius, bounds.width() - radius);
        if terrain.is_blocked(next_x, self.position.y()) {
            self.velocity = WorldVector::new(0.0, self.velocity.dy());
        } else {
            self.position = WorldPoint::new(next_x, self.position.y());
        }

        let next_y = self.position.y() + self.velocity.dy() * seconds;
        let next_y = next_y.clamp(radius, bounds.height() - radius);
        if terrain.is_blocked(self.position.x(), next_y) {
            self.velocity = WorldVector::new(self.velocity.dx(), 0.0);
        } else {
            self.position = WorldPoint::new(self.position.x(), next_y);
        }
    }

    pub(crate) fn snapshot(&self) -> PlayerSnapshot {
        let phase = match self.phase {
            Phase::Active => PlayerPhase::Active,
            Phase::Exploding { frame, .. } => PlayerPhase::Exploding { frame },
            Phase::Down => PlayerPhase::Down,
            Phase::Exiting => PlayerPhase::Exiting,
        };
        PlayerSnapshot {
            position: self.position,
            velocity: self.velocity,
            phase,
        }
    }
}
