#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic lockstep controller for the invader formation.
//!
//! The director reacts to [`Event::TimeAdvanced`] with at most one movement
//! and one shot per call. Movement reverses into a descend before anyone
//! steps over a boundary, and shooters are drawn from the bottom-most live
//! invader of each occupied column, so no invader ever fires through a
//! teammate below it.

use std::collections::BTreeMap;
use std::time::Duration;

use grid_assault_core::{
    Command, DifficultyLevel, Event, FormationMovement, FormationTuning, HorizontalHeading,
    InvaderId, InvaderPhase, InvaderSnapshot, InvaderView, PlayfieldBounds, SessionPhase,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

/// Configuration parameters required to construct the director.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided session seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Pure system driving formation movement and shooting cadence.
#[derive(Debug)]
pub struct FormationDirector {
    session_seed: u64,
    rng: ChaCha8Rng,
    move_accumulator: Duration,
    shoot_accumulator: Duration,
    initial_count: u32,
}

impl FormationDirector {
    /// Creates a new director using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            session_seed: config.rng_seed,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            move_accumulator: Duration::ZERO,
            shoot_accumulator: Duration::ZERO,
            initial_count: 0,
        }
    }

    /// Consumes events and immutable views to emit formation commands.
    ///
    /// `is_world_blocked` answers whether a world position sits inside a
    /// wall cell; blocked terrain reverses the formation exactly like a
    /// playfield edge would.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        phase: SessionPhase,
        view: &InvaderView,
        heading: HorizontalHeading,
        bounds: PlayfieldBounds,
        tuning: &FormationTuning,
        difficulty: DifficultyLevel,
        is_world_blocked: F,
        out: &mut Vec<Command>,
    ) where
        F: Fn(f32, f32) -> bool,
    {
        let mut accumulated = Duration::ZERO;
        for event in events {
            match event {
                Event::WaveStarted { wave, invaders } => {
                    self.rng =
                        ChaCha8Rng::seed_from_u64(derive_wave_seed(self.session_seed, *wave));
                    self.initial_count = *invaders;
                    self.move_accumulator = Duration::ZERO;
                    self.shoot_accumulator = Duration::ZERO;
                }
                Event::TimeAdvanced { dt } => {
                    accumulated = accumulated.saturating_add(*dt);
                }
                _ => {}
            }
        }

        if phase != SessionPhase::Combat {
            self.move_accumulator = Duration::ZERO;
            self.shoot_accumulator = Duration::ZERO;
            return;
        }

        if accumulated.is_zero() {
            return;
        }

        let marching: Vec<&InvaderSnapshot> = view
            .iter()
            .filter(|snapshot| snapshot.phase == InvaderPhase::Marching)
            .collect();
        if marching.is_empty() {
            return;
        }

        let remaining = view.len() as u32;
        let initial = self.initial_count.max(remaining);

        self.move_accumulator = self.move_accumulator.saturating_add(accumulated);
        let move_delay = tuning.move_delay(remaining, initial, difficulty);
        if self.move_accumulator >= move_delay {
            self.move_accumulator -= move_delay;
            self.move_accumulator = self.move_accumulator.min(move_delay);

            let movement = if crosses_boundary(&marching, heading, bounds, tuning, &is_world_blocked)
            {
                FormationMovement::Descend
            } else {
                FormationMovement::Across
            };
            out.push(Command::ShiftFormation { movement });
        }

        self.shoot_accumulator = self.shoot_accumulator.saturating_add(accumulated);
        let shoot_delay = tuning.shoot_delay(remaining, initial, difficulty);
        if self.shoot_accumulator >= shoot_delay {
            self.shoot_accumulator -= shoot_delay;
            self.shoot_accumulator = self.shoot_accumulator.min(shoot_delay);

            if let Some(shooter) = self.select_shooter(&marching) {
                out.push(Command::SpawnInvaderBullet { shooter });
            }
        }
    }

    /// Picks a random bottom-most marching invader across occupied columns.
    fn select_shooter(&mut self, marching: &[&InvaderSnapshot]) -> Option<InvaderId> {
        let mut columns: BTreeMap<u32, (u32, InvaderId)> = BTreeMap::new();
        for snapshot in marching {
            let column = snapshot.formation.column();
            let row = snapshot.formation.row();
            match columns.get(&column) {
                Some((bottom_row, _)) if *bottom_row >= row => {}
                _ => {
                    let _ = columns.insert(column, (row, snapshot.id));
                }
            }
        }
        if columns.is_empty() {
            return None;
        }
        let eligible: Vec<InvaderId> = columns.values().map(|(_, id)| *id).collect();
        let index = self.rng.gen_range(0..eligible.len());
        Some(eligible[index])
    }
}

/// Decides whether the pending horizontal step would leave the playable
/// band, using the current extent of the marching formation before anyone
/// actually moves.
fn crosses_boundary<F>(
    marching: &[&InvaderSnapshot],
    heading: HorizontalHeading,
    bounds: PlayfieldBounds,
    tuning: &FormationTuning,
    is_world_blocked: &F,
) -> bool
where
    F: Fn(f32, f32) -> bool,
{
    let step = heading.sign() * tuning.horizontal_step;
    marching.iter().any(|snapshot| {
        let next_x = snapshot.position.x() + step;
        next_x < tuning.side_margin
            || next_x > bounds.width() - tuning.side_margin
            || is_world_blocked(next_x, snapshot.position.y())
    })
}

fn derive_wave_seed(session_seed: u64, wave: u32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(session_seed.to_le_bytes());
    hasher.update(wave.to_le_bytes());
    let digest = hasher.finalize();
    let bytes: [u8; 8] = digest[0..8].try_into().expect("sha256 digest slice length");
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_assault_core::{FormationCoord, WorldPoint};

    fn snapshot(id: u32, row: u32, column: u32, x: f32, y: f32) -> InvaderSnapshot {
        InvaderSnapshot {
            id: InvaderId::new(id),
            position: WorldPoint::new(x, y),
            formation: FormationCoord::new(row, column),
            phase: InvaderPhase::Marching,
            sprite_variant: 0,
        }
    }

    fn director() -> FormationDirector {
        FormationDirector::new(Config::new(0x5eed_cafe))
    }

    fn open(_x: f32, _y: f32) -> bool {
        false
    }

    #[test]
    fn wave_seed_derivation_is_stable_per_wave() {
        let first = derive_wave_seed(42, 1);
        let second = derive_wave_seed(42, 1);
        let other_wave = derive_wave_seed(42, 2);
        assert_eq!(first, second);
        assert_ne!(first, other_wave);
    }

    #[test]
    fn shooters_come_from_the_bottom_of_each_column() {
        let mut system = director();
        // Column 0 stacked two deep, column 1 single; ids 0 and 2 are on top.
        let snapshots = vec![
            snapshot(0, 0, 0, 100.0, 64.0),
            snapshot(1, 1, 0, 100.0, 104.0),
            snapshot(2, 0, 1, 148.0, 64.0),
        ];
        let view = InvaderView::from_snapshots(snapshots, 0);
        let marching: Vec<&InvaderSnapshot> = view.iter().collect();

        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..64 {
            let shooter = system.select_shooter(&marching).expect("columns occupied");
            let _ = seen.insert(shooter.get());
        }

        assert!(seen.contains(&1), "bottom of column 0 fires");
        assert!(seen.contains(&2), "bottom of column 1 fires");
        assert!(!seen.contains(&0), "occluded invader never fires");
    }

    #[test]
    fn exploding_invaders_are_not_eligible_shooters() {
        let mut system = director();
        let mut bottom = snapshot(1, 1, 0, 100.0, 104.0);
        bottom.phase = InvaderPhase::Exploding { frame: 0 };
        let view = InvaderView::from_snapshots(
            vec![snapshot(0, 0, 0, 100.0, 64.0), bottom],
            0,
        );
        let marching: Vec<&InvaderSnapshot> = view
            .iter()
            .filter(|snapshot| snapshot.phase == InvaderPhase::Marching)
            .collect();

        for _ in 0..16 {
            assert_eq!(
                system.select_shooter(&marching),
                Some(InvaderId::new(0)),
                "the survivor above inherits the firing slot",
            );
        }
    }

    #[test]
    fn formation_marches_across_in_open_field() {
        let mut system = director();
        let tuning = FormationTuning::default();
        let bounds = PlayfieldBounds::new(800.0, 600.0);
        let view = InvaderView::from_snapshots(vec![snapshot(0, 0, 0, 400.0, 64.0)], 0);
        let mut out = Vec::new();

        system.handle(
            &[
                Event::WaveStarted {
                    wave: 1,
                    invaders: 1,
                },
                Event::TimeAdvanced {
                    dt: tuning.move_delay_max,
                },
            ],
            SessionPhase::Combat,
            &view,
            HorizontalHeading::Right,
            bounds,
            &tuning,
            DifficultyLevel::Standard,
            open,
            &mut out,
        );

        assert!(out.contains(&Command::ShiftFormation {
            movement: FormationMovement::Across,
        }));
    }

    #[test]
    fn pending_step_over_the_edge_turns_into_a_descend() {
        let mut system = director();
        let tuning = FormationTuning::default();
        let bounds = PlayfieldBounds::new(800.0, 600.0);
        // One step short of the right margin.
        let edge_x = bounds.width() - tuning.side_margin - tuning.horizontal_step / 2.0;
        let view = InvaderView::from_snapshots(vec![snapshot(0, 0, 0, edge_x, 64.0)], 0);
        let mut out = Vec::new();

        system.handle(
            &[
                Event::WaveStarted {
                    wave: 1,
                    invaders: 1,
                },
                Event::TimeAdvanced {
                    dt: tuning.move_delay_max,
                },
            ],
            SessionPhase::Combat,
            &view,
            HorizontalHeading::Right,
            bounds,
            &tuning,
            DifficultyLevel::Standard,
            open,
            &mut out,
        );

        assert!(out.contains(&Command::ShiftFormation {
            movement: FormationMovement::Descend,
        }));
    }

    #[test]
    fn blocked_terrain_reverses_like_an_edge() {
        let mut system = director();
        let tuning = FormationTuning::default();
        let bounds = PlayfieldBounds::new(800.0, 600.0);
        let view = InvaderView::from_snapshots(vec![snapshot(0, 0, 0, 400.0, 64.0)], 0);
        let mut out = Vec::new();

        system.handle(
            &[
                Event::WaveStarted {
                    wave: 1,
                    invaders: 1,
                },
                Event::TimeAdvanced {
                    dt: tuning.move_delay_max,
                },
            ],
            SessionPhase::Combat,
            &view,
            HorizontalHeading::Right,
            bounds,
            &tuning,
            DifficultyLevel::Standard,
            |_, _| true,
            &mut out,
        );

        assert!(out.contains(&Command::ShiftFormation {
            movement: FormationMovement::Descend,
        }));
    }

    #[test]
    fn no_commands_before_the_cadence_elapses() {
        let mut system = director();
        let tuning = FormationTuning::default();
        let bounds = PlayfieldBounds::new(800.0, 600.0);
        let view = InvaderView::from_snapshots(vec![snapshot(0, 0, 0, 400.0, 64.0)], 0);
        let mut out = Vec::new();

        system.handle(
            &[
                Event::WaveStarted {
                    wave: 1,
                    invaders: 55,
                },
                Event::TimeAdvanced {
                    dt: Duration::from_millis(10),
                },
            ],
            SessionPhase::Combat,
            &view,
            HorizontalHeading::Right,
            bounds,
            &tuning,
            DifficultyLevel::Standard,
            open,
            &mut out,
        );

        assert!(out.is_empty());
    }

    #[test]
    fn non_combat_phases_reset_the_cadence() {
        let mut system = director();
        let tuning = FormationTuning::default();
        let bounds = PlayfieldBounds::new(800.0, 600.0);
        let view = InvaderView::from_snapshots(vec![snapshot(0, 0, 0, 400.0, 64.0)], 0);
        let mut out = Vec::new();

        // Accumulate almost a full delay, then lose it to a cleared phase.
        system.handle(
            &[Event::TimeAdvanced {
                dt: tuning.move_delay_min,
            }],
            SessionPhase::Combat,
            &view,
            HorizontalHeading::Right,
            bounds,
            &tuning,
            DifficultyLevel::Standard,
            open,
            &mut out,
        );
        system.handle(
            &[Event::TimeAdvanced {
                dt: Duration::from_secs(5),
            }],
            SessionPhase::Cleared,
            &view,
            HorizontalHeading::Right,
            bounds,
            &tuning,
            DifficultyLevel::Standard,
            open,
            &mut out,
        );
        system.handle(
            &[Event::TimeAdvanced {
                dt: Duration::from_millis(10),
            }],
            SessionPhase::Combat,
            &view,
            HorizontalHeading::Right,
            bounds,
            &tuning,
            DifficultyLevel::Standard,
            open,
            &mut out,
        );

        assert!(out.is_empty());
    }
}
