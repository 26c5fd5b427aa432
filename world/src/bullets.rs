//! Projectile pool: spawn caps, advancement, and collision sweeps.

use std::time::Duration;

use grid_assault_core::{
    BulletId, BulletOwner, BulletSnapshot, Direction, GunKind, PlayfieldBounds, WorldPoint,
};

use crate::terrain::TerrainGrid;

#[derive(Clone, Copy, Debug)]
struct Bullet {
    id: BulletId,
    position: WorldPoint,
    direction: Direction,
    owner: BulletOwner,
    gun: Option<GunKind>,
    speed: f32,
    radius: f32,
    lifetime: Option<Duration>,
    blast_radius: u32,
    age: Duration,
}

/// A player bullet that connected with an invader this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct InvaderStrike {
    pub(crate) target: grid_assault_core::InvaderId,
    pub(crate) blast_radius: u32,
}

/// Everything that happened to the bullet pool during one tick.
#[derive(Debug, Default)]
pub(crate) struct TickReport {
    pub(crate) invader_hits: Vec<InvaderStrike>,
    pub(crate) player_struck: bool,
    pub(crate) wall_impacts: Vec<WorldPoint>,
}

/// All live bullets, exclusively owned by the world.
///
/// Each tick rebuilds the pool in a single batch pass so that every
/// collision check observes the same entity snapshot, and a bullet marked
/// for destruction participates in no further checks that tick.
#[derive(Debug, Default)]
pub(crate) struct BulletSwarm {
    bullets: Vec<Bullet>,
    next_id: u32,
}

impl BulletSwarm {
    /// Spawns a player bullet heading up-field.
    ///
    /// Rejected silently once the gun's on-screen cap is reached.
    pub(crate) fn spawn_player(&mut self, gun: GunKind, from: WorldPoint) -> bool {
        let spec = gun.spec();
        let live = self
            .bullets
            .iter()
            .filter(|bullet| bullet.gun == Some(gun))
            .count();
        if live >= spec.bullet.max_on_screen {
            return false;
        }
        let id = self.allocate_id();
        self.push(Bullet {
            id,
            position: from,
            direction: Direction::North,
            owner: BulletOwner::Player,
            gun: Some(gun),
            speed: spec.bullet.speed,
            radius: spec.bullet.radius,
            lifetime: spec.bullet.lifetime,
            blast_radius: spec.blast_radius,
            age: Duration::ZERO,
        });
        true
    }

    /// Spawns an invader bullet heading down-field.
    ///
    /// Rejected silently once the global invader-bullet cap is reached.
    pub(crate) fn spawn_invader(
        &mut self,
        from: WorldPoint,
        speed: f32,
        radius: f32,
        cap: usize,
    ) -> bool {
        let live = self
            .bullets
            .iter()
            .filter(|bullet| bullet.owner == BulletOwner::Invader)
            .count();
        if live >= cap {
            return false;
        }
        let id = self.allocate_id();
        self.push(Bullet {
            id,
            position: from,
            direction: Direction::South,
            owner: BulletOwner::Invader,
            gun: None,
            speed,
            radius,
            lifetime: None,
            blast_radius: 0,
            age: Duration::ZERO,
        });
        true
    }

    fn allocate_id(&mut self) -> BulletId {
        let id = BulletId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    fn push(&mut self, bullet: Bullet) {
        self.bullets.push(bullet);
    }

    pub(crate) fn clear(&mut self) {
        self.bullets.clear();
    }

    /// Advances every bullet one tick and commits the survivors in a batch.
    ///
    /// Per-bullet order: lifetime expiry, playfield bounds with a one-tile
    /// margin, wall cells, then the circle test against opposing entities.
    /// A player bullet kills at most one invader; the first overlap wins.
    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        terrain: &TerrainGrid,
        bounds: PlayfieldBounds,
        invader_targets: &[(grid_assault_core::InvaderId, WorldPoint)],
        invader_radius: f32,
        player: Option<WorldPoint>,
        player_radius: f32,
    ) -> TickReport {
        let mut report = TickReport::default();
        let seconds = dt.as_secs_f32();
        let margin = terrain.tile_length();

        let previous = std::mem::take(&mut self.bullets);
        let mut retained = Vec::with_capacity(previous.len());

        for mut bullet in previous {
            bullet.age = bullet.age.saturating_add(dt);
            if let Some(lifetime) = bullet.lifetime {
                if bullet.age >= lifetime {
                    continue;
                }
            }

            let (unit_x, unit_y) = bullet.direction.unit_vector();
            bullet.position = bullet
                .position
                .offset_by(unit_x * bullet.speed * seconds, unit_y * bullet.speed * seconds);

            if !bounds.contains_with_margin(bullet.position, margin) {
                continue;
            }

            if terrain.is_blocked(bullet.position.x(), bullet.position.y()) {
                report.wall_impacts.push(bullet.position);
                continue;
            }

            match bullet.owner {
                BulletOwner::Player => {
                    let mut struck = false;
                    for (id, position) in invader_targets {
                        if bullet.position.distance_to(*position) < bullet.radius + invader_radius {
                            report.invader_hits.push(InvaderStrike {
                                target: *id,
                                blast_radius: bullet.blast_radius,
                            });
                            struck = true;
                            break;
                        }
                    }
                    if struck {
                        continue;
                    }
                }
                BulletOwner::Invader => {
                    if let Some(target) = player {
                        if bullet.position.distance_to(target) < bullet.radius + player_radius {
                            report.player_struck = true;
                            continue;
                        }
                    }
                }
            }

            retained.push(bullet);
        }

        self.bullets = retained;
        report
    }

    pub(crate) fn snapshots(&self) -> Vec<BulletSnapshot> {
        self.bullets
            .iter()
            .map(|bullet| BulletSnapshot {
                id: bullet.id,
                position: bullet.position,
                direction: bullet.direction,
                owner: bullet.owner,
            })
            .collect()
    }
}
