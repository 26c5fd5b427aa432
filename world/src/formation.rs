//! Live invader formation: lockstep geometry, explosions, and kill rings.

use std::time::Duration;

use grid_assault_core::{
    FormationCoord, FormationMovement, FormationTemplate, FormationTuning, HorizontalHeading,
    InvaderId, InvaderPhase, InvaderSnapshot, PlayfieldBounds, WorldPoint,
};

const EXPLOSION_FRAMES: u8 = 3;
const SPRITE_VARIANTS: u8 = 3;

#[derive(Clone, Copy, Debug)]
struct Explosion {
    frame: u8,
    elapsed: Duration,
}

#[derive(Debug)]
struct Invader {
    id: InvaderId,
    position: WorldPoint,
    coord: FormationCoord,
    sprite_variant: u8,
    explosion: Option<Explosion>,
}

impl Invader {
    fn is_marching(&self) -> bool {
        self.explosion.is_none()
    }
}

/// An invader that finished its death animation and left the live set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RemovedInvader {
    pub(crate) id: InvaderId,
    pub(crate) row: u32,
}

/// The full grid of live invaders moving in lockstep.
#[derive(Debug)]
pub(crate) struct Formation {
    invaders: Vec<Invader>,
    heading: HorizontalHeading,
    initial_count: u32,
    march_frame: u8,
}

impl Formation {
    /// Spawns the live set from a template, centered horizontally regardless
    /// of template width. Formation coordinates are fixed for life.
    pub(crate) fn spawn(
        template: &FormationTemplate,
        bounds: PlayfieldBounds,
        tuning: &FormationTuning,
    ) -> Self {
        let span = template.columns().saturating_sub(1) as f32 * tuning.column_spacing;
        let left = (bounds.width() - span) / 2.0;

        let mut invaders = Vec::with_capacity(template.count() as usize);
        let mut next_id = 0;
        for row in 0..template.rows() {
            for column in 0..template.columns() {
                if !template.occupied(row, column) {
                    continue;
                }
                invaders.push(Invader {
                    id: InvaderId::new(next_id),
                    position: WorldPoint::new(
                        left + column as f32 * tuning.column_spacing,
                        tuning.top_margin + row as f32 * tuning.row_spacing,
                    ),
                    coord: FormationCoord::new(row, column),
                    sprite_variant: (row % u32::from(SPRITE_VARIANTS)) as u8,
                    explosion: None,
                });
                next_id += 1;
            }
        }

        let initial_count = invaders.len() as u32;
        Self {
            invaders,
            heading: HorizontalHeading::Right,
            initial_count,
            march_frame: 0,
        }
    }

    /// Invaders not yet removed, exploding ones included.
    pub(crate) fn live_count(&self) -> u32 {
        self.invaders.len() as u32
    }

    pub(crate) fn initial_count(&self) -> u32 {
        self.initial_count
    }

    pub(crate) fn is_cleared(&self) -> bool {
        self.invaders.is_empty()
    }

    pub(crate) fn heading(&self) -> HorizontalHeading {
        self.heading
    }

    /// Applies one lockstep movement to every marching invader.
    ///
    /// Exploding invaders hold still; a descend also flips the heading.
    pub(crate) fn shift(&mut self, movement: FormationMovement, tuning: &FormationTuning) {
        let (dx, dy) = match movement {
            FormationMovement::Across => (self.heading.sign() * tuning.horizontal_step, 0.0),
            FormationMovement::Descend => (0.0, tuning.vertical_step),
        };
        for invader in self.invaders.iter_mut().filter(|invader| invader.is_marching()) {
            invader.position = invader.position.offset_by(dx, dy);
        }
        if movement == FormationMovement::Descend {
            self.heading = self.heading.flipped();
        }
        self.march_frame ^= 1;
    }

    /// Starts the death animation of a marching invader.
    ///
    /// Returns the invader's formation coordinates on the transition, or
    /// `None` when the invader is already exploding or gone, so a single
    /// invader can never be ignited twice.
    pub(crate) fn ignite(&mut self, id: InvaderId) -> Option<FormationCoord> {
        let invader = self
            .invaders
            .iter_mut()
            .find(|invader| invader.id == id && invader.is_marching())?;
        invader.explosion = Some(Explosion {
            frame: 0,
            elapsed: Duration::ZERO,
        });
        Some(invader.coord)
    }

    /// Groups marching invaders by Chebyshev radius from the ring center.
    ///
    /// Radii beyond `max_radius` are excluded entirely.
    pub(crate) fn ring_targets(
        &self,
        center: FormationCoord,
        max_radius: u32,
    ) -> Vec<(u32, InvaderId)> {
        let mut targets: Vec<(u32, InvaderId)> = self
            .invaders
            .iter()
            .filter(|invader| invader.is_marching())
            .map(|invader| (invader.coord.chebyshev_distance(center), invader.id))
            .filter(|(radius, _)| *radius <= max_radius)
            .collect();
        targets.sort_unstable();
        targets
    }

    /// Rounded geometric center of the marching invaders' formation coords.
    pub(crate) fn center_coord(&self) -> Option<FormationCoord> {
        let marching: Vec<&Invader> = self
            .invaders
            .iter()
            .filter(|invader| invader.is_marching())
            .collect();
        if marching.is_empty() {
            return None;
        }
        let count = marching.len() as f32;
        let row_sum: f32 = marching.iter().map(|invader| invader.coord.row() as f32).sum();
        let column_sum: f32 = marching
            .iter()
            .map(|invader| invader.coord.column() as f32)
            .sum();
        Some(FormationCoord::new(
            (row_sum / count).round() as u32,
            (column_sum / count).round() as u32,
        ))
    }

    /// Advances death animations, removing invaders that played all frames.
    pub(crate) fn advance_explosions(
        &mut self,
        dt: Duration,
        frame_duration: Duration,
    ) -> Vec<RemovedInvader> {
        let mut removed = Vec::new();
        self.invaders.retain_mut(|invader| {
            let Some(explosion) = invader.explosion.as_mut() else {
                return true;
            };
            explosion.elapsed = explosion.elapsed.saturating_add(dt);
            while explosion.elapsed >= frame_duration && explosion.frame < EXPLOSION_FRAMES {
                explosion.elapsed -= frame_duration;
                explosion.frame += 1;
            }
            if explosion.frame >= EXPLOSION_FRAMES {
                removed.push(RemovedInvader {
                    id: invader.id,
                    row: invader.coord.row(),
                });
                false
            } else {
                true
            }
        });
        removed
    }

    /// Lowest (largest-y) marching invader position.
    pub(crate) fn lowest_y(&self) -> Option<f32> {
        self.invaders
            .iter()
            .filter(|invader| invader.is_marching())
            .map(|invader| invader.position.y())
            .fold(None, |lowest, y| Some(lowest.map_or(y, |l: f32| l.max(y))))
    }

    /// Position of a marching invader, for bullet spawns.
    pub(crate) fn shooter_position(&self, id: InvaderId) -> Option<WorldPoint> {
        self.invaders
            .iter()
            .find(|invader| invader.id == id && invader.is_marching())
            .map(|invader| invader.position)
    }

    /// Reports whether any marching invader overlaps the given circle.
    pub(crate) fn overlaps_circle(&self, center: WorldPoint, radius: f32, own_radius: f32) -> bool {
        self.invaders
            .iter()
            .filter(|invader| invader.is_marching())
            .any(|invader| invader.position.distance_to(center) < radius + own_radius)
    }

    /// Positions of marching invaders for bullet collision checks.
    pub(crate) fn bullet_targets(&self) -> Vec<(InvaderId, WorldPoint)> {
        self.invaders
            .iter()
            .filter(|invader| invader.is_marching())
            .map(|invader| (invader.id, invader.position))
            .collect()
    }

    pub(crate) fn snapshots(&self) -> Vec<InvaderSnapshot> {
        self.invaders
            .iter()
            .map(|invader| InvaderSnapshot {
                id: invader.id,
                position: invader.position,
                formation: invader.coord,
                phase: match invader.explosion {
                    None => InvaderPhase::Marching,
                    Some(explosion) => InvaderPhase::Exploding {
                        frame: explosion.frame,
                    },
                },
                sprite_variant: invader.sprite_variant,
            })
            .collect()
    }

    pub(crate) fn march_frame(&self) -> u8 {
        self.march_frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_classic() -> (Formation, FormationTuning) {
        let tuning = FormationTuning::default();
        let formation = Formation::spawn(
            &FormationTemplate::classic(),
            PlayfieldBounds::new(800.0, 600.0),
            &tuning,
        );
        (formation, tuning)
    }

    fn marching_extent(formation: &Formation) -> (f32, f32) {
        let mut extent: Option<(f32, f32)> = None;
        for snapshot in formation.snapshots() {
            if !matches!(snapshot.phase, InvaderPhase::Marching) {
                continue;
            }
            let x = snapshot.position.x();
            extent = Some(match extent {
                Some((min, max)) => (min.min(x), max.max(x)),
                None => (x, x),
            });
        }
        extent.expect("formation is populated")
    }

    #[test]
    fn spawn_centers_the_formation_horizontally() {
        let (formation, tuning) = spawn_classic();
        let (min, max) = marching_extent(&formation);
        let span = 10.0 * tuning.column_spacing;
        assert!((min - (800.0 - span) / 2.0).abs() < 0.001);
        assert!((max - (800.0 + span) / 2.0).abs() < 0.001);
    }

    #[test]
    fn formation_coords_are_unique_across_the_live_set() {
        let (formation, _) = spawn_classic();
        let mut coords: Vec<FormationCoord> = formation
            .snapshots()
            .into_iter()
            .map(|snapshot| snapshot.formation)
            .collect();
        let total = coords.len();
        coords.sort_unstable();
        coords.dedup();
        assert_eq!(coords.len(), total);
        assert_eq!(total, 55);
    }

    #[test]
    fn across_step_moves_everyone_with_the_heading() {
        let (mut formation, tuning) = spawn_classic();
        let before = marching_extent(&formation);
        formation.shift(FormationMovement::Across, &tuning);
        let after = marching_extent(&formation);
        assert!((after.0 - before.0 - tuning.horizontal_step).abs() < 0.001);
        assert_eq!(formation.heading(), HorizontalHeading::Right);
    }

    #[test]
    fn descend_drops_everyone_and_flips_the_heading() {
        let (mut formation, tuning) = spawn_classic();
        let x_before = marching_extent(&formation);
        let y_before = formation.lowest_y().expect("populated");

        formation.shift(FormationMovement::Descend, &tuning);

        let x_after = marching_extent(&formation);
        let y_after = formation.lowest_y().expect("populated");
        assert_eq!(x_before, x_after);
        assert!((y_after - y_before - tuning.vertical_step).abs() < 0.001);
        assert_eq!(formation.heading(), HorizontalHeading::Left);
    }

    #[test]
    fn exploding_invaders_hold_still_during_shifts() {
        let (mut formation, tuning) = spawn_classic();
        let victim = formation.snapshots()[0].id;
        let frozen_x = formation.snapshots()[0].position.x();
        assert!(formation.ignite(victim).is_some());

        formation.shift(FormationMovement::Across, &tuning);

        let snapshot = formation
            .snapshots()
            .into_iter()
            .find(|snapshot| snapshot.id == victim)
            .expect("victim still animating");
        assert!((snapshot.position.x() - frozen_x).abs() < 0.001);
    }

    #[test]
    fn ignite_refuses_double_ignition() {
        let (mut formation, _) = spawn_classic();
        let victim = formation.snapshots()[0].id;
        assert!(formation.ignite(victim).is_some());
        assert!(formation.ignite(victim).is_none());
    }

    #[test]
    fn explosion_removes_the_invader_after_three_frames() {
        let (mut formation, tuning) = spawn_classic();
        let victim = formation.snapshots()[0].id;
        assert!(formation.ignite(victim).is_some());

        let removed = formation.advance_explosions(
            tuning.explosion_frame * u32::from(EXPLOSION_FRAMES),
            tuning.explosion_frame,
        );

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, victim);
        assert_eq!(formation.live_count(), 54);
    }

    #[test]
    fn ring_targets_respect_the_radius_boundary() {
        let (formation, _) = spawn_classic();
        let center = FormationCoord::new(2, 5);
        let targets = formation.ring_targets(center, 2);

        assert!(targets
            .iter()
            .any(|(radius, _)| *radius == 2));
        assert!(targets.iter().all(|(radius, _)| *radius <= 2));
        // A 5x11 grid has coords out at Chebyshev radius 5 from (2, 5).
        let wide = formation.ring_targets(center, 5);
        assert!(wide.len() > targets.len());
    }

    #[test]
    fn center_coord_tracks_the_survivors() {
        let (mut formation, _) = spawn_classic();
        assert_eq!(formation.center_coord(), Some(FormationCoord::new(2, 5)));

        // Blow away everything except the top-left invader.
        let survivors: Vec<InvaderId> = formation
            .snapshots()
            .into_iter()
            .skip(1)
            .map(|snapshot| snapshot.id)
            .collect();
        for id in survivors {
            assert!(formation.ignite(id).is_some());
        }
        assert_eq!(formation.center_coord(), Some(FormationCoord::new(0, 0)));
    }
}
