#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Grid Assault engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.
//!
//! World coordinates are pixels with the origin in the top-left corner; the
//! y axis grows downward, so [`Direction::North`] is the player's firing
//! direction and [`Direction::South`] is the invaders' descent.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Unique identifier assigned to an invader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InvaderId(u32);

impl InvaderId {
    /// Creates a new invader identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a bullet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BulletId(u32);

impl BulletId {
    /// Creates a new bullet identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Position expressed in world pixel space.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct WorldPoint {
    x: f32,
    y: f32,
}

impl WorldPoint {
    /// Creates a new world-space point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate in pixels.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate in pixels, growing downward.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Returns the point translated by the provided deltas.
    #[must_use]
    pub fn offset_by(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(self, other: WorldPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Velocity expressed in world pixels per second.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct WorldVector {
    dx: f32,
    dy: f32,
}

impl WorldVector {
    /// Creates a new velocity vector.
    #[must_use]
    pub const fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }

    /// Horizontal component in pixels per second.
    #[must_use]
    pub const fn dx(&self) -> f32 {
        self.dx
    }

    /// Vertical component in pixels per second.
    #[must_use]
    pub const fn dy(&self) -> f32 {
        self.dy
    }
}

/// Fixed formation-grid coordinates assigned to an invader at spawn.
///
/// The pixel position of an invader moves with the formation, but its grid
/// coordinates never change and stay unique across the live set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormationCoord {
    row: u32,
    column: u32,
}

impl FormationCoord {
    /// Creates a new formation coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based formation row, counted from the top.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based formation column, counted from the left.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Computes the Chebyshev distance between two formation coordinates.
    #[must_use]
    pub fn chebyshev_distance(self, other: FormationCoord) -> u32 {
        self.row
            .abs_diff(other.row)
            .max(self.column.abs_diff(other.column))
    }
}

/// Cardinal travel directions available to bullets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward decreasing y, the player's firing direction.
    North,
    /// Movement toward increasing x.
    East,
    /// Movement toward increasing y, the invaders' firing direction.
    South,
    /// Movement toward decreasing x.
    West,
}

impl Direction {
    /// Unit vector for the direction in world space.
    #[must_use]
    pub const fn unit_vector(self) -> (f32, f32) {
        match self {
            Self::North => (0.0, -1.0),
            Self::East => (1.0, 0.0),
            Self::South => (0.0, 1.0),
            Self::West => (-1.0, 0.0),
        }
    }
}

/// Rectangular playable area measured in world pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayfieldBounds {
    width: f32,
    height: f32,
}

impl PlayfieldBounds {
    /// Creates playfield bounds with the provided dimensions.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Total playfield width in pixels.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Total playfield height in pixels.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Reports whether the point lies inside the bounds expanded by `margin`.
    #[must_use]
    pub fn contains_with_margin(&self, point: WorldPoint, margin: f32) -> bool {
        point.x() >= -margin
            && point.x() <= self.width + margin
            && point.y() >= -margin
            && point.y() <= self.height + margin
    }
}

/// Signed state of one movement axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Axis {
    /// Movement toward negative coordinates.
    Negative,
    /// No movement requested.
    #[default]
    Neutral,
    /// Movement toward positive coordinates.
    Positive,
}

impl Axis {
    /// Resolves an axis from a pair of opposing inputs.
    ///
    /// Both held at once cancel out to [`Axis::Neutral`].
    #[must_use]
    pub const fn from_flags(negative: bool, positive: bool) -> Self {
        match (negative, positive) {
            (true, false) => Self::Negative,
            (false, true) => Self::Positive,
            _ => Self::Neutral,
        }
    }

    /// Scalar sign of the axis.
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Negative => -1.0,
            Self::Neutral => 0.0,
            Self::Positive => 1.0,
        }
    }
}

/// Player movement intent derived from held inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Steering {
    /// Horizontal intent, positive toward the right edge.
    pub horizontal: Axis,
    /// Vertical intent, positive toward the bottom edge.
    pub vertical: Axis,
    /// Whether the run modifier is held.
    pub run: bool,
}

impl Steering {
    /// Reports whether no movement is requested on either axis.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.horizontal, Axis::Neutral) && matches!(self.vertical, Axis::Neutral)
    }
}

/// Input snapshot polled by the host once per frame.
///
/// `fire_pressed` is an edge-triggered press that the host reports for
/// exactly one frame; `fire_held` is the level signal automatic guns use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct InputFrame {
    /// Left movement key held.
    pub left: bool,
    /// Right movement key held.
    pub right: bool,
    /// Up movement key held.
    pub up: bool,
    /// Down movement key held.
    pub down: bool,
    /// Run modifier held.
    pub run: bool,
    /// Fire control pressed on this frame.
    pub fire_pressed: bool,
    /// Fire control currently held.
    pub fire_held: bool,
    /// Big-red-button control pressed on this frame.
    pub detonate_pressed: bool,
}

/// Player gun types selectable directly or granted by powerups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GunKind {
    /// Press-triggered cannon with a modest cadence. The fallback whenever a
    /// configured gun cannot be resolved.
    #[default]
    Standard,
    /// Automatic gun that keeps firing while the control is held.
    Rapid,
    /// Slow, heavy shot that ignites an expanding ring of kills on impact.
    Plasma,
}

impl GunKind {
    /// Returns the static firing parameters for the gun.
    #[must_use]
    pub const fn spec(self) -> GunSpec {
        match self {
            Self::Standard => GunSpec {
                fire_interval: Duration::from_millis(350),
                automatic: false,
                blast_radius: 0,
                bullet: BulletSpec {
                    speed: 540.0,
                    lifetime: None,
                    radius: 5.0,
                    max_on_screen: 2,
                },
            },
            Self::Rapid => GunSpec {
                fire_interval: Duration::from_millis(160),
                automatic: true,
                blast_radius: 0,
                bullet: BulletSpec {
                    speed: 620.0,
                    lifetime: Some(Duration::from_millis(900)),
                    radius: 4.0,
                    max_on_screen: 4,
                },
            },
            Self::Plasma => GunSpec {
                fire_interval: Duration::from_millis(650),
                automatic: false,
                blast_radius: 2,
                bullet: BulletSpec {
                    speed: 300.0,
                    lifetime: None,
                    radius: 9.0,
                    max_on_screen: 1,
                },
            },
        }
    }
}

/// Static firing parameters of a player gun.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GunSpec {
    /// Minimum time between accepted shots.
    pub fire_interval: Duration,
    /// Whether holding the fire control keeps shooting.
    pub automatic: bool,
    /// Chebyshev radius of the kill ring ignited on impact; zero disables it.
    pub blast_radius: u32,
    /// Parameters of the bullets this gun spawns.
    pub bullet: BulletSpec,
}

/// Parameters of a bullet type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BulletSpec {
    /// Travel speed in pixels per second.
    pub speed: f32,
    /// Maximum age before the bullet expires, if bounded.
    pub lifetime: Option<Duration>,
    /// Collision radius in pixels.
    pub radius: f32,
    /// On-screen cap for bullets of this type; further spawns are rejected.
    pub max_on_screen: usize,
}

/// Side that owns a bullet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BulletOwner {
    /// Fired by the player ship.
    Player,
    /// Fired by an invader.
    Invader,
}

/// Expiry mode of a temporary gun override.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PowerupGrant {
    /// The override lapses after the given duration.
    Timed(Duration),
    /// The override lapses after the given number of accepted shots.
    Shots(u32),
}

/// Difficulty levels selectable as an executive order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DifficultyLevel {
    /// Slower formation cadence.
    Lenient,
    /// Baseline cadence.
    #[default]
    Standard,
    /// Faster formation cadence.
    Brutal,
}

impl DifficultyLevel {
    /// Multiplier applied to formation movement and shooting delays.
    #[must_use]
    pub const fn cadence_factor(self) -> f32 {
        match self {
            Self::Lenient => 1.3,
            Self::Standard => 1.0,
            Self::Brutal => 0.7,
        }
    }
}

/// The full set of executive-order toggles, each independently durable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectiveSet {
    /// Damage against the player is a no-op while set.
    pub god_mode: bool,
    /// Whether the big red button may be pressed.
    pub big_red_button: bool,
    /// Formation cadence difficulty.
    pub difficulty: DifficultyLevel,
    /// HUD visibility of the accuracy read-out.
    pub hud_accuracy: bool,
    /// HUD visibility of the high score read-out.
    pub hud_high_score: bool,
    /// Whether score thresholds award extra lives.
    pub extra_life: bool,
    /// Presentation-only tax reimbursement flag.
    pub tax_reimbursement: bool,
    /// Whether the per-wave timer is tracked for the HUD.
    pub wave_timer: bool,
}

impl Default for DirectiveSet {
    fn default() -> Self {
        Self {
            god_mode: false,
            big_red_button: true,
            difficulty: DifficultyLevel::Standard,
            hud_accuracy: true,
            hud_high_score: true,
            extra_life: true,
            tax_reimbursement: false,
            wave_timer: true,
        }
    }
}

impl DirectiveSet {
    /// Applies a single directive change to the set.
    pub fn apply(&mut self, directive: Directive) {
        match directive {
            Directive::GodMode(value) => self.god_mode = value,
            Directive::BigRedButton(value) => self.big_red_button = value,
            Directive::Difficulty(level) => self.difficulty = level,
            Directive::HudAccuracy(value) => self.hud_accuracy = value,
            Directive::HudHighScore(value) => self.hud_high_score = value,
            Directive::ExtraLife(value) => self.extra_life = value,
            Directive::TaxReimbursement(value) => self.tax_reimbursement = value,
            Directive::WaveTimer(value) => self.wave_timer = value,
        }
    }
}

/// A single executive-order change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Directive {
    /// Toggle invulnerability.
    GodMode(bool),
    /// Toggle big-red-button availability.
    BigRedButton(bool),
    /// Select the formation cadence difficulty.
    Difficulty(DifficultyLevel),
    /// Toggle the HUD accuracy read-out.
    HudAccuracy(bool),
    /// Toggle the HUD high score read-out.
    HudHighScore(bool),
    /// Toggle extra-life awards.
    ExtraLife(bool),
    /// Toggle the tax reimbursement flag.
    TaxReimbursement(bool),
    /// Toggle the per-wave timer.
    WaveTimer(bool),
}

/// Coarse lifecycle phase of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SessionPhase {
    /// Configured but no wave is active.
    #[default]
    Dormant,
    /// A wave is being fought.
    Combat,
    /// The wave was cleared; a level-complete transition is pending.
    Cleared,
    /// Lives ran out or the formation landed; a game-over transition is pending.
    Defeated,
}

/// Animation phase of a single invader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvaderPhase {
    /// Moving with the formation.
    Marching,
    /// Playing the three-frame death animation.
    Exploding {
        /// Zero-based animation frame currently shown.
        frame: u8,
    },
}

/// Lifecycle phase of the player ship.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayerPhase {
    /// Accepting input and vulnerable to hits.
    Active,
    /// Playing the death animation.
    Exploding {
        /// Zero-based animation frame currently shown.
        frame: u8,
    },
    /// Destroyed and waiting for a respawn or the end of the session.
    Down,
    /// Flying off the field after the wave cleared.
    Exiting,
}

/// Horizontal travel direction of the formation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HorizontalHeading {
    /// Toward decreasing x.
    Left,
    /// Toward increasing x.
    Right,
}

impl HorizontalHeading {
    /// Scalar sign of the heading.
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    /// The opposite heading.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// One lockstep movement of the whole formation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormationMovement {
    /// One horizontal step in the current heading.
    Across,
    /// One vertical drop combined with a heading flip.
    Descend,
}

/// Scene transition owed to the host after a terminal condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Transition {
    /// The wave was cleared.
    LevelComplete,
    /// The session ended in defeat.
    GameOver,
}

/// Static 0/1 template describing which formation slots hold an invader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormationTemplate {
    columns: u32,
    rows: u32,
    cells: Vec<bool>,
}

impl FormationTemplate {
    /// Parses a template from text rows where `'1'` marks an invader slot.
    ///
    /// Rows shorter than the widest row are padded with empty slots.
    #[must_use]
    pub fn from_rows(rows: &[&str]) -> Self {
        let columns = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0) as u32;
        let mut cells = Vec::with_capacity(rows.len() * columns as usize);
        for row in rows {
            let mut width = 0;
            for cell in row.chars() {
                cells.push(cell == '1');
                width += 1;
            }
            while width < columns {
                cells.push(false);
                width += 1;
            }
        }
        Self {
            columns,
            rows: rows.len() as u32,
            cells,
        }
    }

    /// The classic five-by-eleven full formation.
    #[must_use]
    pub fn classic() -> Self {
        Self::from_rows(&[
            "11111111111",
            "11111111111",
            "11111111111",
            "11111111111",
            "11111111111",
        ])
    }

    /// Number of template columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of template rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the slot at the provided coordinates holds an invader.
    #[must_use]
    pub fn occupied(&self, row: u32, column: u32) -> bool {
        if row >= self.rows || column >= self.columns {
            return false;
        }
        self.cells[(row * self.columns + column) as usize]
    }

    /// Total number of occupied slots.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.cells.iter().filter(|cell| **cell).count() as u32
    }
}

/// Static 0/1 template describing interior wall cells of the battlefield.
///
/// The template covers only the playable interior; the world adds the
/// always-blocked padding border when it builds the collision grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerrainTemplate {
    columns: u32,
    rows: u32,
    cells: Vec<bool>,
}

impl TerrainTemplate {
    /// Parses a template from text rows where `'1'` marks a wall cell.
    #[must_use]
    pub fn from_rows(rows: &[&str]) -> Self {
        let columns = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0) as u32;
        let mut cells = Vec::with_capacity(rows.len() * columns as usize);
        for row in rows {
            let mut width = 0;
            for cell in row.chars() {
                cells.push(cell == '1');
                width += 1;
            }
            while width < columns {
                cells.push(false);
                width += 1;
            }
        }
        Self {
            columns,
            rows: rows.len() as u32,
            cells,
        }
    }

    /// A fully open interior with the provided dimensions.
    #[must_use]
    pub fn open(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            cells: vec![false; (columns as usize) * (rows as usize)],
        }
    }

    /// Number of interior columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of interior rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the interior cell at the provided coordinates is a wall.
    #[must_use]
    pub fn blocked(&self, column: u32, row: u32) -> bool {
        if column >= self.columns || row >= self.rows {
            return false;
        }
        self.cells[(row * self.columns + column) as usize]
    }
}

/// Tuning for the player ship's movement model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerTuning {
    /// Base travel speed in pixels per second.
    pub speed: f32,
    /// Speed multiplier while the run modifier is held.
    pub run_multiplier: f32,
    /// Exponential easing rate applied to velocity changes, per second.
    pub easing: f32,
    /// Collision radius used against enemy bullets and invaders.
    pub collision_radius: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            speed: 220.0,
            run_multiplier: 1.6,
            easing: 10.0,
            collision_radius: 14.0,
        }
    }
}

/// Tuning for the invader formation's cadence and geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FormationTuning {
    /// Horizontal pixels covered by one `Across` step.
    pub horizontal_step: f32,
    /// Vertical pixels covered by one `Descend` step.
    pub vertical_step: f32,
    /// Movement delay with the formation at full strength.
    pub move_delay_max: Duration,
    /// Floor below which the movement delay never shrinks.
    pub move_delay_min: Duration,
    /// Shooting delay with the formation at full strength.
    pub shoot_delay_max: Duration,
    /// Floor below which the shooting delay never shrinks.
    pub shoot_delay_min: Duration,
    /// Horizontal spacing between formation columns.
    pub column_spacing: f32,
    /// Vertical spacing between formation rows.
    pub row_spacing: f32,
    /// Distance from the top edge to the first formation row.
    pub top_margin: f32,
    /// Distance kept between the formation and the side edges.
    pub side_margin: f32,
    /// Collision radius of a single invader.
    pub invader_radius: f32,
    /// Base speed of invader bullets in pixels per second.
    pub bullet_speed: f32,
    /// Upper multiplier applied to bullet speed as the formation thins out.
    pub bullet_speed_scale: f32,
    /// Collision radius of invader bullets.
    pub bullet_radius: f32,
    /// Global on-screen cap for invader bullets.
    pub bullet_cap: usize,
    /// Duration of each of the three death-animation frames.
    pub explosion_frame: Duration,
    /// Delay between successive rings of an area kill.
    pub ring_delay: Duration,
    /// Maximum Chebyshev radius an area kill can spread to.
    pub max_spread_radius: u32,
}

impl Default for FormationTuning {
    fn default() -> Self {
        Self {
            horizontal_step: 8.0,
            vertical_step: 24.0,
            move_delay_max: Duration::from_millis(800),
            move_delay_min: Duration::from_millis(80),
            shoot_delay_max: Duration::from_millis(1200),
            shoot_delay_min: Duration::from_millis(300),
            column_spacing: 48.0,
            row_spacing: 40.0,
            top_margin: 64.0,
            side_margin: 32.0,
            invader_radius: 16.0,
            bullet_speed: 240.0,
            bullet_speed_scale: 1.75,
            bullet_radius: 4.0,
            bullet_cap: 3,
            explosion_frame: Duration::from_millis(120),
            ring_delay: Duration::from_millis(90),
            max_spread_radius: 3,
        }
    }
}

impl FormationTuning {
    /// Movement delay for the current formation strength.
    ///
    /// Shrinks linearly with the remaining share of invaders and never drops
    /// below the configured floor.
    #[must_use]
    pub fn move_delay(&self, remaining: u32, initial: u32, difficulty: DifficultyLevel) -> Duration {
        let ratio = ratio_of(remaining, initial);
        self.move_delay_max
            .mul_f64(f64::from(ratio * difficulty.cadence_factor()))
            .max(self.move_delay_min)
    }

    /// Shooting delay for the current formation strength.
    #[must_use]
    pub fn shoot_delay(
        &self,
        remaining: u32,
        initial: u32,
        difficulty: DifficultyLevel,
    ) -> Duration {
        let ratio = ratio_of(remaining, initial);
        self.shoot_delay_max
            .mul_f64(f64::from(ratio * difficulty.cadence_factor()))
            .max(self.shoot_delay_min)
    }

    /// Invader bullet speed for the current formation strength.
    ///
    /// Bullets speed up as the formation thins out, up to the configured
    /// scale multiplier.
    #[must_use]
    pub fn invader_bullet_speed(&self, remaining: u32, initial: u32) -> f32 {
        let ratio = ratio_of(remaining, initial);
        self.bullet_speed * (1.0 + (1.0 - ratio) * (self.bullet_speed_scale - 1.0))
    }
}

fn ratio_of(remaining: u32, initial: u32) -> f32 {
    if initial == 0 {
        return 1.0;
    }
    (remaining.min(initial) as f32) / (initial as f32)
}

/// Tuning for the scoring state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoringTuning {
    /// Points per kill by formation row, top row first. Rows beyond the
    /// table reuse its last entry.
    pub row_values: Vec<u32>,
    /// Score multiples at which an extra life is awarded.
    pub extra_life_threshold: u32,
    /// Lives granted by `BeginGame`.
    pub starting_lives: u32,
    /// Score cost of pressing the big red button.
    pub big_red_button_cost: u32,
}

impl Default for ScoringTuning {
    fn default() -> Self {
        Self {
            row_values: vec![30, 20, 20, 10, 10],
            extra_life_threshold: 1500,
            starting_lives: 3,
            big_red_button_cost: 150,
        }
    }
}

impl ScoringTuning {
    /// Points awarded for destroying an invader on the given formation row.
    #[must_use]
    pub fn row_value(&self, row: u32) -> u32 {
        let index = (row as usize).min(self.row_values.len().saturating_sub(1));
        self.row_values.get(index).copied().unwrap_or(0)
    }
}

/// Tuning for delayed scene transitions and transient effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionTuning {
    /// Delay between clearing a wave and the level-complete signal.
    pub level_complete_delay: Duration,
    /// Delay between defeat and the game-over signal.
    pub game_over_delay: Duration,
    /// Delay before the player respawns after losing a life.
    pub respawn_delay: Duration,
    /// How long the transient extra-life flag stays raised.
    pub extra_life_flag: Duration,
}

impl Default for TransitionTuning {
    fn default() -> Self {
        Self {
            level_complete_delay: Duration::from_millis(1200),
            game_over_delay: Duration::from_millis(1500),
            respawn_delay: Duration::from_millis(900),
            extra_life_flag: Duration::from_millis(2000),
        }
    }
}

/// Aggregated tuning threaded from session start to every consumer.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct BattlefieldTuning {
    /// Player movement model tuning.
    pub player: PlayerTuning,
    /// Formation cadence and geometry tuning.
    pub formation: FormationTuning,
    /// Scoring state-machine tuning.
    pub scoring: ScoringTuning,
    /// Transition and transient-effect tuning.
    pub transition: TransitionTuning,
}

impl BattlefieldTuning {
    /// Derives a tuning profile scaled to the provided viewport.
    ///
    /// Narrow viewports compress formation spacing and step sizes so the
    /// formation fits; the profile is computed once at session start.
    #[must_use]
    pub fn for_viewport(bounds: PlayfieldBounds) -> Self {
        let scale = (bounds.width() / 800.0).clamp(0.55, 1.0);
        let mut tuning = Self::default();
        tuning.formation.horizontal_step *= scale;
        tuning.formation.vertical_step *= scale;
        tuning.formation.column_spacing *= scale;
        tuning.formation.row_spacing *= scale;
        tuning.formation.side_margin *= scale;
        tuning.formation.invader_radius *= scale;
        tuning.player.speed *= scale;
        tuning
    }
}

/// Complete configuration of a battlefield session.
#[derive(Clone, Debug, PartialEq)]
pub struct BattlefieldConfig {
    /// Playable bounds in world pixels.
    pub bounds: PlayfieldBounds,
    /// Interior wall template.
    pub terrain: TerrainTemplate,
    /// Side length of one collision-grid cell in pixels.
    pub terrain_cell_length: f32,
    /// Aggregated tuning.
    pub tuning: BattlefieldTuning,
}

impl BattlefieldConfig {
    /// A configuration with open terrain and viewport-derived tuning.
    #[must_use]
    pub fn open(bounds: PlayfieldBounds, terrain_cell_length: f32) -> Self {
        let columns = (bounds.width() / terrain_cell_length).ceil() as u32;
        let rows = (bounds.height() / terrain_cell_length).ceil() as u32;
        Self {
            bounds,
            terrain: TerrainTemplate::open(columns, rows),
            terrain_cell_length,
            tuning: BattlefieldTuning::for_viewport(bounds),
        }
    }
}

/// Durable fields restored at session start and written on discrete changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersistedRecord {
    /// Highest score ever reached.
    pub high_score: u32,
    /// The player's persisted gun choice.
    pub selected_gun: GunKind,
    /// The persisted executive-order toggles.
    pub directives: DirectiveSet,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Rebuilds the battlefield and resets the session to dormant.
    ConfigureBattlefield {
        /// Complete configuration for the new battlefield.
        config: BattlefieldConfig,
    },
    /// Seeds durable fields loaded from storage.
    RestorePersisted {
        /// Record loaded from the durable store.
        record: PersistedRecord,
    },
    /// Starts a fresh session: score, lives, and wave counters reset.
    BeginGame {
        /// Formation template for the first wave.
        formation: FormationTemplate,
    },
    /// Advances to the next wave, preserving score and lives.
    BeginWave {
        /// Formation template for the new wave.
        formation: FormationTemplate,
    },
    /// Replays the current wave, reverting score to the wave-start snapshot.
    ReplayWave {
        /// Formation template for the replayed wave.
        formation: FormationTemplate,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time elapsed since the previous tick.
        dt: Duration,
    },
    /// Updates the player ship's movement intent.
    SteerPlayer {
        /// Movement intent derived from held inputs.
        steering: Steering,
    },
    /// Requests a player shot, subject to cadence and cap gating.
    TriggerGun {
        /// Whether the fire control was pressed on this frame.
        pressed: bool,
        /// Whether the fire control is currently held.
        held: bool,
    },
    /// Selects the player's persisted gun.
    SelectGun {
        /// Gun to persist as the player's choice.
        gun: GunKind,
    },
    /// Grants a temporary gun override that shadows the persisted choice.
    GrantPowerup {
        /// Gun granted for the duration of the override.
        gun: GunKind,
        /// Expiry mode of the override.
        grant: PowerupGrant,
    },
    /// Moves the whole live formation one lockstep.
    ShiftFormation {
        /// Movement to apply to every live, non-exploding invader.
        movement: FormationMovement,
    },
    /// Fires one invader bullet from the given shooter.
    SpawnInvaderBullet {
        /// Invader chosen as the shooter.
        shooter: InvaderId,
    },
    /// Clears the whole formation with an expanding ring from its center.
    PressBigRedButton,
    /// Sets one executive-order toggle.
    IssueDirective {
        /// Directive change to apply.
        directive: Directive,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// The simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// The battlefield was rebuilt from a new configuration.
    BattlefieldConfigured,
    /// A fresh session began.
    GameStarted {
        /// Lives granted to the new session.
        lives: u32,
    },
    /// A wave began and its formation spawned.
    WaveStarted {
        /// One-based wave number.
        wave: u32,
        /// Number of invaders spawned for the wave.
        invaders: u32,
    },
    /// The current wave was restarted from its wave-start snapshot.
    WaveReplayed {
        /// One-based wave number being replayed.
        wave: u32,
    },
    /// Every invader of the wave was destroyed.
    WaveCleared {
        /// One-based wave number that was cleared.
        wave: u32,
    },
    /// The player fired a shot.
    GunFired {
        /// Gun that fired.
        gun: GunKind,
        /// Muzzle position of the shot.
        position: WorldPoint,
    },
    /// An invader fired a shot.
    InvaderBulletFired {
        /// Invader that fired.
        shooter: InvaderId,
        /// Muzzle position of the shot.
        position: WorldPoint,
    },
    /// A bullet was destroyed by a wall cell.
    BulletBlocked {
        /// Impact position of the destroyed bullet.
        position: WorldPoint,
    },
    /// An invader began its death animation.
    InvaderHit {
        /// Invader that was hit.
        invader: InvaderId,
    },
    /// An invader finished its death animation and left the live set.
    InvaderDestroyed {
        /// Invader that was removed.
        invader: InvaderId,
        /// Formation row the invader occupied.
        row: u32,
        /// Invaders remaining after the removal.
        remaining: u32,
    },
    /// The player was hit and lost a life.
    PlayerStruck {
        /// Lives remaining after the hit.
        lives_remaining: u32,
    },
    /// The player respawned after losing a life.
    PlayerRespawned,
    /// The formation completed one lockstep movement.
    FormationShifted {
        /// Movement that was applied.
        movement: FormationMovement,
    },
    /// The formation descended past the bottom boundary.
    FormationLanded,
    /// The score changed.
    ScoreChanged {
        /// Score after the change.
        score: u32,
        /// High score after the change.
        high_score: u32,
        /// Signed points applied by the change.
        delta: i64,
    },
    /// Crossing a score threshold granted extra lives.
    ExtraLifeAwarded {
        /// Lives after the award.
        lives: u32,
    },
    /// The transient extra-life flag lapsed.
    ExtraLifeFlagCleared,
    /// The persisted gun selection changed.
    GunSelected {
        /// Gun now persisted as the player's choice.
        gun: GunKind,
    },
    /// A temporary gun override became active.
    PowerupApplied {
        /// Gun granted by the override.
        gun: GunKind,
    },
    /// A temporary gun override lapsed.
    PowerupExpired {
        /// Gun the selection reverted to.
        reverted_to: GunKind,
    },
    /// An executive-order toggle changed.
    DirectiveChanged {
        /// Directive that was applied.
        directive: Directive,
    },
    /// The big red button detonated the formation.
    BigRedButtonPressed,
    /// A delayed scene transition became due.
    TransitionDue {
        /// Transition the host should perform.
        transition: Transition,
    },
    /// The session ended in defeat.
    GameEnded {
        /// Final score of the session.
        score: u32,
    },
}

/// Immutable representation of a single invader used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InvaderSnapshot {
    /// Unique identifier assigned to the invader.
    pub id: InvaderId,
    /// Current pixel position.
    pub position: WorldPoint,
    /// Fixed formation coordinates assigned at spawn.
    pub formation: FormationCoord,
    /// Animation phase.
    pub phase: InvaderPhase,
    /// Sprite row assigned at spawn for the renderer.
    pub sprite_variant: u8,
}

/// Read-only snapshot describing all live invaders.
#[derive(Clone, Debug, Default)]
pub struct InvaderView {
    snapshots: Vec<InvaderSnapshot>,
    march_frame: u8,
}

impl InvaderView {
    /// Creates a new view from the provided snapshots and march frame.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<InvaderSnapshot>, march_frame: u8) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self {
            snapshots,
            march_frame,
        }
    }

    /// Iterator over the captured snapshots in deterministic id order.
    pub fn iter(&self) -> impl Iterator<Item = &InvaderSnapshot> {
        self.snapshots.iter()
    }

    /// Number of invaders captured in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no invaders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Two-state march animation frame shared by the whole formation.
    #[must_use]
    pub const fn march_frame(&self) -> u8 {
        self.march_frame
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<InvaderSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single bullet used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BulletSnapshot {
    /// Unique identifier assigned to the bullet.
    pub id: BulletId,
    /// Current pixel position.
    pub position: WorldPoint,
    /// Travel direction.
    pub direction: Direction,
    /// Side that fired the bullet.
    pub owner: BulletOwner,
}

/// Read-only snapshot describing all live bullets.
#[derive(Clone, Debug, Default)]
pub struct BulletView {
    snapshots: Vec<BulletSnapshot>,
}

impl BulletView {
    /// Creates a new view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<BulletSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic id order.
    pub fn iter(&self) -> impl Iterator<Item = &BulletSnapshot> {
        self.snapshots.iter()
    }

    /// Number of bullets captured in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no bullets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<BulletSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of the player ship used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Current pixel position.
    pub position: WorldPoint,
    /// Current eased velocity.
    pub velocity: WorldVector,
    /// Lifecycle phase.
    pub phase: PlayerPhase,
}

/// Immutable snapshot of the scoring state machine.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreboardSnapshot {
    /// Current score.
    pub score: u32,
    /// Score snapshot taken at wave start.
    pub wave_start_score: u32,
    /// Highest score ever reached.
    pub high_score: u32,
    /// Remaining lives.
    pub lives: u32,
    /// One-based wave number.
    pub wave: u32,
    /// Invaders still alive in the current wave.
    pub invaders_remaining: u32,
    /// Invaders the current wave started with.
    pub invaders_total: u32,
    /// Player shots accepted this session.
    pub shots_fired: u32,
    /// Invaders destroyed this session.
    pub hits: u32,
    /// Time elapsed in the current wave.
    pub wave_elapsed: Duration,
    /// Whether the transient extra-life flag is raised.
    pub extra_life_flag: bool,
    /// Executive-order toggles.
    pub directives: DirectiveSet,
    /// Persisted gun choice.
    pub selected_gun: GunKind,
    /// Gun currently in effect, accounting for powerup overrides.
    pub effective_gun: GunKind,
}

impl ScoreboardSnapshot {
    /// Hit ratio of the session, in the range `0.0..=1.0` for ordinary guns.
    ///
    /// Area kills count every destroyed invader, so blast weapons can push
    /// the ratio above `1.0`.
    #[must_use]
    pub fn accuracy(&self) -> f32 {
        if self.shots_fired == 0 {
            return 0.0;
        }
        self.hits as f32 / self.shots_fired as f32
    }
}
