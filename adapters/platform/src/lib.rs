#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Platform boundary contracts for Grid Assault hosts.
//!
//! Everything the simulation needs from the outside world lives here: the
//! durable key-value store, the fire-and-forget audio sink, and the scene
//! director that receives terminal transitions. Reference implementations
//! cover files ([`TomlStore`]), memory ([`MemoryStore`]), and silence
//! ([`NullAudio`]).

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use grid_assault_core::{DifficultyLevel, DirectiveSet, GunKind, PersistedRecord};
use thiserror::Error;

/// Errors surfaced by durable storage implementations.
///
/// Callers log these and continue with in-memory defaults; nothing in the
/// simulation loop ever propagates one.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying file could not be read or written.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The stored payload could not be parsed or encoded.
    #[error("storage format invalid: {0}")]
    Format(String),
    /// The store refused the operation outright.
    #[error("storage unavailable")]
    Unavailable,
}

/// String-keyed durable store used for high scores, directives, and the
/// selected gun. Implementations must tolerate missing keys.
pub trait KeyValueStore {
    /// Reads the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory store for tests and headless runs.
///
/// The store can be poisoned to exercise degraded-storage paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    poisoned: bool,
}

impl MemoryStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with [`StorageError::Unavailable`].
    pub fn poison(&mut self) {
        self.poisoned = true;
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.poisoned {
            return Err(StorageError::Unavailable);
        }
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.poisoned {
            return Err(StorageError::Unavailable);
        }
        let _ = self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// File-backed store holding a flat TOML table of strings.
///
/// A missing file is an empty store; every write rewrites the whole table.
#[derive(Debug)]
pub struct TomlStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl TomlStore {
    /// Opens the store at `path`, loading any existing table.
    pub fn open(path: PathBuf) -> Result<Self, StorageError> {
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => {
                toml::from_str(&raw).map_err(|error| StorageError::Format(error.to_string()))?
            }
            Err(error) if error.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(error) => return Err(StorageError::Io(error)),
        };
        Ok(Self { path, entries })
    }
}

impl KeyValueStore for TomlStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let _ = self.entries.insert(key.to_owned(), value.to_owned());
        let raw = toml::to_string(&self.entries)
            .map_err(|error| StorageError::Format(error.to_string()))?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

const KEY_HIGH_SCORE: &str = "high_score";
const KEY_SELECTED_GUN: &str = "selected_gun";
const KEY_GOD_MODE: &str = "god_mode";
const KEY_BIG_RED_BUTTON: &str = "big_red_button";
const KEY_DIFFICULTY: &str = "difficulty";
const KEY_HUD_ACCURACY: &str = "hud_accuracy";
const KEY_HUD_HIGH_SCORE: &str = "hud_high_score";
const KEY_EXTRA_LIFE: &str = "extra_life";
const KEY_TAX_REIMBURSEMENT: &str = "tax_reimbursement";
const KEY_WAVE_TIMER: &str = "wave_timer";

/// Loads the persisted record, defaulting any missing or unparsable field.
///
/// Storage errors propagate so the caller can log them once; individual
/// field problems only cost that field its stored value.
pub fn load_record(store: &dyn KeyValueStore) -> Result<PersistedRecord, StorageError> {
    let defaults = DirectiveSet::default();
    let record = PersistedRecord {
        high_score: read_parsed(store, KEY_HIGH_SCORE, 0)?,
        selected_gun: store
            .get(KEY_SELECTED_GUN)?
            .map_or_else(GunKind::default, |raw| gun_from_key(&raw)),
        directives: DirectiveSet {
            god_mode: read_parsed(store, KEY_GOD_MODE, defaults.god_mode)?,
            big_red_button: read_parsed(store, KEY_BIG_RED_BUTTON, defaults.big_red_button)?,
            difficulty: store
                .get(KEY_DIFFICULTY)?
                .map_or(defaults.difficulty, |raw| difficulty_from_key(&raw)),
            hud_accuracy: read_parsed(store, KEY_HUD_ACCURACY, defaults.hud_accuracy)?,
            hud_high_score: read_parsed(store, KEY_HUD_HIGH_SCORE, defaults.hud_high_score)?,
            extra_life: read_parsed(store, KEY_EXTRA_LIFE, defaults.extra_life)?,
            tax_reimbursement: read_parsed(
                store,
                KEY_TAX_REIMBURSEMENT,
                defaults.tax_reimbursement,
            )?,
            wave_timer: read_parsed(store, KEY_WAVE_TIMER, defaults.wave_timer)?,
        },
    };
    Ok(record)
}

fn read_parsed<T>(store: &dyn KeyValueStore, key: &str, fallback: T) -> Result<T, StorageError>
where
    T: std::str::FromStr + Copy,
{
    let Some(raw) = store.get(key)? else {
        return Ok(fallback);
    };
    match raw.parse() {
        Ok(value) => Ok(value),
        Err(_) => {
            tracing::warn!(key, raw = %raw, "discarding unparsable stored value");
            Ok(fallback)
        }
    }
}

/// Writes the high score under its durable key.
pub fn store_high_score(store: &mut dyn KeyValueStore, high_score: u32) -> Result<(), StorageError> {
    store.set(KEY_HIGH_SCORE, &high_score.to_string())
}

/// Writes the selected gun under its durable key.
pub fn store_selected_gun(store: &mut dyn KeyValueStore, gun: GunKind) -> Result<(), StorageError> {
    store.set(KEY_SELECTED_GUN, gun_to_key(gun))
}

/// Writes every directive under its own durable key.
pub fn store_directives(
    store: &mut dyn KeyValueStore,
    directives: &DirectiveSet,
) -> Result<(), StorageError> {
    store.set(KEY_GOD_MODE, &directives.god_mode.to_string())?;
    store.set(KEY_BIG_RED_BUTTON, &directives.big_red_button.to_string())?;
    store.set(KEY_DIFFICULTY, difficulty_to_key(directives.difficulty))?;
    store.set(KEY_HUD_ACCURACY, &directives.hud_accuracy.to_string())?;
    store.set(
        KEY_HUD_HIGH_SCORE,
        &directives.hud_high_score.to_string(),
    )?;
    store.set(KEY_EXTRA_LIFE, &directives.extra_life.to_string())?;
    store.set(
        KEY_TAX_REIMBURSEMENT,
        &directives.tax_reimbursement.to_string(),
    )?;
    store.set(KEY_WAVE_TIMER, &directives.wave_timer.to_string())?;
    Ok(())
}

fn gun_to_key(gun: GunKind) -> &'static str {
    match gun {
        GunKind::Standard => "standard",
        GunKind::Rapid => "rapid",
        GunKind::Plasma => "plasma",
    }
}

/// Unknown names fall back to the default gun rather than failing the load.
fn gun_from_key(raw: &str) -> GunKind {
    match raw {
        "standard" => GunKind::Standard,
        "rapid" => GunKind::Rapid,
        "plasma" => GunKind::Plasma,
        other => {
            tracing::warn!(gun = other, "unknown stored gun, using the default");
            GunKind::default()
        }
    }
}

fn difficulty_to_key(level: DifficultyLevel) -> &'static str {
    match level {
        DifficultyLevel::Lenient => "lenient",
        DifficultyLevel::Standard => "standard",
        DifficultyLevel::Brutal => "brutal",
    }
}

fn difficulty_from_key(raw: &str) -> DifficultyLevel {
    match raw {
        "lenient" => DifficultyLevel::Lenient,
        "standard" => DifficultyLevel::Standard,
        "brutal" => DifficultyLevel::Brutal,
        other => {
            tracing::warn!(difficulty = other, "unknown stored difficulty, using the default");
            DifficultyLevel::default()
        }
    }
}

/// Discrete sound effects the simulation can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AudioCue {
    /// The player fired a shot.
    PlayerShot,
    /// An invader fired a shot.
    InvaderShot,
    /// An invader began exploding.
    InvaderExplosion,
    /// The player ship began exploding.
    PlayerExplosion,
    /// An extra life was awarded.
    ExtraLife,
    /// The wave was cleared.
    WaveClear,
    /// The session ended in defeat.
    GameOver,
    /// The big red button detonated the formation.
    Detonation,
}

/// Fire-and-forget audio trigger; failures are ignored by contract.
pub trait AudioSink {
    /// Plays the given cue. No return value is consumed.
    fn play(&mut self, cue: AudioCue);
}

/// Audio sink that discards every cue.
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: AudioCue) {}
}

/// Audio sink that records cues for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingAudio {
    cues: Vec<AudioCue>,
}

impl RecordingAudio {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cues played so far, in order.
    #[must_use]
    pub fn cues(&self) -> &[AudioCue] {
        &self.cues
    }
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, cue: AudioCue) {
        self.cues.push(cue);
    }
}

/// Scene collaborator notified of terminal transitions, exactly once each.
pub trait SceneDirector {
    /// The wave was cleared and its final animation has played.
    fn level_complete(&mut self);

    /// The session is over and its final animation has played.
    fn game_over(&mut self);
}

/// Scene director that ignores every transition.
#[derive(Debug, Default)]
pub struct NullDirector;

impl SceneDirector for NullDirector {
    fn level_complete(&mut self) {}

    fn game_over(&mut self) {}
}

/// Scene director that counts invocations for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingDirector {
    level_completions: u32,
    game_overs: u32,
}

impl RecordingDirector {
    /// Creates a director with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of level-complete notifications received.
    #[must_use]
    pub fn level_completions(&self) -> u32 {
        self.level_completions
    }

    /// Number of game-over notifications received.
    #[must_use]
    pub fn game_overs(&self) -> u32 {
        self.game_overs
    }
}

impl SceneDirector for RecordingDirector {
    fn level_complete(&mut self) {
        self.level_completions += 1;
    }

    fn game_over(&mut self) {
        self.game_overs += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips_a_record() {
        let mut store = MemoryStore::new();
        let mut directives = DirectiveSet::default();
        directives.god_mode = true;
        directives.difficulty = DifficultyLevel::Brutal;

        store_high_score(&mut store, 9_990).expect("write");
        store_selected_gun(&mut store, GunKind::Plasma).expect("write");
        store_directives(&mut store, &directives).expect("write");

        let record = load_record(&store).expect("load");
        assert_eq!(record.high_score, 9_990);
        assert_eq!(record.selected_gun, GunKind::Plasma);
        assert_eq!(record.directives, directives);
    }

    #[test]
    fn missing_keys_default_cleanly() {
        let store = MemoryStore::new();
        let record = load_record(&store).expect("load");
        assert_eq!(record, PersistedRecord::default());
    }

    #[test]
    fn unknown_gun_name_falls_back_to_standard() {
        let mut store = MemoryStore::new();
        store.set("selected_gun", "orbital_laser").expect("write");
        let record = load_record(&store).expect("load");
        assert_eq!(record.selected_gun, GunKind::Standard);
    }

    #[test]
    fn unparsable_numbers_fall_back_without_failing() {
        let mut store = MemoryStore::new();
        store.set("high_score", "not-a-number").expect("write");
        let record = load_record(&store).expect("load");
        assert_eq!(record.high_score, 0);
    }

    #[test]
    fn poisoned_store_surfaces_unavailable() {
        let mut store = MemoryStore::new();
        store.poison();
        assert!(matches!(
            load_record(&store),
            Err(StorageError::Unavailable)
        ));
        assert!(matches!(
            store_high_score(&mut store, 1),
            Err(StorageError::Unavailable)
        ));
    }

    #[test]
    fn toml_store_persists_across_reopens() {
        let path = std::env::temp_dir().join(format!(
            "grid-assault-store-{}.toml",
            std::process::id(),
        ));
        let _ = fs::remove_file(&path);

        {
            let mut store = TomlStore::open(path.clone()).expect("open");
            store_high_score(&mut store, 777).expect("write");
            store_selected_gun(&mut store, GunKind::Rapid).expect("write");
        }

        let store = TomlStore::open(path.clone()).expect("reopen");
        let record = load_record(&store).expect("load");
        assert_eq!(record.high_score, 777);
        assert_eq!(record.selected_gun, GunKind::Rapid);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn recording_hooks_count_invocations() {
        let mut audio = RecordingAudio::new();
        audio.play(AudioCue::PlayerShot);
        audio.play(AudioCue::WaveClear);
        assert_eq!(
            audio.cues(),
            &[AudioCue::PlayerShot, AudioCue::WaveClear],
        );

        let mut director = RecordingDirector::new();
        director.level_complete();
        director.game_over();
        director.game_over();
        assert_eq!(director.level_completions(), 1);
        assert_eq!(director.game_overs(), 2);
    }
}
