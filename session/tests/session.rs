use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use grid_assault_core::{
    BattlefieldConfig, Directive, Event, GunKind, InputFrame, PlayfieldBounds, SessionPhase,
};
use grid_assault_core::FormationTemplate;
use grid_assault_platform::{
    AudioCue, AudioSink, KeyValueStore, MemoryStore, SceneDirector, StorageError,
};
use grid_assault_session::{GameSession, SessionHooks};
use grid_assault_world::query;

const FRAME: Duration = Duration::from_millis(16);

#[derive(Clone, Default)]
struct SharedStore(Rc<RefCell<MemoryStore>>);

impl KeyValueStore for SharedStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.0.borrow().get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.0.borrow_mut().set(key, value)
    }
}

#[derive(Clone, Default)]
struct SharedAudio(Rc<RefCell<Vec<AudioCue>>>);

impl AudioSink for SharedAudio {
    fn play(&mut self, cue: AudioCue) {
        self.0.borrow_mut().push(cue);
    }
}

#[derive(Clone, Default)]
struct SharedDirector {
    level_completions: Rc<RefCell<u32>>,
    game_overs: Rc<RefCell<u32>>,
}

impl SceneDirector for SharedDirector {
    fn level_complete(&mut self) {
        *self.level_completions.borrow_mut() += 1;
    }

    fn game_over(&mut self) {
        *self.game_overs.borrow_mut() += 1;
    }
}

fn config() -> BattlefieldConfig {
    BattlefieldConfig::open(PlayfieldBounds::new(800.0, 600.0), 16.0)
}

struct Harness {
    session: GameSession,
    store: SharedStore,
    audio: SharedAudio,
    director: SharedDirector,
}

fn harness() -> Harness {
    let store = SharedStore::default();
    let audio = SharedAudio::default();
    let director = SharedDirector::default();
    let session = GameSession::new(
        config(),
        0x5eed,
        SessionHooks {
            audio: Box::new(audio.clone()),
            director: Box::new(director.clone()),
            store: Box::new(store.clone()),
        },
    );
    Harness {
        session,
        store,
        audio,
        director,
    }
}

fn idle() -> InputFrame {
    InputFrame::default()
}

#[test]
fn a_session_fights_a_wave_end_to_end() {
    let mut harness = harness();
    let _ = harness.session.begin_game(FormationTemplate::classic());
    assert_eq!(
        query::phase(harness.session.world()),
        SessionPhase::Combat
    );

    // Hold fire for a few seconds of frames; the player autocannon plus the
    // formation director should produce shots on both sides.
    let mut fired = false;
    let mut invader_fired = false;
    for frame in 0..600 {
        let input = InputFrame {
            fire_pressed: frame % 24 == 0,
            fire_held: true,
            ..InputFrame::default()
        };
        let report = harness.session.advance_frame(input, FRAME);
        fired |= report
            .events
            .iter()
            .any(|event| matches!(event, Event::GunFired { .. }));
        invader_fired |= report
            .events
            .iter()
            .any(|event| matches!(event, Event::InvaderBulletFired { .. }));
    }
    assert!(fired, "the player gun fired");
    assert!(invader_fired, "the formation fired back");

    let snapshot = query::scoreboard(harness.session.world());
    assert!(snapshot.shots_fired > 0);
    assert!(harness
        .audio
        .0
        .borrow()
        .contains(&AudioCue::PlayerShot));
    assert!(harness
        .audio
        .0
        .borrow()
        .contains(&AudioCue::InvaderShot));
}

#[test]
fn formation_movement_is_driven_by_the_director() {
    let mut harness = harness();
    let _ = harness.session.begin_game(FormationTemplate::classic());

    let mut shifted = false;
    for _ in 0..120 {
        let report = harness.session.advance_frame(idle(), FRAME);
        shifted |= report
            .events
            .iter()
            .any(|event| matches!(event, Event::FormationShifted { .. }));
        if shifted {
            break;
        }
    }
    assert!(shifted, "the lockstep cadence moved the formation");
}

#[test]
fn clearing_the_wave_signals_level_complete_exactly_once() {
    let mut harness = harness();
    let _ = harness.session.begin_game(FormationTemplate::classic());

    // The big red button clears the field; transitions fire on a delay.
    let detonate = InputFrame {
        detonate_pressed: true,
        ..InputFrame::default()
    };
    let _ = harness.session.advance_frame(detonate, FRAME);

    for _ in 0..400 {
        let _ = harness.session.advance_frame(idle(), FRAME);
    }

    assert_eq!(*harness.director.level_completions.borrow(), 1);
    assert_eq!(*harness.director.game_overs.borrow(), 0);
    assert!(harness.audio.0.borrow().contains(&AudioCue::Detonation));
    assert!(harness.audio.0.borrow().contains(&AudioCue::WaveClear));

    // Another wave resets the latch and fights on.
    let _ = harness.session.begin_wave(FormationTemplate::classic());
    assert_eq!(
        query::scoreboard(harness.session.world()).wave,
        2,
    );
}

#[test]
fn selections_and_directives_reach_the_durable_store() {
    let mut harness = harness();
    let _ = harness.session.select_gun(GunKind::Plasma);
    let _ = harness
        .session
        .issue_directive(Directive::GodMode(true));

    let stored_gun = harness.store.get("selected_gun").expect("store readable");
    assert_eq!(stored_gun.as_deref(), Some("plasma"));
    let stored_god_mode = harness.store.get("god_mode").expect("store readable");
    assert_eq!(stored_god_mode.as_deref(), Some("true"));
}

#[test]
fn persisted_state_is_restored_into_a_new_session() {
    let store = SharedStore::default();
    {
        let mut first = GameSession::new(
            config(),
            1,
            SessionHooks {
                audio: Box::new(SharedAudio::default()),
                director: Box::new(SharedDirector::default()),
                store: Box::new(store.clone()),
            },
        );
        let _ = first.select_gun(GunKind::Rapid);
        let _ = first.issue_directive(Directive::GodMode(true));
        let _ = first.end();
    }

    let second = GameSession::new(
        config(),
        2,
        SessionHooks {
            audio: Box::new(SharedAudio::default()),
            director: Box::new(SharedDirector::default()),
            store: Box::new(store.clone()),
        },
    );
    let snapshot = query::scoreboard(second.world());
    assert_eq!(snapshot.selected_gun, GunKind::Rapid);
    assert!(snapshot.directives.god_mode);
}

#[test]
fn a_poisoned_store_degrades_to_defaults_without_failing() {
    let mut store = MemoryStore::new();
    store.poison();
    let mut session = GameSession::new(
        config(),
        3,
        SessionHooks {
            audio: Box::new(SharedAudio::default()),
            director: Box::new(SharedDirector::default()),
            store: Box::new(store),
        },
    );

    let _ = session.begin_game(FormationTemplate::classic());
    let _ = session.select_gun(GunKind::Plasma);
    for _ in 0..30 {
        let _ = session.advance_frame(idle(), FRAME);
    }

    let snapshot = query::scoreboard(session.world());
    assert_eq!(snapshot.selected_gun, GunKind::Plasma);
    assert_eq!(snapshot.high_score, 0);
}

#[test]
fn ending_a_session_reports_the_final_scoreboard() {
    let mut harness = harness();
    let _ = harness.session.begin_game(FormationTemplate::classic());
    for _ in 0..10 {
        let _ = harness.session.advance_frame(idle(), FRAME);
    }
    let snapshot = harness.session.end();
    assert_eq!(snapshot.wave, 1);
    assert_eq!(snapshot.lives, 3);
}
