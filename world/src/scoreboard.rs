//! Scoring state machine: score, lives, waves, stats, and directives.
//!
//! Every transition clamps rather than rejects, and nothing in here performs
//! I/O — persistence happens at the session boundary from the events the
//! world broadcasts.

use std::time::Duration;

use grid_assault_core::{Directive, DirectiveSet, GunKind, PersistedRecord, ScoringTuning};

/// Outcome of destroying one invader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct KillAward {
    pub(crate) points: u32,
    pub(crate) score: u32,
    pub(crate) high_score: u32,
    pub(crate) remaining: u32,
    pub(crate) lives_awarded: u32,
    pub(crate) lives: u32,
}

/// Outcome of a clamped score penalty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Penalty {
    pub(crate) applied: u32,
    pub(crate) score: u32,
    pub(crate) high_score: u32,
}

/// Authoritative score/lives/wave store mutated only through named methods.
#[derive(Debug)]
pub(crate) struct Scoreboard {
    score: u32,
    wave_start_score: u32,
    high_score: u32,
    lives: u32,
    wave: u32,
    invaders_remaining: u32,
    invaders_total: u32,
    shots_fired: u32,
    hits: u32,
    wave_elapsed: Duration,
    extra_life_flag: bool,
    next_extra_life_at: u32,
    directives: DirectiveSet,
}

impl Scoreboard {
    pub(crate) fn new() -> Self {
        Self {
            score: 0,
            wave_start_score: 0,
            high_score: 0,
            lives: 0,
            wave: 0,
            invaders_remaining: 0,
            invaders_total: 0,
            shots_fired: 0,
            hits: 0,
            wave_elapsed: Duration::ZERO,
            extra_life_flag: false,
            next_extra_life_at: 0,
            directives: DirectiveSet::default(),
        }
    }

    /// Resets every transient field for a fresh session.
    pub(crate) fn begin_game(&mut self, invaders: u32, tuning: &ScoringTuning) {
        self.score = 0;
        self.wave_start_score = 0;
        self.lives = tuning.starting_lives;
        self.wave = 1;
        self.invaders_remaining = invaders;
        self.invaders_total = invaders;
        self.shots_fired = 0;
        self.hits = 0;
        self.wave_elapsed = Duration::ZERO;
        self.extra_life_flag = false;
        self.next_extra_life_at = tuning.extra_life_threshold;
    }

    /// Advances to the next wave, preserving score and lives.
    pub(crate) fn begin_wave(&mut self, invaders: u32) {
        self.wave = self.wave.saturating_add(1);
        self.wave_start_score = self.score;
        self.invaders_remaining = invaders;
        self.invaders_total = invaders;
        self.wave_elapsed = Duration::ZERO;
        self.extra_life_flag = false;
    }

    /// Restores the wave-start snapshot for a penalty-free replay.
    pub(crate) fn replay_wave(&mut self, invaders: u32, tuning: &ScoringTuning) {
        self.score = self.wave_start_score;
        self.invaders_remaining = invaders;
        self.invaders_total = invaders;
        self.wave_elapsed = Duration::ZERO;
        self.extra_life_flag = false;
        self.next_extra_life_at = next_threshold_above(self.score, tuning.extra_life_threshold);
    }

    /// Awards tiered points for an invader destroyed on the given row and
    /// retires it from the remaining count, exactly once per invader.
    pub(crate) fn award_kill(&mut self, row: u32, tuning: &ScoringTuning) -> KillAward {
        self.hits = self.hits.saturating_add(1);
        self.invaders_remaining = self.invaders_remaining.saturating_sub(1);
        let points = tuning.row_value(row);
        let lives_awarded = self.add_points(points, tuning);
        KillAward {
            points,
            score: self.score,
            high_score: self.high_score,
            remaining: self.invaders_remaining,
            lives_awarded,
            lives: self.lives,
        }
    }

    fn add_points(&mut self, points: u32, tuning: &ScoringTuning) -> u32 {
        self.score = self.score.saturating_add(points);
        self.high_score = self.high_score.max(self.score);

        let mut lives_awarded = 0;
        if tuning.extra_life_threshold > 0 && self.directives.extra_life {
            while self.score >= self.next_extra_life_at {
                self.lives = self.lives.saturating_add(1);
                self.next_extra_life_at = self
                    .next_extra_life_at
                    .saturating_add(tuning.extra_life_threshold);
                lives_awarded += 1;
            }
        }
        if lives_awarded > 0 {
            self.extra_life_flag = true;
        }
        lives_awarded
    }

    /// Subtracts points, clamping at zero. The high score never rolls back.
    pub(crate) fn penalize(&mut self, points: u32) -> Penalty {
        let applied = points.min(self.score);
        self.score -= applied;
        Penalty {
            applied,
            score: self.score,
            high_score: self.high_score,
        }
    }

    /// Pure clamped life decrement; defensive checks live with the caller.
    pub(crate) fn lose_life(&mut self) -> u32 {
        self.lives = self.lives.saturating_sub(1);
        self.lives
    }

    pub(crate) fn record_shot(&mut self) {
        self.shots_fired = self.shots_fired.saturating_add(1);
    }

    pub(crate) fn tick_timer(&mut self, dt: Duration) {
        if self.directives.wave_timer {
            self.wave_elapsed = self.wave_elapsed.saturating_add(dt);
        }
    }

    pub(crate) fn clear_extra_life_flag(&mut self) {
        self.extra_life_flag = false;
    }

    pub(crate) fn apply_directive(&mut self, directive: Directive) {
        self.directives.apply(directive);
    }

    pub(crate) fn restore(&mut self, record: &PersistedRecord) {
        self.high_score = self.high_score.max(record.high_score);
        self.directives = record.directives;
    }

    pub(crate) fn directives(&self) -> &DirectiveSet {
        &self.directives
    }

    pub(crate) fn score(&self) -> u32 {
        self.score
    }

    pub(crate) fn wave(&self) -> u32 {
        self.wave
    }

    pub(crate) fn snapshot(
        &self,
        selected_gun: GunKind,
        effective_gun: GunKind,
    ) -> grid_assault_core::ScoreboardSnapshot {
        grid_assault_core::ScoreboardSnapshot {
            score: self.score,
            wave_start_score: self.wave_start_score,
            high_score: self.high_score,
            lives: self.lives,
            wave: self.wave,
            invaders_remaining: self.invaders_remaining,
            invaders_total: self.invaders_total,
            shots_fired: self.shots_fired,
            hits: self.hits,
            wave_elapsed: self.wave_elapsed,
            extra_life_flag: self.extra_life_flag,
            directives: self.directives,
            selected_gun,
            effective_gun,
        }
    }
}

fn next_threshold_above(score: u32, threshold: u32) -> u32 {
    if threshold == 0 {
        return u32::MAX;
    }
    (score / threshold + 1).saturating_mul(threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> (Scoreboard, ScoringTuning) {
        let tuning = ScoringTuning::default();
        let mut board = Scoreboard::new();
        board.begin_game(55, &tuning);
        (board, tuning)
    }

    #[test]
    fn fresh_game_matches_expected_counters() {
        let (board, _) = board();
        let snapshot = board.snapshot(GunKind::Standard, GunKind::Standard);
        assert_eq!(snapshot.score, 0);
        assert_eq!(snapshot.lives, 3);
        assert_eq!(snapshot.wave, 1);
        assert_eq!(snapshot.invaders_remaining, 55);
        assert_eq!(snapshot.invaders_total, 55);
    }

    #[test]
    fn top_row_kill_awards_thirty_points() {
        let (mut board, tuning) = board();
        let award = board.award_kill(0, &tuning);
        assert_eq!(award.points, 30);
        assert_eq!(award.score, 30);
        assert_eq!(award.remaining, 54);
        let snapshot = board.snapshot(GunKind::Standard, GunKind::Standard);
        assert_eq!(snapshot.hits, 1);
    }

    #[test]
    fn high_score_ratchets_and_never_rolls_back() {
        let (mut board, tuning) = board();
        let _ = board.award_kill(0, &tuning);
        let penalty = board.penalize(10_000);
        assert_eq!(penalty.score, 0);
        assert_eq!(penalty.applied, 30);
        assert_eq!(penalty.high_score, 30);
    }

    #[test]
    fn crossing_one_threshold_in_a_single_award_grants_one_life() {
        let tuning = ScoringTuning {
            row_values: vec![200],
            ..ScoringTuning::default()
        };
        let mut board = Scoreboard::new();
        board.begin_game(55, &tuning);
        // Walk the score to 1400, then cross 1500 in one 200-point award.
        for _ in 0..7 {
            let _ = board.award_kill(0, &tuning);
        }
        assert_eq!(board.score(), 1400);
        let award = board.award_kill(0, &tuning);
        assert_eq!(award.score, 1600);
        assert_eq!(award.lives_awarded, 1);
        assert_eq!(award.lives, 4);
        let snapshot = board.snapshot(GunKind::Standard, GunKind::Standard);
        assert!(snapshot.extra_life_flag);
    }

    #[test]
    fn crossing_two_thresholds_in_one_award_grants_two_lives() {
        let tuning = ScoringTuning {
            row_values: vec![3200],
            ..ScoringTuning::default()
        };
        let mut board = Scoreboard::new();
        board.begin_game(55, &tuning);
        let award = board.award_kill(0, &tuning);
        assert_eq!(award.lives_awarded, 2);
        assert_eq!(award.lives, 5);
    }

    #[test]
    fn disabled_extra_life_directive_suppresses_awards() {
        let (mut board, tuning) = board();
        board.apply_directive(Directive::ExtraLife(false));
        for _ in 0..60 {
            let _ = board.award_kill(0, &tuning); // 30 points each, 1800 total
        }
        let snapshot = board.snapshot(GunKind::Standard, GunKind::Standard);
        assert_eq!(snapshot.score, 1800);
        assert_eq!(snapshot.lives, 3);
        assert!(!snapshot.extra_life_flag);
    }

    #[test]
    fn replay_restores_wave_start_score_idempotently() {
        let (mut board, tuning) = board();
        for _ in 0..10 {
            let _ = board.award_kill(2, &tuning);
        }
        board.begin_wave(55);
        for _ in 0..15 {
            let _ = board.award_kill(2, &tuning);
        }
        assert_eq!(board.score(), 500);

        board.replay_wave(55, &tuning);
        let first = board.snapshot(GunKind::Standard, GunKind::Standard);
        board.replay_wave(55, &tuning);
        let second = board.snapshot(GunKind::Standard, GunKind::Standard);

        assert_eq!(first.score, 200);
        assert_eq!(first, second);
        assert_eq!(first.invaders_remaining, 55);
        assert_eq!(first.invaders_total, 55);
    }

    #[test]
    fn lives_floor_at_zero() {
        let (mut board, _) = board();
        assert_eq!(board.lose_life(), 2);
        assert_eq!(board.lose_life(), 1);
        assert_eq!(board.lose_life(), 0);
        assert_eq!(board.lose_life(), 0);
    }

    #[test]
    fn restore_keeps_the_larger_high_score() {
        let (mut board, tuning) = board();
        for _ in 0..4 {
            let _ = board.award_kill(0, &tuning);
        }
        board.restore(&PersistedRecord {
            high_score: 60,
            selected_gun: GunKind::Standard,
            directives: DirectiveSet::default(),
        });
        let snapshot = board.snapshot(GunKind::Standard, GunKind::Standard);
        assert_eq!(snapshot.high_score, 120);
    }

    #[test]
    fn wave_timer_only_accumulates_while_enabled() {
        let (mut board, _) = board();
        board.tick_timer(Duration::from_millis(500));
        board.apply_directive(Directive::WaveTimer(false));
        board.tick_timer(Duration::from_millis(500));
        let snapshot = board.snapshot(GunKind::Standard, GunKind::Standard);
        assert_eq!(snapshot.wave_elapsed, Duration::from_millis(500));
    }
}
