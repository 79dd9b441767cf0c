//! Difficulty progression
//!
//! Two independent ramps: the score timer speeds up on elapsed time, and the
//! hostile base speed rises on score. Both only ever get harder; the speed ramp
//! pauses inside the boss pre-zone and during the fight.

use serde::{Deserialize, Serialize};

use super::state::{GameEvent, GameState, Hostile};
use crate::consts::SIM_DT;
use crate::secs_to_ticks;
use crate::tuning::Tuning;

/// Repeating timer that awards one point per interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreTimer {
    pub interval_secs: f32,
    /// Time accumulated towards the next point
    pub elapsed_secs: f32,
}

impl ScoreTimer {
    pub fn new(interval_secs: f32) -> Self {
        Self {
            interval_secs,
            elapsed_secs: 0.0,
        }
    }

    /// Advance by `dt`, returning the number of points earned
    pub fn advance(&mut self, dt: f32) -> u32 {
        self.elapsed_secs += dt;
        let mut points = 0;
        while self.elapsed_secs >= self.interval_secs {
            self.elapsed_secs -= self.interval_secs;
            points += 1;
        }
        points
    }

    /// Tear the timer down and start again with a new interval
    pub fn rebuild(&mut self, interval_secs: f32) {
        *self = Self::new(interval_secs);
    }
}

/// Progression state for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyState {
    /// Wanderer speed; pursuers move at half
    pub base_speed: f32,
    pub score_timer: ScoreTimer,
    /// Floor for the score interval (shrinks with each level)
    pub min_interval_secs: f32,
    /// Tick of the last score interval change
    pub last_interval_change_tick: u64,
    /// Score at which the last speed bump fired
    pub last_speed_bump_score: u64,
    /// Number of speed bumps so far (drives step easing)
    pub speed_bumps: u32,
}

impl DifficultyState {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            base_speed: tuning.base_speed,
            score_timer: ScoreTimer::new(tuning.score_interval_secs),
            min_interval_secs: tuning.min_score_interval_secs,
            last_interval_change_tick: 0,
            last_speed_bump_score: 0,
            speed_bumps: 0,
        }
    }

    /// Points per second awarded by the score timer
    pub fn score_rate(&self) -> f32 {
        1.0 / self.score_timer.interval_secs
    }

    /// Shorten the score interval once enough time passed without a change.
    /// Returns true when the timer was rebuilt.
    pub fn check_score_interval(&mut self, now: u64, tuning: &Tuning) -> bool {
        let period = secs_to_ticks(tuning.score_accel_period_secs);
        if now.saturating_sub(self.last_interval_change_tick) < period {
            return false;
        }
        self.last_interval_change_tick = now;

        let current = self.score_timer.interval_secs;
        let next = (current * tuning.score_interval_accel).max(self.min_interval_secs);
        if next >= current {
            return false;
        }

        log::debug!("Score interval {current:.4}s -> {next:.4}s");
        self.score_timer.rebuild(next);
        true
    }

    /// Multiplier of the next speed bump (shrinks as bumps accumulate)
    pub fn next_speed_step(&self, tuning: &Tuning) -> f32 {
        1.0 + (tuning.speed_accel - 1.0) / (1.0 + self.speed_bumps as f32 * tuning.speed_easing)
    }

    /// Raise the base speed if a full score step passed since the last bump.
    /// Returns the new base speed when a bump fired.
    pub fn check_speed(&mut self, score: u64, suppressed: bool, tuning: &Tuning) -> Option<f32> {
        if score.saturating_sub(self.last_speed_bump_score) < tuning.speed_step_score || suppressed {
            return None;
        }

        let step = self.next_speed_step(tuning);
        let next = (self.base_speed * step).min(tuning.max_base_speed);
        self.last_speed_bump_score = score;
        if next <= self.base_speed {
            return None;
        }
        self.base_speed = next;
        self.speed_bumps += 1;
        Some(self.base_speed)
    }

    /// Permanent step-up applied once after a boss encounter
    pub fn apply_level_transition(&mut self, score: u64, now: u64, factor: f32) {
        self.base_speed *= factor;
        self.min_interval_secs /= factor;
        let interval = self.score_timer.interval_secs / factor;
        self.score_timer.rebuild(interval);
        self.last_interval_change_tick = now;
        self.last_speed_bump_score = score;
    }
}

/// Score at which the current level's boss triggers
pub fn boss_trigger_score(state: &GameState) -> u64 {
    state.spawner.level_start_score + state.tuning.boss_threshold
}

/// Whether the score sits in the breather window just before the boss
pub fn in_boss_pre_zone(state: &GameState) -> bool {
    let trigger = boss_trigger_score(state);
    let start = state.spawner.level_start_score + state.tuning.pre_zone_start();
    (start..trigger).contains(&state.score)
}

/// Run the score timer for one tick; returns points awarded
pub fn advance_score(state: &mut GameState) -> u32 {
    let points = state.difficulty.score_timer.advance(SIM_DT);
    state.score += points as u64;
    points
}

/// Progression checks driven by score ticks
pub fn on_score_tick(state: &mut GameState) {
    state
        .difficulty
        .check_score_interval(state.time_ticks, &state.tuning);

    let suppressed = state.boss_engaged() || in_boss_pre_zone(state);
    let Some(base_speed) = state
        .difficulty
        .check_speed(state.score, suppressed, &state.tuning)
    else {
        return;
    };

    log::debug!("Speed bump at score {}: base speed {base_speed:.1}", state.score);
    propagate_base_speed(state);
    state.events.push(GameEvent::SpeedBump { base_speed });
}

/// Apply the current base speed to every regular hostile
pub fn propagate_base_speed(state: &mut GameState) {
    let base = state.difficulty.base_speed;
    for hostile in state.hostiles.iter_mut().filter(|h| !h.is_boss_projectile()) {
        hostile.speed = Hostile::speed_for_base(hostile.variant, base);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Variant;
    use glam::Vec2;

    #[test]
    fn test_score_timer_awards_points() {
        let mut timer = ScoreTimer::new(0.1);
        let mut points = 0;
        for _ in 0..60 {
            points += timer.advance(SIM_DT);
        }
        assert!((9..=10).contains(&points));

        timer.rebuild(0.05);
        assert_eq!(timer.elapsed_secs, 0.0);
        assert_eq!(timer.interval_secs, 0.05);
    }

    #[test]
    fn test_score_interval_accelerates_to_floor() {
        let tuning = Tuning::default();
        let mut difficulty = DifficultyState::new(&tuning);
        let period = secs_to_ticks(tuning.score_accel_period_secs);

        assert!(!difficulty.check_score_interval(period - 1, &tuning));
        assert!(difficulty.check_score_interval(period, &tuning));
        assert!(difficulty.score_timer.interval_secs < tuning.score_interval_secs);

        // Re-armed only after another full period
        assert!(!difficulty.check_score_interval(period + 1, &tuning));

        let mut now = period;
        let mut last = difficulty.score_timer.interval_secs;
        for _ in 0..200 {
            now += period;
            difficulty.check_score_interval(now, &tuning);
            assert!(difficulty.score_timer.interval_secs <= last);
            last = difficulty.score_timer.interval_secs;
        }
        assert!((last - tuning.min_score_interval_secs).abs() < 1e-6);
    }

    #[test]
    fn test_speed_bump_once_per_threshold() {
        let tuning = Tuning::default();
        let mut difficulty = DifficultyState::new(&tuning);

        assert!(difficulty.check_speed(49, false, &tuning).is_none());
        let bumped = difficulty.check_speed(50, false, &tuning).expect("bump at 50");
        assert!((bumped - tuning.base_speed * tuning.speed_accel).abs() < 1e-3);

        // Same score tick does not fire again
        assert!(difficulty.check_speed(50, false, &tuning).is_none());
        assert!(difficulty.check_speed(99, false, &tuning).is_none());
        assert!(difficulty.check_speed(100, false, &tuning).is_some());
    }

    #[test]
    fn test_speed_steps_diminish() {
        let tuning = Tuning::default();
        let mut difficulty = DifficultyState::new(&tuning);
        let first = difficulty.next_speed_step(&tuning);
        difficulty.check_speed(50, false, &tuning);
        let second = difficulty.next_speed_step(&tuning);
        assert!(second < first);
        assert!(second > 1.0);
    }

    #[test]
    fn test_no_bump_at_or_above_cap() {
        let tuning = Tuning::default();
        let mut difficulty = DifficultyState::new(&tuning);
        difficulty.base_speed = tuning.max_base_speed;
        assert!(difficulty.check_speed(50, false, &tuning).is_none());
        assert_eq!(difficulty.last_speed_bump_score, 50);

        // A level transition can push past the cap; bumps stay silent
        difficulty.apply_level_transition(60, 0, tuning.level_factor);
        let boosted = difficulty.base_speed;
        assert!(boosted > tuning.max_base_speed);
        assert!(difficulty.check_speed(110, false, &tuning).is_none());
        assert_eq!(difficulty.base_speed, boosted);
        assert_eq!(difficulty.speed_bumps, 0);
    }

    #[test]
    fn test_speed_suppressed() {
        let tuning = Tuning::default();
        let mut difficulty = DifficultyState::new(&tuning);
        assert!(difficulty.check_speed(950, true, &tuning).is_none());
        assert_eq!(difficulty.base_speed, tuning.base_speed);
    }

    #[test]
    fn test_pre_zone_window() {
        let mut state = GameState::new(1);
        state.score = 899;
        assert!(!in_boss_pre_zone(&state));
        state.score = 900;
        assert!(in_boss_pre_zone(&state));
        state.score = 999;
        assert!(in_boss_pre_zone(&state));
        state.score = 1000;
        assert!(!in_boss_pre_zone(&state));

        state.spawner.start_level(1500);
        state.score = 2450;
        assert!(in_boss_pre_zone(&state));
    }

    #[test]
    fn test_no_speed_bump_in_pre_zone() {
        let mut state = GameState::new(1);
        state.difficulty.last_speed_bump_score = 850;
        state.score = 950;
        on_score_tick(&mut state);
        assert_eq!(state.difficulty.base_speed, state.tuning.base_speed);

        state.score = 1010;
        on_score_tick(&mut state);
        assert!(state.difficulty.base_speed > state.tuning.base_speed);
    }

    #[test]
    fn test_speed_propagates_to_active_hostiles() {
        let mut state = GameState::new(1);
        let base = state.difficulty.base_speed;
        let w = state.ids.next();
        let p = state.ids.next();
        state
            .hostiles
            .push(Hostile::new(w, Vec2::new(50.0, 50.0), Vec2::X, base, 12.0, Variant::Wanderer));
        state
            .hostiles
            .push(Hostile::new(p, Vec2::new(90.0, 50.0), Vec2::X, base * 0.5, 12.0, Variant::Pursuer));

        state.score = 50;
        on_score_tick(&mut state);

        let new_base = state.difficulty.base_speed;
        assert!(new_base > base);
        assert_eq!(state.hostiles[0].speed, new_base);
        assert_eq!(state.hostiles[1].speed, new_base * 0.5);
    }

    #[test]
    fn test_level_transition_is_permanent_step_up() {
        let tuning = Tuning::default();
        let mut difficulty = DifficultyState::new(&tuning);
        let rate = difficulty.score_rate();
        difficulty.apply_level_transition(1200, 5000, tuning.level_factor);

        assert!((difficulty.base_speed - tuning.base_speed * tuning.level_factor).abs() < 1e-3);
        assert!((difficulty.score_rate() - rate * tuning.level_factor).abs() < 1e-2);
        assert_eq!(difficulty.last_speed_bump_score, 1200);
    }
}
