//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. Ordering is the
//! only synchronization between components:
//! effects expiry → banner → spawns → movement/collision → score/boss trigger/difficulty → boss.

use glam::Vec2;

use super::boss::{self, BossOutcome};
use super::collision::{self, ContactOutcome};
use super::difficulty;
use super::spawn;
use super::state::{GamePhase, GameState};
use crate::clamp_to_arena;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Latest pointer/touch position, already mapped into arena space
    pub pointer: Option<Vec2>,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                return;
            }
            GamePhase::Paused => state.phase = GamePhase::Playing,
            GamePhase::GameOver => {}
        }
    }

    // Don't tick if paused or game over
    match state.phase {
        GamePhase::Paused | GamePhase::GameOver => return,
        GamePhase::Playing => {}
    }

    state.time_ticks += 1;
    let now = state.time_ticks;

    if let Some(pointer) = input.pointer {
        state.player.pos = clamp_to_arena(pointer, state.player.radius, state.arena_size());
    }

    state.effects.expire(now);

    // Delayed boss arrival, then two-phase spawning
    boss::update_banner(state);
    spawn::update_spawns(state);

    if collision::resolve(state) == ContactOutcome::RunEnded {
        return;
    }

    // Trigger first so the trigger tick itself counts as engaged
    if difficulty::advance_score(state) > 0 {
        boss::trigger_if_due(state);
        difficulty::on_score_tick(state);
    }

    if boss::update_boss(state) == BossOutcome::Finished {
        log::debug!("Boss encounter finished at tick {now}");
    }

    state.explosions.retain(|e| !e.is_finished(now));

    // Ensure deterministic ordering
    state.normalize_order();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::boss::BossPhase;
    use crate::sim::state::GameEvent;

    #[test]
    fn test_tick_pause() {
        let mut state = GameState::new(12345);
        tick(&mut state, &TickInput::default());
        assert_eq!(state.time_ticks, 1);

        let input = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &input);
        assert_eq!(state.phase, GamePhase::Paused);

        // Paused ticks freeze the clock
        tick(&mut state, &TickInput::default());
        assert_eq!(state.time_ticks, 1);

        // Unpause
        tick(&mut state, &input);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.time_ticks, 2);
    }

    #[test]
    fn test_first_hostile_is_telegraphed_then_spawned() {
        let mut state = GameState::new(3);
        state.player.invulnerable_until = u64::MAX;
        tick(&mut state, &TickInput::default());
        assert_eq!(state.telegraphs.len(), 1);
        assert!(state.hostiles.is_empty());

        let delay = state.tuning.telegraph_ticks();
        for _ in 0..delay {
            tick(&mut state, &TickInput::default());
        }
        assert!(!state.hostiles.is_empty());
    }

    #[test]
    fn test_pointer_clamped_to_arena() {
        let mut state = GameState::new(3);
        let input = TickInput {
            pointer: Some(Vec2::new(-50.0, 10_000.0)),
            ..Default::default()
        };
        tick(&mut state, &input);
        assert_eq!(
            state.player.pos,
            Vec2::new(state.player.radius, state.tuning.arena_height - state.player.radius)
        );
    }

    #[test]
    fn test_score_accrues_over_time() {
        let mut state = GameState::new(3);
        // Keep the player out of harm's way
        state.player.invulnerable_until = u64::MAX;
        for _ in 0..120 {
            tick(&mut state, &TickInput::default());
        }
        assert!((19..=20).contains(&state.score));
    }

    #[test]
    fn test_boss_triggers_from_score_ticks() {
        let mut state = GameState::new(3);
        state.player.invulnerable_until = u64::MAX;
        state.score = state.tuning.boss_threshold - 1;

        let mut banner = false;
        for _ in 0..10 {
            tick(&mut state, &TickInput::default());
            banner |= state.drain_events().contains(&GameEvent::BossBanner);
        }
        assert!(banner);
        assert!(state.hostiles.is_empty());
        assert!(state.telegraphs.is_empty());

        let banner_ticks = crate::secs_to_ticks(state.tuning.boss_banner_secs);
        for _ in 0..banner_ticks {
            tick(&mut state, &TickInput::default());
        }
        assert!(state.boss.active);
        assert_eq!(state.boss.phase, BossPhase::Intro);
        assert!(state.telegraphs.is_empty());
    }

    #[test]
    fn test_no_speed_bump_on_boss_trigger_tick() {
        let mut state = GameState::new(3);
        state.player.invulnerable_until = u64::MAX;
        state.score = 899;
        state.difficulty.last_speed_bump_score = 850;

        let mut events = Vec::new();
        for _ in 0..1_000 {
            tick(&mut state, &TickInput::default());
            events.extend(state.drain_events());
            if events.contains(&GameEvent::BossBanner) {
                break;
            }
        }

        assert!(events.contains(&GameEvent::BossBanner));
        assert_eq!(state.score, state.tuning.boss_threshold);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::SpeedBump { .. })));
        assert_eq!(state.difficulty.base_speed, state.tuning.base_speed);
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let mut state1 = GameState::new(99999);
        let mut state2 = GameState::new(99999);

        for i in 0..600 {
            let input = TickInput {
                pointer: Some(Vec2::new(400.0 + (i as f32 * 0.05).sin() * 200.0, 300.0)),
                ..Default::default()
            };
            tick(&mut state1, &input);
            tick(&mut state2, &input);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.score, state2.score);
        assert_eq!(state1.hostiles.len(), state2.hostiles.len());
        for (a, b) in state1.hostiles.iter().zip(&state2.hostiles) {
            assert_eq!(a.pos, b.pos);
        }
    }
}
