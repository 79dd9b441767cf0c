//! Property tests for simulation invariants

use glam::Vec2;
use proptest::prelude::*;

use orb_dodge::sim::spawn::{materialize, schedule_hostiles};
use orb_dodge::sim::{
    DifficultyState, EffectKind, GameState, StatusEffects, TelegraphTarget, TickInput, tick,
};
use orb_dodge::Tuning;

const EPS: f32 = 1e-3;

fn inside(pos: Vec2, radius: f32, size: Vec2) -> bool {
    pos.x >= radius - EPS
        && pos.x <= size.x - radius + EPS
        && pos.y >= radius - EPS
        && pos.y <= size.y - radius + EPS
}

fn pointer_path() -> impl Strategy<Value = Vec<(f32, f32)>> {
    prop::collection::vec((-100.0f32..900.0, -100.0f32..700.0), 1..40)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn entities_stay_inside_the_arena(
        seed in any::<u64>(),
        path in pointer_path(),
        near_boss in any::<bool>(),
    ) {
        let mut state = GameState::new(seed);
        state.player.invulnerable_until = u64::MAX;
        if near_boss {
            state.score = state.tuning.boss_threshold - 5;
        }
        let size = state.arena_size();

        for (x, y) in path {
            let input = TickInput {
                pointer: Some(Vec2::new(x, y)),
                ..Default::default()
            };
            for _ in 0..15 {
                tick(&mut state, &input);
                prop_assert!(inside(state.player.pos, state.player.radius, size));
                for h in &state.hostiles {
                    prop_assert!(inside(h.pos, h.radius, size), "hostile {} at {:?}", h.id, h.pos);
                }
                for p in &state.pickups {
                    prop_assert!(inside(p.pos, p.radius, size));
                }
                if state.boss.active {
                    prop_assert!(inside(state.boss.pos, state.boss.radius, size));
                }
            }
        }
    }

    #[test]
    fn combined_factor_is_the_minimum_active(
        slow in 0.01f32..1.0,
        recovery in 0.01f32..1.0,
        slow_on in any::<bool>(),
        recovery_on in any::<bool>(),
    ) {
        let mut effects = StatusEffects::default();
        let mut expected = 1.0f32;
        if slow_on {
            effects.activate(EffectKind::TimeSlow, 0, 100, slow);
            expected = expected.min(slow);
        }
        if recovery_on {
            effects.activate(EffectKind::DamageRecovery, 0, 50, recovery);
            expected = expected.min(recovery);
        }
        prop_assert_eq!(effects.combined_factor(), expected);

        // Only the recovery has elapsed
        effects.expire(50);
        let expected = if slow_on { slow } else { 1.0 };
        prop_assert_eq!(effects.combined_factor(), expected);
    }

    #[test]
    fn telegraphs_convert_one_to_one_and_never_early(
        seed in any::<u64>(),
        score in 0u64..900,
    ) {
        let mut state = GameState::new(seed);
        state.score = score;
        schedule_hostiles(&mut state);

        let telegraphed = state
            .telegraphs
            .iter()
            .filter(|t| matches!(t.target, TelegraphTarget::Hostile(_)))
            .count();
        prop_assert_eq!(
            telegraphed as u32,
            state.spawner.expected_hostiles(score, &state.tuning)
        );

        let delay = state.tuning.telegraph_ticks();
        state.time_ticks += delay - 1;
        materialize(&mut state);
        prop_assert!(state.hostiles.is_empty());
        prop_assert_eq!(state.telegraphs.len(), telegraphed);

        state.time_ticks += 1;
        materialize(&mut state);
        prop_assert_eq!(state.hostiles.len(), telegraphed);
        prop_assert!(state.telegraphs.is_empty());

        // Already converted telegraphs never produce a second hostile
        materialize(&mut state);
        prop_assert_eq!(state.hostiles.len(), telegraphed);
    }

    #[test]
    fn difficulty_only_ever_gets_harder(
        steps in prop::collection::vec((1u64..40, 1u64..600), 1..80),
    ) {
        let tuning = Tuning::default();
        let mut difficulty = DifficultyState::new(&tuning);
        let mut score = 0u64;
        let mut now = 0u64;
        let mut speed = difficulty.base_speed;
        let mut interval = difficulty.score_timer.interval_secs;

        for (points, ticks) in steps {
            score += points;
            now += ticks;
            difficulty.check_score_interval(now, &tuning);
            difficulty.check_speed(score, false, &tuning);

            prop_assert!(difficulty.base_speed >= speed);
            prop_assert!(difficulty.base_speed <= tuning.max_base_speed + EPS);
            prop_assert!(difficulty.score_timer.interval_secs <= interval);
            prop_assert!(difficulty.score_timer.interval_secs >= tuning.min_score_interval_secs - EPS);
            speed = difficulty.base_speed;
            interval = difficulty.score_timer.interval_secs;
        }
    }
}
