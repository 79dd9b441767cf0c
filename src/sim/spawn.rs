//! Spawn scheduling
//!
//! Every spawn is two-phase: a telegraph is placed first and only converts
//! into a hostile or pickup once its delay has run out. Nothing spawns while
//! the boss is engaged (banner showing or fight running).

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{
    GameEvent, GameState, Hostile, Pickup, PickupKind, Telegraph, TelegraphTarget, Variant,
};
use crate::tuning::{Abilities, Tuning};
use crate::{direction_from_angle, safe_direction};

/// Milestone progress for one pickup kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupSchedule {
    pub kind: PickupKind,
    /// Index of the next milestone to fire
    pub milestone_index: u32,
}

/// Spawn bookkeeping that must survive across ticks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnScheduler {
    /// Score at which the current level began
    pub level_start_score: u64,
    /// Hostiles destroyed by bombs this level (still count as "existing")
    pub bomb_kills: u32,
    pub pickups: Vec<PickupSchedule>,
}

impl SpawnScheduler {
    pub fn new(_tuning: &Tuning) -> Self {
        Self {
            level_start_score: 0,
            bomb_kills: 0,
            pickups: PickupKind::ALL
                .iter()
                .map(|&kind| PickupSchedule {
                    kind,
                    milestone_index: 0,
                })
                .collect(),
        }
    }

    /// Score gained since the current level began
    #[inline]
    pub fn relative_score(&self, score: u64) -> u64 {
        score.saturating_sub(self.level_start_score)
    }

    /// How many hostiles should exist at this score
    pub fn expected_hostiles(&self, score: u64, tuning: &Tuning) -> u32 {
        1 + (self.relative_score(score) / tuning.score_per_hostile) as u32
    }

    /// Score at which the next pickup of `kind` is due
    pub fn next_pickup_score(&self, kind: PickupKind, tuning: &Tuning, abilities: &Abilities) -> u64 {
        let milestones = match kind {
            PickupKind::Heart => &tuning.heart_milestones,
            PickupKind::Bomb => &tuning.bomb_milestones,
            PickupKind::Hourglass => &tuning.hourglass_milestones,
        };
        let index = self
            .pickups
            .iter()
            .find(|p| p.kind == kind)
            .map(|p| p.milestone_index)
            .unwrap_or(0);
        milestones.score_at(index, abilities.pickup_interval_scale())
    }

    /// Reset level-relative counters (after a boss encounter)
    pub fn start_level(&mut self, score: u64) {
        self.level_start_score = score;
        self.bomb_kills = 0;
    }
}

/// Pulse indicators, materialize mature telegraphs, then schedule new ones
pub fn update_spawns(state: &mut GameState) {
    for telegraph in &mut state.telegraphs {
        telegraph.pulse(&state.tuning);
    }

    materialize(state);

    if state.boss_engaged() {
        return;
    }

    schedule_hostiles(state);
    schedule_pickups(state);
}

/// Enqueue telegraphs for the gap between expected and existing hostiles
pub fn schedule_hostiles(state: &mut GameState) {
    let expected = state.spawner.expected_hostiles(state.score, &state.tuning);
    let active = state.hostiles.iter().filter(|h| !h.is_boss_projectile()).count() as u32;
    let pending = state
        .telegraphs
        .iter()
        .filter(|t| matches!(t.target, TelegraphTarget::Hostile(_)))
        .count() as u32;
    let existing = active + pending + state.spawner.bomb_kills;

    if existing >= expected {
        return;
    }

    let deficit = expected - existing;
    log::debug!("Telegraphing {deficit} hostile(s) at score {}", state.score);

    let pursuers_unlocked = state.score >= state.tuning.pursuer_unlock_score;
    for _ in 0..deficit {
        let variant = if pursuers_unlocked && state.rng.random::<f32>() < state.tuning.pursuer_chance {
            Variant::Pursuer
        } else {
            Variant::Wanderer
        };
        let margin = state.tuning.hostile_radius;
        let pos = random_point(state, margin);
        push_telegraph(state, pos, TelegraphTarget::Hostile(variant));
    }
}

/// Telegraph pickups whose score milestone has been reached
pub fn schedule_pickups(state: &mut GameState) {
    for kind in PickupKind::ALL {
        let due = state
            .spawner
            .next_pickup_score(kind, &state.tuning, &state.abilities);
        if state.score < due || pickup_outstanding(state, kind) {
            continue;
        }

        if let Some(schedule) = state.spawner.pickups.iter_mut().find(|p| p.kind == kind) {
            schedule.milestone_index += 1;
        }
        let margin = state.tuning.pickup_radius;
        let pos = random_point(state, margin);
        push_telegraph(state, pos, TelegraphTarget::Pickup(kind));
        log::debug!("Telegraphing {kind:?} pickup (milestone {due})");
    }
}

/// Convert every mature telegraph 1:1 into its target
pub fn materialize(state: &mut GameState) {
    let now = state.time_ticks;
    let (mature, pending): (Vec<Telegraph>, Vec<Telegraph>) = std::mem::take(&mut state.telegraphs)
        .into_iter()
        .partition(|t| t.is_mature(now));
    state.telegraphs = pending;

    for telegraph in mature {
        match telegraph.target {
            TelegraphTarget::Hostile(variant) => {
                let dir = match variant {
                    Variant::Pursuer => safe_direction(state.player.pos - telegraph.pos, Vec2::X),
                    Variant::Wanderer => direction_from_angle(state.rng.random_range(0.0..TAU)),
                };
                let speed = Hostile::speed_for_base(variant, state.difficulty.base_speed);
                let id = state.ids.next();
                state.hostiles.push(Hostile::new(
                    id,
                    telegraph.pos,
                    dir,
                    speed,
                    state.tuning.hostile_radius,
                    variant,
                ));
                state.events.push(GameEvent::HostileSpawned { id, variant });
            }
            TelegraphTarget::Pickup(kind) => {
                let id = state.ids.next();
                state.pickups.push(Pickup {
                    id,
                    kind,
                    pos: telegraph.pos,
                    radius: state.tuning.pickup_radius,
                });
                state.events.push(GameEvent::PickupSpawned { id, kind });
            }
        }
    }
}

fn pickup_outstanding(state: &GameState, kind: PickupKind) -> bool {
    state.pickups.iter().any(|p| p.kind == kind)
        || state
            .telegraphs
            .iter()
            .any(|t| t.target == TelegraphTarget::Pickup(kind))
}

fn push_telegraph(state: &mut GameState, pos: Vec2, target: TelegraphTarget) {
    let id = state.ids.next();
    let mature_tick = state.time_ticks + state.tuning.telegraph_ticks();
    state.telegraphs.push(Telegraph {
        id,
        pos,
        mature_tick,
        target,
        indicator_radius: state.tuning.pulse_min_radius,
        pulse_dir: 1.0,
    });
}

/// Uniform in-bounds position keeping `margin` from every wall
fn random_point(state: &mut GameState, margin: f32) -> Vec2 {
    let size = state.arena_size();
    let mut axis = |extent: f32| {
        if extent > 2.0 * margin {
            state.rng.random_range(margin..=extent - margin)
        } else {
            extent / 2.0
        }
    };
    let x = axis(size.x);
    let y = axis(size.y);
    Vec2::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_hostiles_formula() {
        let tuning = Tuning::default();
        let mut spawner = SpawnScheduler::new(&tuning);
        assert_eq!(spawner.expected_hostiles(0, &tuning), 1);
        assert_eq!(spawner.expected_hostiles(19, &tuning), 1);
        assert_eq!(spawner.expected_hostiles(20, &tuning), 2);
        assert_eq!(spawner.expected_hostiles(105, &tuning), 6);

        spawner.start_level(1000);
        assert_eq!(spawner.expected_hostiles(1000, &tuning), 1);
        assert_eq!(spawner.expected_hostiles(1040, &tuning), 3);
    }

    #[test]
    fn test_schedule_fills_deficit_with_telegraphs() {
        let mut state = GameState::new(1);
        state.score = 45;
        schedule_hostiles(&mut state);
        assert_eq!(state.telegraphs.len(), 3);
        assert!(state.hostiles.is_empty());

        // Already satisfied: nothing more
        schedule_hostiles(&mut state);
        assert_eq!(state.telegraphs.len(), 3);
    }

    #[test]
    fn test_bomb_kills_count_as_existing() {
        let mut state = GameState::new(1);
        state.score = 45;
        state.spawner.bomb_kills = 2;
        schedule_hostiles(&mut state);
        assert_eq!(state.telegraphs.len(), 1);
    }

    #[test]
    fn test_telegraph_positions_in_bounds() {
        let mut state = GameState::new(99);
        state.score = 2000;
        schedule_hostiles(&mut state);
        let r = state.tuning.hostile_radius;
        for t in &state.telegraphs {
            assert!(t.pos.x >= r && t.pos.x <= state.tuning.arena_width - r);
            assert!(t.pos.y >= r && t.pos.y <= state.tuning.arena_height - r);
        }
    }

    #[test]
    fn test_no_pursuers_before_unlock() {
        let mut state = GameState::new(3);
        state.tuning.pursuer_chance = 1.0;
        state.score = state.tuning.pursuer_unlock_score - 1;
        schedule_hostiles(&mut state);
        assert!(
            state
                .telegraphs
                .iter()
                .all(|t| t.target == TelegraphTarget::Hostile(Variant::Wanderer))
        );

        state.score = state.tuning.pursuer_unlock_score + 40;
        schedule_hostiles(&mut state);
        assert!(
            state
                .telegraphs
                .iter()
                .any(|t| t.target == TelegraphTarget::Hostile(Variant::Pursuer))
        );
    }

    #[test]
    fn test_materialize_converts_once_and_not_early() {
        let mut state = GameState::new(5);
        state.score = 20;
        schedule_hostiles(&mut state);
        let telegraphed = state.telegraphs.len();
        let mature_tick = state.telegraphs[0].mature_tick;

        state.time_ticks = mature_tick - 1;
        materialize(&mut state);
        assert!(state.hostiles.is_empty());
        assert_eq!(state.telegraphs.len(), telegraphed);

        state.time_ticks = mature_tick;
        materialize(&mut state);
        assert_eq!(state.hostiles.len(), telegraphed);
        assert!(state.telegraphs.is_empty());

        materialize(&mut state);
        assert_eq!(state.hostiles.len(), telegraphed);
    }

    #[test]
    fn test_materialized_pursuer_speed_is_half_base() {
        let mut state = GameState::new(5);
        let id = state.ids.next();
        state.telegraphs.push(Telegraph {
            id,
            pos: Vec2::new(100.0, 100.0),
            mature_tick: 0,
            target: TelegraphTarget::Hostile(Variant::Pursuer),
            indicator_radius: 6.0,
            pulse_dir: 1.0,
        });
        materialize(&mut state);
        assert_eq!(state.hostiles[0].speed, state.difficulty.base_speed * 0.5);
        // Aimed at the player
        let to_player = (state.player.pos - state.hostiles[0].pos).normalize();
        assert!(state.hostiles[0].dir.dot(to_player) > 0.999);
    }

    #[test]
    fn test_pickup_milestones_one_outstanding_per_kind() {
        let mut state = GameState::new(11);
        state.score = state.tuning.heart_milestones.second + 1;

        schedule_pickups(&mut state);
        let hearts = |s: &GameState| {
            s.telegraphs
                .iter()
                .filter(|t| t.target == TelegraphTarget::Pickup(PickupKind::Heart))
                .count()
        };
        assert_eq!(hearts(&state), 1);

        // Second milestone is due too, but one heart is already outstanding
        schedule_pickups(&mut state);
        assert_eq!(hearts(&state), 1);

        state.telegraphs.clear();
        schedule_pickups(&mut state);
        assert_eq!(hearts(&state), 1);
        assert_eq!(
            state
                .spawner
                .next_pickup_score(PickupKind::Heart, &state.tuning, &state.abilities),
            state.tuning.heart_milestones.second + state.tuning.heart_milestones.interval
        );
    }

    #[test]
    fn test_no_spawning_while_boss_engaged() {
        let mut state = GameState::new(2);
        state.score = 300;
        state.banner_until = Some(100);
        update_spawns(&mut state);
        assert!(state.telegraphs.is_empty());

        state.banner_until = None;
        state.boss.active = true;
        update_spawns(&mut state);
        assert!(state.telegraphs.is_empty());
    }
}
