//! Boss encounter state machine
//!
//! idle → (banner) → intro → wave_attacks → charge_attacks → final_burst → done → idle
//!
//! Phases only move forward. Waiting on projectiles is a polling guard
//! evaluated every tick, never a callback.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::difficulty::{boss_trigger_score, propagate_base_speed};
use super::state::{Explosion, ExplosionKind, GameEvent, GamePhase, GameState, Hostile, ProjectileKind};
use crate::consts::SIM_DT;
use crate::{clamp_to_arena, direction_from_angle, safe_direction, secs_to_ticks};

/// Boss encounter phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BossPhase {
    #[default]
    Idle,
    Intro,
    WaveAttacks,
    ChargeAttacks,
    FinalBurst,
    Done,
}

/// Sub-state of a single charge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChargeStep {
    /// Winding up; direction is picked when the wind-up ends
    #[default]
    Aiming,
    /// Moving along a fixed direction until a wall
    Charging,
    /// Dazed after a wall hit
    Confused,
}

/// Distance within which the boss counts as flush against a wall
const WALL_EPS: f32 = 1e-3;

/// What the host should do after a boss update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossOutcome {
    Continue,
    /// Encounter over, normal play resumed at the next level
    Finished,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossState {
    pub active: bool,
    pub phase: BossPhase,
    pub pos: Vec2,
    pub radius: f32,
    /// Charge heading (kept between charges as the fallback aim)
    pub dir: Vec2,
    pub speed: f32,
    pub waves_done: u32,
    pub charges_done: u32,
    pub charge_step: ChargeStep,
    /// Earliest tick for the next timed action
    pub next_action_tick: u64,
    /// Cosmetic laugh expression ends at this tick
    pub laugh_until: u64,
}

impl Default for BossState {
    fn default() -> Self {
        Self {
            active: false,
            phase: BossPhase::Idle,
            pos: Vec2::ZERO,
            radius: 0.0,
            dir: Vec2::X,
            speed: 0.0,
            waves_done: 0,
            charges_done: 0,
            charge_step: ChargeStep::Aiming,
            next_action_tick: 0,
            laugh_until: 0,
        }
    }
}

impl BossState {
    /// Spawn the boss and enter the intro
    pub fn start(&mut self, center: Vec2, radius: f32, now: u64, intro_ticks: u64) {
        *self = Self {
            active: true,
            phase: BossPhase::Intro,
            pos: center,
            radius,
            next_action_tick: now + intro_ticks,
            ..Self::default()
        };
    }

    pub fn is_laughing(&self, now: u64) -> bool {
        self.active && now < self.laugh_until
    }

    pub fn is_confused(&self) -> bool {
        self.phase == BossPhase::ChargeAttacks && self.charge_step == ChargeStep::Confused
    }
}

fn enter_phase(state: &mut GameState, phase: BossPhase) {
    log::info!("Boss phase {:?} -> {:?}", state.boss.phase, phase);
    state.boss.phase = phase;
    state.events.push(GameEvent::BossPhaseChanged { phase });
}

/// Start the pre-fight banner once the level's boss score is reached.
/// Returns true when the encounter was triggered.
pub fn trigger_if_due(state: &mut GameState) -> bool {
    if state.boss_engaged() || state.score < boss_trigger_score(state) {
        return false;
    }

    state.clear_field();
    state.banner_until = Some(state.time_ticks + secs_to_ticks(state.tuning.boss_banner_secs));
    state.events.push(GameEvent::BossBanner);
    log::info!("Boss triggered at score {} (level {})", state.score, state.level);
    true
}

/// Spawn the boss once the banner has elapsed, if the run is still live
pub fn update_banner(state: &mut GameState) {
    let Some(until) = state.banner_until else {
        return;
    };
    if state.time_ticks < until {
        return;
    }
    state.banner_until = None;

    if state.phase != GamePhase::Playing || state.boss.active {
        return;
    }

    let center = state.arena_center();
    let intro = secs_to_ticks(state.tuning.boss_intro_secs);
    state
        .boss
        .start(center, state.tuning.boss_radius, state.time_ticks, intro);
    state.events.push(GameEvent::BossArrived);
    log::info!("Boss arrived");
}

/// Advance the encounter by one tick
pub fn update_boss(state: &mut GameState) -> BossOutcome {
    if !state.boss.active {
        return BossOutcome::Continue;
    }
    let now = state.time_ticks;

    match state.boss.phase {
        BossPhase::Idle => {}
        BossPhase::Intro => {
            if now >= state.boss.next_action_tick {
                enter_phase(state, BossPhase::WaveAttacks);
                state.boss.laugh_until = now + secs_to_ticks(state.tuning.boss_laugh_secs);
            }
        }
        BossPhase::WaveAttacks => {
            if state.boss_projectiles_alive() > 0 {
                return BossOutcome::Continue;
            }
            if state.boss.waves_done >= state.tuning.boss_waves {
                enter_phase(state, BossPhase::ChargeAttacks);
                state.boss.charge_step = ChargeStep::Aiming;
                state.boss.next_action_tick = now + secs_to_ticks(state.tuning.charge_windup_secs);
                return BossOutcome::Continue;
            }
            emit_ring(state);
            state.boss.waves_done += 1;
        }
        BossPhase::ChargeAttacks => update_charge(state),
        BossPhase::FinalBurst => {
            if state.boss_projectiles_alive() > 0 {
                return BossOutcome::Continue;
            }
            emit_ring(state);
            let pos = state.boss.pos;
            let radius = state.tuning.final_explosion_radius;
            state.explosions.push(Explosion {
                pos,
                radius,
                kind: ExplosionKind::BossFinale,
                start_tick: now,
                ttl_ticks: secs_to_ticks(state.tuning.explosion_secs * 2.0),
            });
            state.events.push(GameEvent::Explosion {
                pos,
                radius,
                destroyed: 0,
            });
            enter_phase(state, BossPhase::Done);
            state.boss.next_action_tick = now + secs_to_ticks(state.tuning.boss_done_secs);
        }
        BossPhase::Done => {
            if now >= state.boss.next_action_tick {
                finish_encounter(state);
                return BossOutcome::Finished;
            }
        }
    }

    BossOutcome::Continue
}

fn update_charge(state: &mut GameState) {
    let now = state.time_ticks;
    let limit = state.tuning.boss_charges;

    match state.boss.charge_step {
        ChargeStep::Aiming => {
            if now < state.boss.next_action_tick {
                return;
            }
            if state.boss.charges_done >= limit {
                enter_phase(state, BossPhase::FinalBurst);
                return;
            }
            let boss = &mut state.boss;
            boss.dir = safe_direction(state.player.pos - boss.pos, boss.dir);
            boss.speed = state.tuning.charge_speed;
            boss.charge_step = ChargeStep::Charging;
        }
        ChargeStep::Charging => {
            let size = state.arena_size();
            let boss = &mut state.boss;
            let before = boss.pos;
            let next = before + boss.dir * boss.speed * SIM_DT;
            boss.pos = clamp_to_arena(next, boss.radius, size);

            // A wall already touched at the start slides the boss along it;
            // pinned in a corner counts as a hit
            let normal = match wall_normal(before, next, boss.radius, size) {
                Some(normal) => normal,
                None if boss.pos.distance_squared(before) <= WALL_EPS * WALL_EPS => {
                    safe_direction(-boss.dir, Vec2::X)
                }
                None => return,
            };
            boss.speed = 0.0;
            boss.charge_step = ChargeStep::Confused;
            boss.next_action_tick = now + secs_to_ticks(state.tuning.confusion_secs);
            let charge = boss.charges_done + 1;
            log::debug!("Boss charge {charge} hit wall at tick {now}");
            state.events.push(GameEvent::BossWallHit { charge });
            shed_shards(state, normal);
        }
        ChargeStep::Confused => {
            if now < state.boss.next_action_tick {
                return;
            }
            state.boss.charges_done += 1;
            state.boss.charge_step = ChargeStep::Aiming;
            state.boss.next_action_tick = now + secs_to_ticks(state.tuning.charge_windup_secs);
            if state.boss.charges_done >= limit {
                enter_phase(state, BossPhase::FinalBurst);
            }
        }
    }
}

/// Combined inward normal of every wall the circle reached on a move from
/// `before` to `after`. Walls it was already touching do not count.
fn wall_normal(before: Vec2, after: Vec2, radius: f32, size: Vec2) -> Option<Vec2> {
    let walls = [
        (before.x - radius > WALL_EPS && after.x - radius <= 0.0, Vec2::X),
        (before.x + radius < size.x - WALL_EPS && after.x + radius >= size.x, Vec2::NEG_X),
        (before.y - radius > WALL_EPS && after.y - radius <= 0.0, Vec2::Y),
        (before.y + radius < size.y - WALL_EPS && after.y + radius >= size.y, Vec2::NEG_Y),
    ];
    let normal = walls
        .iter()
        .filter(|(hit, _)| *hit)
        .fold(Vec2::ZERO, |acc, (_, n)| acc + *n);
    (normal != Vec2::ZERO).then(|| safe_direction(normal, Vec2::X))
}

/// Radial ring of wave projectiles around the boss
fn emit_ring(state: &mut GameState) {
    let count = state.tuning.projectiles_per_wave.max(1);
    let wave_jitter = state.tuning.wave_angle_jitter.abs();
    let shot_jitter = state.tuning.projectile_angle_jitter.abs();
    let base = state.rng.random_range(-wave_jitter..=wave_jitter);
    let size = state.arena_size();

    for k in 0..count {
        let angle = base + TAU * k as f32 / count as f32 + state.rng.random_range(-shot_jitter..=shot_jitter);
        let dir = direction_from_angle(angle);
        let id = state.ids.next();
        state.hostiles.push(Hostile::projectile(
            id,
            clamp_to_arena(
                state.boss.pos + dir * state.boss.radius,
                state.tuning.projectile_radius,
                size,
            ),
            dir,
            state.tuning.projectile_speed,
            state.tuning.projectile_radius,
            ProjectileKind::Wave,
        ));
    }
}

/// Fan of bouncing shards thrown off the wall after a charge impact
fn shed_shards(state: &mut GameState, normal: Vec2) {
    const SPREAD: f32 = 0.6;
    let count = state.tuning.charge_shards;
    let base_angle = normal.y.atan2(normal.x);
    let ttl = secs_to_ticks(state.tuning.shard_lifetime_secs) as u32;

    for k in 0..count {
        let offset = if count > 1 {
            -SPREAD + 2.0 * SPREAD * k as f32 / (count - 1) as f32
        } else {
            0.0
        };
        let id = state.ids.next();
        let mut shard = Hostile::projectile(
            id,
            state.boss.pos,
            direction_from_angle(base_angle + offset),
            state.tuning.shard_speed,
            state.tuning.projectile_radius,
            ProjectileKind::Charge,
        );
        shard.ttl_ticks = Some(ttl);
        state.hostiles.push(shard);
    }
}

/// Tear the encounter down and step up to the next level
pub fn finish_encounter(state: &mut GameState) {
    // Whatever the boss left behind goes with it
    state.hostiles.retain(|h| !h.is_boss_projectile());
    state.boss.active = false;
    enter_phase(state, BossPhase::Idle);

    state.level += 1;
    state.spawner.start_level(state.score);
    state
        .difficulty
        .apply_level_transition(state.score, state.time_ticks, state.tuning.level_factor);
    propagate_base_speed(state);
    state.events.push(GameEvent::LevelUp { level: state.level });
    log::info!(
        "Level {} begins at score {} (base speed {:.1})",
        state.level,
        state.score,
        state.difficulty.base_speed
    );
}
