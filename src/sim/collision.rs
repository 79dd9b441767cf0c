//! Movement and collision resolution
//!
//! Per tick: pursuer separation, movement with wall response, player contact
//! (damage, knockback, run end), then pickup collection. All displacement is
//! scaled by the combined status-effect factor.

use glam::Vec2;

use super::boss::{BossPhase, ChargeStep};
use super::effects::EffectKind;
use super::state::{
    Explosion, ExplosionKind, GameEvent, GamePhase, GameState, Hostile, PickupKind,
    ProjectileKind, Variant,
};
use crate::consts::SIM_DT;
use crate::{clamp_to_arena, safe_direction, secs_to_ticks};

/// Result of resolving player contacts for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    /// Nothing touched the player (or only knockback-only contacts)
    Clear,
    /// A life point was lost
    Hit,
    /// The last life point was lost
    RunEnded,
}

/// Whether two circles overlap (touching does not count)
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance(b) < ra + rb
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Reflect a heading off any arena wall the circle touches and clamp it inside.
/// Returns true if a wall was touched.
pub fn bounce_off_walls(pos: &mut Vec2, dir: &mut Vec2, radius: f32, size: Vec2) -> bool {
    let mut touched = false;
    let walls = [
        (pos.x <= radius, Vec2::X),
        (pos.x >= size.x - radius, Vec2::NEG_X),
        (pos.y <= radius, Vec2::Y),
        (pos.y >= size.y - radius, Vec2::NEG_Y),
    ];
    for (hit, normal) in walls {
        if !hit {
            continue;
        }
        touched = true;
        // Only reflect when heading into the wall, or we'd flip back out of it
        if dir.dot(normal) < 0.0 {
            *dir = reflect_velocity(*dir, normal);
        }
    }
    *pos = clamp_to_arena(*pos, radius, size);
    touched
}

/// Push overlapping pursuers apart, half the overlap each
pub fn separate_pursuers(hostiles: &mut [Hostile]) {
    let is_pursuer = |h: &Hostile| h.variant == Variant::Pursuer && !h.is_boss_projectile();
    for i in 0..hostiles.len() {
        if !is_pursuer(&hostiles[i]) {
            continue;
        }
        for j in (i + 1)..hostiles.len() {
            if !is_pursuer(&hostiles[j]) {
                continue;
            }
            let delta = hostiles[j].pos - hostiles[i].pos;
            let overlap = hostiles[i].radius + hostiles[j].radius - delta.length();
            if overlap <= 0.0 {
                continue;
            }
            let push = safe_direction(delta, Vec2::X) * (overlap * 0.5);
            hostiles[i].pos -= push;
            hostiles[j].pos += push;
        }
    }
}

/// Advance every hostile one tick
pub fn move_hostiles(state: &mut GameState) {
    let factor = state.effects.combined_factor();
    let size = state.arena_size();
    let target = state.player.pos;

    state.hostiles.retain_mut(|h| {
        if h.variant == Variant::Pursuer && !h.is_boss_projectile() {
            h.dir = safe_direction(target - h.pos, h.dir);
        }
        h.pos += h.dir * h.speed * factor * SIM_DT;

        if let Some(ttl) = h.ttl_ticks.as_mut() {
            *ttl = ttl.saturating_sub(1);
            if *ttl == 0 {
                return false;
            }
        }

        match h.variant {
            Variant::Pursuer => {
                h.pos = clamp_to_arena(h.pos, h.radius, size);
                true
            }
            Variant::Wanderer => {
                let touched = bounce_off_walls(&mut h.pos, &mut h.dir, h.radius, size);
                !(touched && h.projectile == Some(ProjectileKind::Wave))
            }
        }
    });
}

/// Displace every hostile away from the player by the knockback magnitude
pub fn apply_knockback(state: &mut GameState) {
    let player = state.player.pos;
    let size = state.arena_size();
    let magnitude = state.tuning.knockback;
    for h in &mut state.hostiles {
        let away = safe_direction(h.pos - player, Vec2::Y);
        h.pos = clamp_to_arena(h.pos + away * magnitude, h.radius, size);
    }
    state.events.push(GameEvent::Knockback);
}

/// Resolve hostile (and boss body) contacts with the player
pub fn resolve_player_contacts(state: &mut GameState) -> ContactOutcome {
    let player_pos = state.player.pos;
    let player_radius = state.player.radius;
    let mut outcome = ContactOutcome::Clear;

    // A charging boss body only repels
    if state.boss.active
        && state.boss.charge_step == ChargeStep::Charging
        && state.boss.phase == BossPhase::ChargeAttacks
        && circles_overlap(state.boss.pos, state.boss.radius, player_pos, player_radius)
    {
        apply_knockback(state);
    }

    let mut i = 0;
    while i < state.hostiles.len() {
        let hostile = &state.hostiles[i];
        if !circles_overlap(hostile.pos, hostile.radius, player_pos, player_radius) {
            i += 1;
            continue;
        }

        if hostile.projectile == Some(ProjectileKind::Charge) {
            apply_knockback(state);
            i += 1;
            continue;
        }

        if state.is_invulnerable() {
            i += 1;
            continue;
        }

        state.hostiles.remove(i);

        if state.player.lives <= 1 {
            state.player.lives = 0;
            state.phase = GamePhase::GameOver;
            state.events.push(GameEvent::RunEnded { score: state.score });
            log::info!("Run ended at score {} (level {})", state.score, state.level);
            return ContactOutcome::RunEnded;
        }

        let now = state.time_ticks;
        let duration = secs_to_ticks(state.tuning.damage_effect_secs);
        state.player.lives -= 1;
        state.player.invulnerable_until = now + duration;
        state.effects.activate(
            EffectKind::DamageRecovery,
            now,
            duration,
            state.tuning.damage_slow_factor,
        );
        state.events.push(GameEvent::PlayerHit {
            lives_left: state.player.lives,
        });
        log::debug!("Player hit, {} lives left", state.player.lives);
        apply_knockback(state);
        outcome = ContactOutcome::Hit;
        // Index now points at the next hostile
    }

    outcome
}

/// Register an explosion and destroy every hostile whose center lies inside it.
/// Returns the number destroyed.
pub fn detonate(state: &mut GameState, pos: Vec2, radius: f32, kind: ExplosionKind) -> u32 {
    let before = state.hostiles.len();
    let mut regular_kills = 0;
    state.hostiles.retain(|h| {
        let inside = h.pos.distance(pos) <= radius;
        if inside && !h.is_boss_projectile() {
            regular_kills += 1;
        }
        !inside
    });
    let destroyed = (before - state.hostiles.len()) as u32;

    if kind == ExplosionKind::Bomb {
        state.spawner.bomb_kills += regular_kills;
    }
    state.explosions.push(Explosion {
        pos,
        radius,
        kind,
        start_tick: state.time_ticks,
        ttl_ticks: secs_to_ticks(state.tuning.explosion_secs),
    });
    state.events.push(GameEvent::Explosion {
        pos,
        radius,
        destroyed,
    });
    destroyed
}

/// Apply the effect of every pickup the player is touching
pub fn collect_pickups(state: &mut GameState) {
    let player_pos = state.player.pos;
    let player_radius = state.player.radius;
    let (taken, remaining): (Vec<_>, Vec<_>) = std::mem::take(&mut state.pickups)
        .into_iter()
        .partition(|p| circles_overlap(p.pos, p.radius, player_pos, player_radius));
    state.pickups = remaining;

    for pickup in taken {
        match pickup.kind {
            PickupKind::Heart => {
                state.player.lives = state.player.lives.saturating_add(1).min(state.tuning.max_lives);
            }
            PickupKind::Bomb => {
                let radius = state.tuning.bomb_radius;
                let destroyed = detonate(state, pickup.pos, radius, ExplosionKind::Bomb);
                log::debug!("Bomb destroyed {destroyed} hostile(s)");
            }
            PickupKind::Hourglass => {
                let secs = state.tuning.time_slow_secs * state.abilities.time_warp_multiplier();
                state.effects.activate(
                    EffectKind::TimeSlow,
                    state.time_ticks,
                    secs_to_ticks(secs),
                    state.tuning.time_slow_factor,
                );
            }
        }
        state.events.push(GameEvent::PickupCollected { kind: pickup.kind });
    }
}

/// Full movement and collision pass for one tick
pub fn resolve(state: &mut GameState) -> ContactOutcome {
    separate_pursuers(&mut state.hostiles);
    move_hostiles(state);

    let outcome = resolve_player_contacts(state);
    if outcome == ContactOutcome::RunEnded {
        return outcome;
    }

    collect_pickups(state);
    outcome
}
