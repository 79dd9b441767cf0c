//! Per-tick view of the simulation for a presentation layer
//!
//! The core never draws. A view layer captures a `FrameSnapshot` after each
//! tick (or serializes it to JSON) and renders from that copy.

use glam::Vec2;
use serde::Serialize;

use crate::sim::{
    BossPhase, EffectKind, ExplosionKind, GamePhase, GameState, PickupKind, ProjectileKind,
    TelegraphTarget, Variant,
};

#[derive(Debug, Clone, Serialize)]
pub struct HostileView {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub variant: Variant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projectile: Option<ProjectileKind>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TelegraphView {
    pub pos: Vec2,
    /// Current pulsing indicator radius
    pub radius: f32,
    pub target: TelegraphTarget,
}

#[derive(Debug, Clone, Serialize)]
pub struct PickupView {
    pub pos: Vec2,
    pub radius: f32,
    pub kind: PickupKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExplosionView {
    pub pos: Vec2,
    pub radius: f32,
    pub kind: ExplosionKind,
    /// 0 at detonation, 1 when finished
    pub progress: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct BossView {
    pub pos: Vec2,
    pub radius: f32,
    pub phase: BossPhase,
    pub laughing: bool,
    pub confused: bool,
}

/// Everything a view layer needs to draw one frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot {
    pub tick: u64,
    pub phase: GamePhase,
    pub score: u64,
    pub lives: u8,
    pub level: u32,
    pub arena: Vec2,
    pub player: Vec2,
    pub player_radius: f32,
    pub hostiles: Vec<HostileView>,
    pub telegraphs: Vec<TelegraphView>,
    pub pickups: Vec<PickupView>,
    pub explosions: Vec<ExplosionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boss: Option<BossView>,
    pub boss_banner: bool,
    pub time_slow: bool,
    pub recovering: bool,
    pub invulnerable: bool,
}

impl FrameSnapshot {
    pub fn capture(state: &GameState) -> Self {
        let now = state.time_ticks;

        let hostiles = state
            .hostiles
            .iter()
            .map(|h| HostileView {
                id: h.id,
                pos: h.pos,
                radius: h.radius,
                variant: h.variant,
                projectile: h.projectile,
            })
            .collect();

        let telegraphs = state
            .telegraphs
            .iter()
            .map(|t| TelegraphView {
                pos: t.pos,
                radius: t.indicator_radius.max(0.0),
                target: t.target,
            })
            .collect();

        let pickups = state
            .pickups
            .iter()
            .map(|p| PickupView {
                pos: p.pos,
                radius: p.radius,
                kind: p.kind,
            })
            .collect();

        let explosions = state
            .explosions
            .iter()
            .map(|e| ExplosionView {
                pos: e.pos,
                radius: e.radius,
                kind: e.kind,
                progress: e.progress(now),
            })
            .collect();

        let boss = state.boss.active.then(|| BossView {
            pos: state.boss.pos,
            radius: state.boss.radius,
            phase: state.boss.phase,
            laughing: state.boss.is_laughing(now),
            confused: state.boss.is_confused(),
        });

        Self {
            tick: now,
            phase: state.phase,
            score: state.score,
            lives: state.player.lives,
            level: state.level,
            arena: state.arena_size(),
            player: state.player.pos,
            player_radius: state.player.radius,
            hostiles,
            telegraphs,
            pickups,
            explosions,
            boss,
            boss_banner: state.banner_until.is_some(),
            time_slow: state.effects.is_active(EffectKind::TimeSlow),
            recovering: state.effects.is_active(EffectKind::DamageRecovery),
            invulnerable: state.is_invulnerable(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
