//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod boss;
pub mod clock;
pub mod collision;
pub mod difficulty;
pub mod effects;
pub mod spawn;
pub mod state;
pub mod tick;

pub use boss::{BossOutcome, BossPhase, BossState, ChargeStep};
pub use clock::FrameClock;
pub use collision::{ContactOutcome, circles_overlap, reflect_velocity};
pub use difficulty::{DifficultyState, ScoreTimer};
pub use effects::{EffectKind, StatusEffect, StatusEffects};
pub use spawn::SpawnScheduler;
pub use state::{
    EntityIds, Explosion, ExplosionKind, GameEvent, GamePhase, GameState, Hostile, Pickup,
    PickupKind, Player, ProjectileKind, Telegraph, TelegraphTarget, Variant,
};
pub use tick::{TickInput, tick};
