//! Orb Dodge - an arcade avoidance game simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, movement, collisions, boss fight)
//! - `tuning`: Data-driven game balance and ability levels
//! - `highscores`: Score store boundary and leaderboard
//! - `snapshot`: Per-tick view of the simulation for a presentation layer

pub mod highscores;
pub mod sim;
pub mod snapshot;
pub mod tuning;

pub use highscores::{HighScores, ScoreStore, StoreError};
pub use snapshot::FrameSnapshot;
pub use tuning::{Abilities, Tuning, TuningError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Simulation tick rate (display refresh)
    pub const SIM_HZ: u32 = 60;
    /// Fixed simulation timestep
    pub const SIM_DT: f32 = 1.0 / SIM_HZ as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame the clock will account for (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;
}

/// Convert a duration in seconds to whole simulation ticks (at least one)
#[inline]
pub fn secs_to_ticks(secs: f32) -> u64 {
    ((secs * consts::SIM_HZ as f32).round() as u64).max(1)
}

/// Unit vector along `v`, or `fallback` when `v` has no usable length
#[inline]
pub fn safe_direction(v: Vec2, fallback: Vec2) -> Vec2 {
    v.try_normalize().unwrap_or(fallback)
}

/// Clamp a circle's center so the circle stays inside a `size` arena
#[inline]
pub fn clamp_to_arena(pos: Vec2, radius: f32, size: Vec2) -> Vec2 {
    let r = radius.max(0.0);
    Vec2::new(
        pos.x.clamp(r.min(size.x / 2.0), (size.x - r).max(size.x / 2.0)),
        pos.y.clamp(r.min(size.y / 2.0), (size.y - r).max(size.y / 2.0)),
    )
}

/// Unit vector for an angle in radians
#[inline]
pub fn direction_from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}
