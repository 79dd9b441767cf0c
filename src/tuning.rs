//! Data-driven game balance
//!
//! Every gameplay constant lives in [`Tuning`] so that balance changes never
//! touch simulation code. Partial JSON files override only the fields they name.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::secs_to_ticks;

/// Errors raised while loading a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed tuning JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Score milestones at which a pickup kind is telegraphed
///
/// First at `first`, second at `second`, then every `interval` points after `second`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickupMilestones {
    pub first: u64,
    pub second: u64,
    pub interval: u64,
}

impl PickupMilestones {
    /// Score of the milestone with the given index (0-based)
    pub fn score_at(&self, index: u32, interval_scale: f32) -> u64 {
        match index {
            0 => self.first,
            1 => self.second,
            n => {
                let interval = ((self.interval as f32 * interval_scale).round() as u64).max(1);
                self.second + interval * (n as u64 - 1)
            }
        }
    }
}

/// Highest level the upgrade system can hand us for any ability
pub const MAX_ABILITY_LEVEL: u8 = 5;

/// Leveled modifiers owned by the external upgrade system
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abilities {
    /// Extends the hourglass slow by 10% per level
    pub time_warp: u8,
    /// Shortens the repeating pickup interval by 5% per level
    pub pickup_cooldown: u8,
}

impl Abilities {
    /// Multiplier applied to the hourglass slow duration
    pub fn time_warp_multiplier(&self) -> f32 {
        1.0 + 0.1 * self.time_warp.min(MAX_ABILITY_LEVEL) as f32
    }

    /// Multiplier applied to the repeating pickup interval
    pub fn pickup_interval_scale(&self) -> f32 {
        (1.0 - 0.05 * self.pickup_cooldown.min(MAX_ABILITY_LEVEL) as f32).max(0.5)
    }
}

/// Game balance parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Arena ===
    pub arena_width: f32,
    pub arena_height: f32,
    pub player_radius: f32,
    pub starting_lives: u8,
    pub max_lives: u8,

    // === Hostiles ===
    pub hostile_radius: f32,
    /// Relative score per additional expected hostile
    pub score_per_hostile: u64,
    /// Score from which pursuers may spawn
    pub pursuer_unlock_score: u64,
    /// Chance that an unlocked telegraph becomes a pursuer
    pub pursuer_chance: f32,

    // === Telegraphs ===
    pub telegraph_secs: f32,
    pub pulse_min_radius: f32,
    pub pulse_max_radius: f32,
    /// Indicator growth speed (units per second)
    pub pulse_speed: f32,

    // === Pickups ===
    pub pickup_radius: f32,
    pub heart_milestones: PickupMilestones,
    pub bomb_milestones: PickupMilestones,
    pub hourglass_milestones: PickupMilestones,
    pub bomb_radius: f32,
    pub explosion_secs: f32,

    // === Status effects ===
    pub time_slow_factor: f32,
    pub time_slow_secs: f32,
    pub damage_slow_factor: f32,
    pub damage_effect_secs: f32,
    pub knockback: f32,

    // === Score timer ===
    pub score_interval_secs: f32,
    pub min_score_interval_secs: f32,
    /// Multiplier (< 1) applied to the score interval on each acceleration
    pub score_interval_accel: f32,
    /// Time between score interval accelerations
    pub score_accel_period_secs: f32,

    // === Speed progression ===
    /// Wanderer speed at run start (units per second); pursuers move at half
    pub base_speed: f32,
    pub max_base_speed: f32,
    /// Score gained between speed bumps
    pub speed_step_score: u64,
    /// Multiplier (> 1) of the first speed bump
    pub speed_accel: f32,
    /// How quickly later bumps shrink
    pub speed_easing: f32,

    // === Boss ===
    /// Level-relative score that triggers the boss
    pub boss_threshold: u64,
    /// Score window before the trigger in which speed bumps are suppressed
    pub boss_pre_zone: u64,
    pub boss_banner_secs: f32,
    pub boss_radius: f32,
    pub boss_intro_secs: f32,
    pub boss_laugh_secs: f32,
    pub boss_waves: u32,
    pub projectiles_per_wave: u32,
    pub projectile_speed: f32,
    pub projectile_radius: f32,
    /// Max random rotation of a whole wave (radians)
    pub wave_angle_jitter: f32,
    /// Max random rotation of a single projectile (radians)
    pub projectile_angle_jitter: f32,
    pub boss_charges: u32,
    pub charge_speed: f32,
    pub charge_windup_secs: f32,
    pub confusion_secs: f32,
    /// Shards shed on each charge wall impact
    pub charge_shards: u32,
    pub shard_speed: f32,
    pub shard_lifetime_secs: f32,
    pub final_explosion_radius: f32,
    pub boss_done_secs: f32,
    /// Permanent speed and score-rate multiplier applied after the boss
    pub level_factor: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            // Arena
            arena_width: 800.0,
            arena_height: 600.0,
            player_radius: 10.0,
            starting_lives: 3,
            max_lives: 5,

            // Hostiles
            hostile_radius: 12.0,
            score_per_hostile: 20,
            pursuer_unlock_score: 150,
            pursuer_chance: 0.3,

            // Telegraphs
            telegraph_secs: 1.0,
            pulse_min_radius: 6.0,
            pulse_max_radius: 18.0,
            pulse_speed: 40.0,

            // Pickups
            pickup_radius: 14.0,
            heart_milestones: PickupMilestones {
                first: 200,
                second: 500,
                interval: 600,
            },
            bomb_milestones: PickupMilestones {
                first: 300,
                second: 700,
                interval: 600,
            },
            hourglass_milestones: PickupMilestones {
                first: 400,
                second: 800,
                interval: 600,
            },
            bomb_radius: 150.0,
            explosion_secs: 0.6,

            // Status effects
            time_slow_factor: 0.4,
            time_slow_secs: 5.0,
            damage_slow_factor: 0.05,
            damage_effect_secs: 1.5,
            knockback: 80.0,

            // Score timer
            score_interval_secs: 0.1,
            min_score_interval_secs: 0.04,
            score_interval_accel: 0.95,
            score_accel_period_secs: 10.0,

            // Speed progression
            base_speed: 120.0,
            max_base_speed: 420.0,
            speed_step_score: 50,
            speed_accel: 1.05,
            speed_easing: 0.1,

            // Boss
            boss_threshold: 1000,
            boss_pre_zone: 100,
            boss_banner_secs: 3.0,
            boss_radius: 40.0,
            boss_intro_secs: 2.0,
            boss_laugh_secs: 1.5,
            boss_waves: 4,
            projectiles_per_wave: 16,
            projectile_speed: 180.0,
            projectile_radius: 8.0,
            wave_angle_jitter: 0.3,
            projectile_angle_jitter: 0.05,
            boss_charges: 4,
            charge_speed: 600.0,
            charge_windup_secs: 0.5,
            confusion_secs: 1.2,
            charge_shards: 3,
            shard_speed: 200.0,
            shard_lifetime_secs: 3.0,
            final_explosion_radius: 300.0,
            boss_done_secs: 3.0,
            level_factor: 1.25,
        }
    }
}

impl Tuning {
    /// Parse and validate a (possibly partial) JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load a tuning file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        fn check(ok: bool, field: &'static str, reason: &'static str) -> Result<(), TuningError> {
            if ok {
                Ok(())
            } else {
                Err(TuningError::Invalid { field, reason })
            }
        }

        check(self.arena_width > 0.0, "arena_width", "must be positive")?;
        check(self.arena_height > 0.0, "arena_height", "must be positive")?;
        check(self.player_radius > 0.0, "player_radius", "must be positive")?;
        check(self.hostile_radius > 0.0, "hostile_radius", "must be positive")?;
        check(self.pickup_radius > 0.0, "pickup_radius", "must be positive")?;
        check(self.projectile_radius > 0.0, "projectile_radius", "must be positive")?;
        check(self.boss_radius > 0.0, "boss_radius", "must be positive")?;
        check(self.projectile_speed > 0.0, "projectile_speed", "must be positive")?;
        check(self.charge_speed > 0.0, "charge_speed", "must be positive")?;
        check(self.shard_speed > 0.0, "shard_speed", "must be positive")?;
        check(self.starting_lives > 0, "starting_lives", "must be at least 1")?;
        check(
            self.max_lives >= self.starting_lives,
            "max_lives",
            "must be at least starting_lives",
        )?;
        check(self.score_per_hostile > 0, "score_per_hostile", "must be positive")?;
        check(
            (0.0..=1.0).contains(&self.pursuer_chance),
            "pursuer_chance",
            "must be within [0, 1]",
        )?;
        check(
            self.pulse_min_radius >= 0.0 && self.pulse_max_radius >= self.pulse_min_radius,
            "pulse_max_radius",
            "must be at least pulse_min_radius",
        )?;
        check(
            self.time_slow_factor > 0.0 && self.time_slow_factor <= 1.0,
            "time_slow_factor",
            "must be within (0, 1]",
        )?;
        check(
            self.damage_slow_factor > 0.0 && self.damage_slow_factor <= 1.0,
            "damage_slow_factor",
            "must be within (0, 1]",
        )?;
        check(
            self.score_interval_secs > 0.0 && self.min_score_interval_secs > 0.0,
            "score_interval_secs",
            "must be positive",
        )?;
        check(
            self.score_interval_accel > 0.0 && self.score_interval_accel < 1.0,
            "score_interval_accel",
            "must be within (0, 1)",
        )?;
        check(self.speed_accel >= 1.0, "speed_accel", "must be at least 1")?;
        check(self.speed_step_score > 0, "speed_step_score", "must be positive")?;
        check(self.level_factor >= 1.0, "level_factor", "must be at least 1")?;
        check(
            self.boss_pre_zone <= self.boss_threshold,
            "boss_pre_zone",
            "must not exceed boss_threshold",
        )?;
        for (field, m) in [
            ("heart_milestones", &self.heart_milestones),
            ("bomb_milestones", &self.bomb_milestones),
            ("hourglass_milestones", &self.hourglass_milestones),
        ] {
            check(
                m.first < m.second && m.interval > 0,
                field,
                "must be increasing with a positive interval",
            )?;
        }
        Ok(())
    }

    /// Telegraph delay in ticks
    pub fn telegraph_ticks(&self) -> u64 {
        secs_to_ticks(self.telegraph_secs)
    }

    /// Score at which the pre-boss breather starts, relative to the level start
    pub fn pre_zone_start(&self) -> u64 {
        self.boss_threshold.saturating_sub(self.boss_pre_zone)
    }
}
