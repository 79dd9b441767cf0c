//! Time-boxed speed modifiers
//!
//! Effects expire lazily: `expire` runs once at the start of each tick, so an
//! elapsed effect still counts for the tick in which it elapsed and is gone
//! from the next one.

use serde::{Deserialize, Serialize};

/// Status effect slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    /// Hourglass pickup
    TimeSlow,
    /// Heavy slow after taking damage
    DamageRecovery,
}

/// A single timed multiplicative modifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub active: bool,
    pub start_tick: u64,
    pub duration_ticks: u64,
    pub factor: f32,
}

impl Default for StatusEffect {
    fn default() -> Self {
        Self {
            active: false,
            start_tick: 0,
            duration_ticks: 0,
            factor: 1.0,
        }
    }
}

impl StatusEffect {
    fn elapsed(&self, now: u64) -> bool {
        now.saturating_sub(self.start_tick) >= self.duration_ticks
    }
}

/// Active power-up and damage effects
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusEffects {
    pub time_slow: StatusEffect,
    pub damage_recovery: StatusEffect,
}

impl StatusEffects {
    fn slot(&self, kind: EffectKind) -> &StatusEffect {
        match kind {
            EffectKind::TimeSlow => &self.time_slow,
            EffectKind::DamageRecovery => &self.damage_recovery,
        }
    }

    fn slot_mut(&mut self, kind: EffectKind) -> &mut StatusEffect {
        match kind {
            EffectKind::TimeSlow => &mut self.time_slow,
            EffectKind::DamageRecovery => &mut self.damage_recovery,
        }
    }

    /// Start (or restart) an effect's timer
    pub fn activate(&mut self, kind: EffectKind, now: u64, duration_ticks: u64, factor: f32) {
        *self.slot_mut(kind) = StatusEffect {
            active: true,
            start_tick: now,
            duration_ticks,
            factor: factor.clamp(0.0, 1.0),
        };
    }

    pub fn is_active(&self, kind: EffectKind) -> bool {
        self.slot(kind).active
    }

    /// Ticks until an effect ends (0 when inactive)
    pub fn remaining_ticks(&self, kind: EffectKind, now: u64) -> u64 {
        let effect = self.slot(kind);
        if !effect.active {
            return 0;
        }
        (effect.start_tick + effect.duration_ticks).saturating_sub(now)
    }

    /// Deactivate elapsed effects, returning the ones that just ended
    pub fn expire(&mut self, now: u64) -> Vec<EffectKind> {
        let mut ended = Vec::new();
        for kind in [EffectKind::TimeSlow, EffectKind::DamageRecovery] {
            let effect = self.slot_mut(kind);
            if effect.active && effect.elapsed(now) {
                effect.active = false;
                ended.push(kind);
            }
        }
        ended
    }

    /// Speed multiplier for every entity: the most restrictive active factor
    pub fn combined_factor(&self) -> f32 {
        [self.time_slow, self.damage_recovery]
            .iter()
            .filter(|e| e.active)
            .map(|e| e.factor)
            .fold(1.0, f32::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_factor_takes_minimum() {
        let mut effects = StatusEffects::default();
        assert_eq!(effects.combined_factor(), 1.0);

        effects.activate(EffectKind::TimeSlow, 0, 300, 0.4);
        assert_eq!(effects.combined_factor(), 0.4);

        effects.activate(EffectKind::DamageRecovery, 10, 90, 0.05);
        assert_eq!(effects.combined_factor(), 0.05);

        // Recovery ends, hourglass still running
        effects.expire(100);
        assert!(!effects.is_active(EffectKind::DamageRecovery));
        assert_eq!(effects.combined_factor(), 0.4);
    }

    #[test]
    fn test_expiry_is_lazy() {
        let mut effects = StatusEffects::default();
        effects.activate(EffectKind::TimeSlow, 0, 60, 0.4);

        assert!(effects.expire(59).is_empty());
        assert!(effects.is_active(EffectKind::TimeSlow));
        assert_eq!(effects.remaining_ticks(EffectKind::TimeSlow, 59), 1);

        assert_eq!(effects.expire(60), vec![EffectKind::TimeSlow]);
        assert!(!effects.is_active(EffectKind::TimeSlow));
        assert_eq!(effects.combined_factor(), 1.0);
    }

    #[test]
    fn test_activate_restarts_timer() {
        let mut effects = StatusEffects::default();
        effects.activate(EffectKind::TimeSlow, 0, 60, 0.4);
        effects.activate(EffectKind::TimeSlow, 50, 60, 0.4);

        assert!(effects.expire(100).is_empty());
        assert_eq!(effects.expire(110), vec![EffectKind::TimeSlow]);
    }
}
