//! Health, stamina, mana and poise arithmetic.
//!
//! Every setter clamps and records the new value in an outbox that the owning
//! combatant flushes to the presentation layer. Death and stagger are
//! one-shot transitions: death is latched by the `destroyed` flag checked by
//! every mutator, and stagger resets poise damage and opens an immunity
//! window during which poise damage is discarded.

use brawl_common::EntityId;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::{CombatTuning, ConfigError, ConfigResult, StaminaPolicy};
use crate::services::Signal;

use super::regen::RegenTrack;

/// A stat that can be pushed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stat {
    /// Current health.
    Health,
    /// Current stamina.
    Stamina,
    /// Current mana.
    Mana,
    /// Accumulated poise damage.
    PoiseDamage,
}

impl Stat {
    /// Presentation signal carrying this stat.
    #[must_use]
    pub const fn signal(self) -> Signal {
        match self {
            Self::Health => Signal::Health,
            Self::Stamina => Signal::Stamina,
            Self::Mana => Signal::Mana,
            Self::PoiseDamage => Signal::PoiseDamage,
        }
    }
}

/// Something observers need to hear about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VitalEvent {
    /// A stat took a new value.
    Changed {
        /// Which stat.
        stat: Stat,
        /// Its new value.
        value: f32,
    },
    /// Health reached zero.
    Died {
        /// Entity credited with the killing blow, if known.
        killer: Option<EntityId>,
    },
    /// Poise damage reached the resistance ceiling.
    Staggered,
}

/// Per-fighter stat maxima.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalsConfig {
    /// Maximum health.
    pub max_health: f32,
    /// Maximum stamina.
    pub max_stamina: f32,
    /// Maximum mana.
    pub max_mana: f32,
    /// Poise damage needed to stagger.
    pub poise_resistance: f32,
    /// Health band ceilings for the regen ladder.
    pub health_thresholds: Vec<f32>,
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            max_stamina: 100.0,
            max_mana: 50.0,
            poise_resistance: 100.0,
            health_thresholds: Vec::new(),
        }
    }
}

impl VitalsConfig {
    /// Validates the maxima.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_health <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "max_health must be positive, got {}",
                self.max_health
            )));
        }
        if self.max_stamina < 0.0 || self.max_mana < 0.0 || self.poise_resistance < 0.0 {
            return Err(ConfigError::Validation(
                "stamina, mana and poise resistance cannot be negative".to_string(),
            ));
        }
        if let Some(t) = self
            .health_thresholds
            .iter()
            .find(|t| !t.is_finite() || **t <= 0.0 || **t > self.max_health)
        {
            return Err(ConfigError::Validation(format!(
                "health threshold {t} outside (0, {}]",
                self.max_health
            )));
        }
        Ok(())
    }
}

/// Stat economy of one destructible entity.
#[derive(Debug, Clone)]
pub struct Vitals {
    health: f32,
    max_health: f32,
    stamina: f32,
    max_stamina: f32,
    mana: f32,
    max_mana: f32,
    poise_damage: f32,
    poise_resistance: f32,
    thresholds: Vec<f32>,
    health_regen: RegenTrack,
    stamina_regen: RegenTrack,
    mana_regen: RegenTrack,
    poise_regen: RegenTrack,
    stagger_immunity: f32,
    stagger_immunity_duration: f32,
    stamina_policy: StaminaPolicy,
    destroyed: bool,
    gating_dropped: bool,
    outbox: Vec<VitalEvent>,
}

impl Vitals {
    /// Creates full stats from a fighter config.
    ///
    /// Negative maxima and resistance are floored at zero so the clamping
    /// setters always see a valid range.
    #[must_use]
    pub fn new(config: &VitalsConfig, tuning: &CombatTuning) -> Self {
        let mut thresholds = config.health_thresholds.clone();
        thresholds.sort_by(f32::total_cmp);
        thresholds.dedup();
        let max_health = config.max_health.max(0.0);
        let max_stamina = config.max_stamina.max(0.0);
        let max_mana = config.max_mana.max(0.0);
        Self {
            health: max_health,
            max_health,
            stamina: max_stamina,
            max_stamina,
            mana: max_mana,
            max_mana,
            poise_damage: 0.0,
            poise_resistance: config.poise_resistance.max(0.0),
            thresholds,
            health_regen: RegenTrack::new(tuning.vitals.health),
            stamina_regen: RegenTrack::new(tuning.vitals.stamina),
            mana_regen: RegenTrack::new(tuning.vitals.mana),
            poise_regen: RegenTrack::new(tuning.vitals.poise),
            stagger_immunity: 0.0,
            stagger_immunity_duration: tuning.vitals.stagger_immunity,
            stamina_policy: tuning.stamina_policy,
            destroyed: false,
            gating_dropped: false,
            outbox: Vec::new(),
        }
    }

    // === Accessors ===

    /// Current health.
    #[must_use]
    pub fn health(&self) -> f32 {
        self.health
    }

    /// Maximum health.
    #[must_use]
    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Current stamina.
    #[must_use]
    pub fn stamina(&self) -> f32 {
        self.stamina
    }

    /// Maximum stamina.
    #[must_use]
    pub fn max_stamina(&self) -> f32 {
        self.max_stamina
    }

    /// Current mana.
    #[must_use]
    pub fn mana(&self) -> f32 {
        self.mana
    }

    /// Maximum mana.
    #[must_use]
    pub fn max_mana(&self) -> f32 {
        self.max_mana
    }

    /// Accumulated poise damage.
    #[must_use]
    pub fn poise_damage(&self) -> f32 {
        self.poise_damage
    }

    /// Poise damage needed to stagger.
    #[must_use]
    pub fn poise_resistance(&self) -> f32 {
        self.poise_resistance
    }

    /// Remaining stagger immunity (seconds).
    #[must_use]
    pub fn stagger_immunity(&self) -> f32 {
        self.stagger_immunity
    }

    /// True while poise damage is being ignored.
    #[must_use]
    pub fn is_poise_immune(&self) -> bool {
        self.stagger_immunity > 0.0
    }

    /// True once health has reached zero.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Sorted health thresholds.
    #[must_use]
    pub fn thresholds(&self) -> &[f32] {
        &self.thresholds
    }

    /// Ceiling health regen stops at: the lowest threshold at or above
    /// current health, or max health when none is.
    #[must_use]
    pub fn health_ceiling(&self) -> f32 {
        self.thresholds
            .iter()
            .copied()
            .find(|t| *t >= self.health)
            .unwrap_or(self.max_health)
            .min(self.max_health)
    }

    // === Setters ===

    /// Sets health, clamped to `[0, max]`; reaching zero kills once.
    pub fn set_health(&mut self, value: f32) {
        self.set_health_by(value, None);
    }

    fn set_health_by(&mut self, value: f32, killer: Option<EntityId>) {
        if self.destroyed {
            return;
        }
        let value = value.clamp(0.0, self.max_health);
        self.write(Stat::Health, value);
        if self.health <= 0.0 {
            self.destroyed = true;
            debug!("Vitals died (killer: {:?})", killer);
            self.outbox.push(VitalEvent::Died { killer });
        }
    }

    /// Sets stamina under the configured stamina policy.
    pub fn set_stamina(&mut self, value: f32) {
        if self.destroyed {
            return;
        }
        let value = match self.stamina_policy {
            StaminaPolicy::Frozen => value.clamp(self.max_stamina, self.max_stamina),
            StaminaPolicy::Clamped => value.clamp(0.0, self.max_stamina),
        };
        self.write(Stat::Stamina, value);
    }

    /// Sets mana, clamped to `[0, max]`.
    pub fn set_mana(&mut self, value: f32) {
        if self.destroyed {
            return;
        }
        self.write(Stat::Mana, value.clamp(0.0, self.max_mana));
    }

    fn set_poise_damage(&mut self, value: f32) {
        let value = value.clamp(0.0, self.poise_resistance);
        self.write(Stat::PoiseDamage, value);
    }

    /// Changes the stagger threshold; current poise damage is left alone.
    pub fn set_poise_resistance(&mut self, value: f32) {
        self.poise_resistance = value.max(0.0);
    }

    #[allow(clippy::float_cmp)]
    fn write(&mut self, stat: Stat, value: f32) {
        let slot = match stat {
            Stat::Health => &mut self.health,
            Stat::Stamina => &mut self.stamina,
            Stat::Mana => &mut self.mana,
            Stat::PoiseDamage => &mut self.poise_damage,
        };
        if *slot == value {
            return;
        }
        let dropped = value < *slot;
        *slot = value;
        if dropped && matches!(stat, Stat::Stamina | Stat::Mana) {
            self.gating_dropped = true;
        }
        self.outbox.push(VitalEvent::Changed { stat, value });
    }

    // === Mutations ===

    /// Applies health damage and suppresses health regen.
    pub fn apply_damage(&mut self, amount: f32, origin: Option<EntityId>) {
        if self.destroyed || amount <= 0.0 {
            return;
        }
        trace!("Vitals took {} damage from {:?}", amount, origin);
        self.health_regen.suppress(false);
        self.set_health_by(self.health - amount, origin);
    }

    /// Restores health up to max.
    pub fn heal(&mut self, amount: f32) {
        if amount > 0.0 {
            self.set_health(self.health + amount);
        }
    }

    /// Applies poise damage. Returns true if this broke poise.
    ///
    /// Ignored entirely while destroyed or inside the immunity window.
    pub fn apply_poise_damage(&mut self, amount: f32) -> bool {
        if self.destroyed || amount <= 0.0 || self.is_poise_immune() {
            return false;
        }
        self.poise_regen.suppress(false);
        let accumulated = self.poise_damage + amount;
        if accumulated >= self.poise_resistance {
            self.set_poise_damage(0.0);
            self.stagger_immunity = self.stagger_immunity_duration;
            debug!("Vitals staggered after {} poise damage", accumulated);
            self.outbox.push(VitalEvent::Staggered);
            return true;
        }
        self.set_poise_damage(accumulated);
        false
    }

    /// Spends stamina. Heavy or over-budget spends use the long delay.
    pub fn spend_stamina(&mut self, amount: f32, heavy: bool) {
        if self.destroyed || amount <= 0.0 {
            return;
        }
        let over_budget = amount > self.stamina;
        self.stamina_regen.suppress(heavy || over_budget);
        self.set_stamina(self.stamina - amount);
    }

    /// Spends mana. Heavy or over-budget spends use the long delay.
    pub fn spend_mana(&mut self, amount: f32, heavy: bool) {
        if self.destroyed || amount <= 0.0 {
            return;
        }
        let over_budget = amount > self.mana;
        self.mana_regen.suppress(heavy || over_budget);
        self.set_mana(self.mana - amount);
    }

    /// Grants mana (hazard hits, pickups).
    pub fn gain_mana(&mut self, amount: f32) {
        if amount > 0.0 {
            self.set_mana(self.mana + amount);
        }
    }

    /// Destroys the entity outright. Repeated calls are no-ops.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.set_health(0.0);
    }

    /// Runs one regeneration step for every stat.
    pub fn regenerate(&mut self, dt: f32) {
        self.stagger_immunity = (self.stagger_immunity - dt).max(0.0);
        if self.destroyed {
            return;
        }

        let gain = self.health_regen.step(dt);
        let ceiling = self.health_ceiling();
        if gain > 0.0 && self.health < ceiling {
            self.set_health((self.health + gain).min(ceiling));
        }

        let gain = self.stamina_regen.step(dt);
        if gain > 0.0 {
            self.set_stamina(self.stamina + gain);
        }

        let gain = self.mana_regen.step(dt);
        if gain > 0.0 {
            self.set_mana(self.mana + gain);
        }

        // Clamp first so a raised resistance does not stretch recovery.
        self.set_poise_damage(self.poise_damage.min(self.poise_resistance));
        let gain = self.poise_regen.step(dt);
        if gain > 0.0 && self.poise_damage > 0.0 {
            self.set_poise_damage(self.poise_damage - gain);
        }
    }

    /// Drains pending events.
    pub fn take_events(&mut self) -> Vec<VitalEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Returns and clears the "a gating resource dropped" flag.
    pub fn take_gating_dropped(&mut self) -> bool {
        std::mem::take(&mut self.gating_dropped)
    }
}
