//! Damage magnitudes carried by a single hit.
//!
//! `DamageSpec` is the editable, serializable form found in weapon and hazard
//! definitions. `DamageContainer` is the frozen snapshot a status effect
//! carries from the moment of the hit until it resolves.

use serde::{Deserialize, Serialize};

/// Editable damage block as authored in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageSpec {
    /// Health damage.
    pub damage: i32,
    /// Poise damage.
    pub poise_damage: i32,
    /// Knockback impulse magnitude.
    pub knockback: i32,
    /// Poison ticks to apply.
    pub poison: i32,
    /// Burn magnitude (not wired).
    pub burn: i32,
    /// Bleed magnitude (not wired).
    pub bleed: i32,
    /// Blind magnitude (not wired).
    pub blind: i32,
    /// Launch impulse magnitude.
    pub launch_power: i32,
    /// Time spent airborne after a launch (seconds).
    pub launch_hang_time: f32,
    /// Knockdown impulse magnitude.
    pub knock_down_power: i32,
    /// Time spent on the ground after a knockdown (seconds).
    pub knock_down_time: f32,
}

/// Immutable bundle of every magnitude describing one hit.
///
/// Built once per hit and never mutated; `Copy` so the resolver and the
/// status effect can each hold it without sharing a borrow.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DamageContainer {
    damage: i32,
    poise_damage: i32,
    knockback: i32,
    poison: i32,
    burn: i32,
    bleed: i32,
    blind: i32,
    launch_power: i32,
    launch_hang_time: f32,
    knock_down_power: i32,
    knock_down_time: f32,
}

impl DamageContainer {
    /// Freezes a damage spec into a container.
    #[must_use]
    pub const fn new(spec: &DamageSpec) -> Self {
        Self {
            damage: spec.damage,
            poise_damage: spec.poise_damage,
            knockback: spec.knockback,
            poison: spec.poison,
            burn: spec.burn,
            bleed: spec.bleed,
            blind: spec.blind,
            launch_power: spec.launch_power,
            launch_hang_time: spec.launch_hang_time,
            knock_down_power: spec.knock_down_power,
            knock_down_time: spec.knock_down_time,
        }
    }

    /// Container that does nothing when resolved.
    #[must_use]
    pub const fn empty() -> Self {
        Self::new(&DamageSpec {
            damage: 0,
            poise_damage: 0,
            knockback: 0,
            poison: 0,
            burn: 0,
            bleed: 0,
            blind: 0,
            launch_power: 0,
            launch_hang_time: 0.0,
            knock_down_power: 0,
            knock_down_time: 0.0,
        })
    }

    /// Health damage.
    #[must_use]
    pub const fn damage(&self) -> i32 {
        self.damage
    }

    /// Poise damage.
    #[must_use]
    pub const fn poise_damage(&self) -> i32 {
        self.poise_damage
    }

    /// Knockback impulse magnitude.
    #[must_use]
    pub const fn knockback(&self) -> i32 {
        self.knockback
    }

    /// Poison ticks.
    #[must_use]
    pub const fn poison(&self) -> i32 {
        self.poison
    }

    /// Burn magnitude.
    #[must_use]
    pub const fn burn(&self) -> i32 {
        self.burn
    }

    /// Bleed magnitude.
    #[must_use]
    pub const fn bleed(&self) -> i32 {
        self.bleed
    }

    /// Blind magnitude.
    #[must_use]
    pub const fn blind(&self) -> i32 {
        self.blind
    }

    /// Launch impulse magnitude.
    #[must_use]
    pub const fn launch_power(&self) -> i32 {
        self.launch_power
    }

    /// Launch hang time as authored (may be degenerate).
    #[must_use]
    pub const fn launch_hang_time(&self) -> f32 {
        self.launch_hang_time
    }

    /// Knockdown impulse magnitude.
    #[must_use]
    pub const fn knock_down_power(&self) -> i32 {
        self.knock_down_power
    }

    /// Knockdown time as authored (may be degenerate).
    #[must_use]
    pub const fn knock_down_time(&self) -> f32 {
        self.knock_down_time
    }

    /// Returns true if resolving this container would change anything.
    #[must_use]
    pub const fn has_effect(&self) -> bool {
        self.damage > 0
            || self.poise_damage > 0
            || self.knockback > 0
            || self.poison > 0
            || self.launch_power > 0
            || self.knock_down_power > 0
    }
}

impl From<DamageSpec> for DamageContainer {
    fn from(spec: DamageSpec) -> Self {
        Self::new(&spec)
    }
}

/// Clamps a degenerate duration to a small positive epsilon.
///
/// Hang and knockdown times feed a `1 / t` speed modifier, so anything at or
/// below zero is replaced by `epsilon`.
#[must_use]
pub fn sanitize_duration(value: f32, epsilon: f32) -> f32 {
    if value <= 0.0 || value.is_nan() {
        epsilon
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_copies_spec() {
        let spec = DamageSpec {
            damage: 12,
            poise_damage: 30,
            launch_power: 20,
            launch_hang_time: 0.4,
            ..Default::default()
        };
        let container = DamageContainer::from(spec);
        assert_eq!(container.damage(), 12);
        assert_eq!(container.poise_damage(), 30);
        assert_eq!(container.launch_power(), 20);
        assert!((container.launch_hang_time() - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn test_empty_container_has_no_effect() {
        assert!(!DamageContainer::empty().has_effect());
        let spec = DamageSpec {
            knockback: 1,
            ..Default::default()
        };
        assert!(DamageContainer::from(spec).has_effect());
    }

    #[test]
    fn test_sanitize_duration() {
        assert!((sanitize_duration(0.0, 0.001) - 0.001).abs() < f32::EPSILON);
        assert!((sanitize_duration(-2.0, 0.001) - 0.001).abs() < f32::EPSILON);
        assert!((sanitize_duration(f32::NAN, 0.001) - 0.001).abs() < f32::EPSILON);
        assert!((sanitize_duration(0.5, 0.001) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_spec_parses_with_defaults() {
        let spec: DamageSpec = toml::from_str("damage = 8\nknockback = 3").unwrap();
        assert_eq!(spec.damage, 8);
        assert_eq!(spec.knockback, 3);
        assert_eq!(spec.poison, 0);
    }
}
