//! Per-target status effect scheduler.
//!
//! Effects never enter or leave the active list while it is being iterated.
//! Adds go through `pending_add` and are promoted at the start of the next
//! update; finished effects are collected in `pending_remove` and dropped
//! after the tick loop.

use tracing::trace;

use super::effect::{EffectTarget, EffectType, StatusEffect, TickScope};

/// What happened to an effect handed to [`StatusEffectManager::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Folded into an existing instance of the same type.
    Merged,
    /// Resolved synchronously and already finished.
    Resolved,
    /// Queued for promotion on the next update.
    Queued,
    /// Target is dead; dropped.
    Refused,
}

/// Owns the status effects of one destructible entity.
#[derive(Debug, Clone, Default)]
pub struct StatusEffectManager {
    active: Vec<StatusEffect>,
    pending_add: Vec<StatusEffect>,
    pending_remove: Vec<usize>,
}

impl StatusEffectManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Active effects.
    #[must_use]
    pub fn active(&self) -> &[StatusEffect] {
        &self.active
    }

    /// Effects waiting for promotion.
    #[must_use]
    pub fn pending(&self) -> &[StatusEffect] {
        &self.pending_add
    }

    /// Active instances of one type.
    #[must_use]
    pub fn count(&self, effect_type: EffectType) -> usize {
        self.active
            .iter()
            .filter(|e| e.effect_type() == effect_type)
            .count()
    }

    /// True if an instance of the type is active or pending.
    #[must_use]
    pub fn has(&self, effect_type: EffectType) -> bool {
        self.active
            .iter()
            .chain(&self.pending_add)
            .any(|e| e.effect_type() == effect_type)
    }

    /// Adds an effect.
    ///
    /// Non-stackable effects merge into an existing active or pending
    /// instance of the same type. Immediate effects tick once right away and
    /// are only queued if ticks remain.
    pub fn add(
        &mut self,
        mut effect: StatusEffect,
        target: &mut EffectTarget<'_>,
        scope: &mut TickScope<'_, '_>,
    ) -> AddOutcome {
        if target.vitals.is_destroyed() {
            trace!("Dropped {:?} on dead {}", effect.effect_type(), target.id);
            return AddOutcome::Refused;
        }
        if !effect.can_stack() {
            let existing = self
                .active
                .iter_mut()
                .chain(self.pending_add.iter_mut())
                .find(|e| e.effect_type() == effect.effect_type() && !e.is_done());
            if let Some(existing) = existing {
                existing.merge(&effect);
                return AddOutcome::Merged;
            }
        }

        if effect.is_immediate() {
            let mut spawned = Vec::new();
            effect.start(scope);
            effect.fire(target, scope, &mut spawned);
            self.add_all(spawned, target, scope);
            if effect.is_done() {
                return AddOutcome::Resolved;
            }
            // Already started; goes straight to the active list.
            self.active.push(effect);
            return AddOutcome::Queued;
        }

        trace!("Queued {:?} on {}", effect.effect_type(), target.id);
        self.pending_add.push(effect);
        AddOutcome::Queued
    }

    fn add_all(
        &mut self,
        effects: Vec<StatusEffect>,
        target: &mut EffectTarget<'_>,
        scope: &mut TickScope<'_, '_>,
    ) {
        for effect in effects {
            self.add(effect, target, scope);
        }
    }

    /// Promotes pending effects, ticks every active effect and removes the
    /// finished ones.
    pub fn update(&mut self, dt: f32, target: &mut EffectTarget<'_>, scope: &mut TickScope<'_, '_>) {
        for mut effect in std::mem::take(&mut self.pending_add) {
            effect.start(scope);
            self.active.push(effect);
        }

        let mut spawned = Vec::new();
        for (i, effect) in self.active.iter_mut().enumerate() {
            effect.advance(dt, target, scope, &mut spawned);
            if effect.is_done() {
                self.pending_remove.push(i);
            }
        }
        self.commit_removals();
        self.add_all(spawned, target, scope);
    }

    /// Fires every active effect of one type immediately.
    pub fn force_tick(
        &mut self,
        effect_type: EffectType,
        target: &mut EffectTarget<'_>,
        scope: &mut TickScope<'_, '_>,
    ) {
        let mut spawned = Vec::new();
        for (i, effect) in self.active.iter_mut().enumerate() {
            if effect.effect_type() != effect_type {
                continue;
            }
            effect.fire(target, scope, &mut spawned);
            if effect.is_done() {
                self.pending_remove.push(i);
            }
        }
        self.commit_removals();
        self.add_all(spawned, target, scope);
    }

    fn commit_removals(&mut self) {
        self.pending_remove.sort_unstable();
        self.pending_remove.dedup();
        for i in self.pending_remove.drain(..).rev() {
            let effect = self.active.remove(i);
            trace!("Removed {:?} from {}", effect.effect_type(), effect.target());
        }
    }

    /// Drops every effect without resolving it.
    pub fn clear(&mut self) {
        self.active.clear();
        self.pending_add.clear();
        self.pending_remove.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CombatTuning;
    use crate::damage::DamageSpec;
    use crate::direction::DirectionPolicies;
    use crate::events::CombatEvent;
    use crate::motion::Motion;
    use crate::sandbox::{RecordingFeedback, RecordingPresentation, StaticDirectory};
    use crate::services::{Services, Signal};
    use crate::stats::{Vitals, VitalsConfig};
    use crate::status::HitSource;
    use brawl_common::{EntityId, Vec2};

    struct Rig {
        directory: StaticDirectory,
        presentation: RecordingPresentation,
        feedback: RecordingFeedback,
        tuning: CombatTuning,
        vitals: Vitals,
        motion: Motion,
        manager: StatusEffectManager,
        events: Vec<CombatEvent>,
        target: EntityId,
    }

    impl Rig {
        fn new() -> Self {
            let target = EntityId::from_raw(21);
            let mut directory = StaticDirectory::default();
            directory.place(target, Vec2::ZERO, Vec2::X);
            let tuning = CombatTuning::default();
            Self {
                directory,
                presentation: RecordingPresentation::default(),
                feedback: RecordingFeedback::default(),
                vitals: Vitals::new(&VitalsConfig::default(), &tuning),
                motion: Motion::new(true),
                manager: StatusEffectManager::new(),
                events: Vec::new(),
                tuning,
                target,
            }
        }

        fn hit(&self) -> HitSource {
            HitSource {
                origin: None,
                source: None,
                target: self.target,
                external_dir: Vec2::ZERO,
            }
        }

        fn packet(&self, damage: i32, delay: f32) -> StatusEffect {
            let spec = DamageSpec {
                damage,
                ..Default::default()
            };
            StatusEffect::damage_packet(
                &self.directory,
                self.hit(),
                spec.into(),
                DirectionPolicies::default(),
                delay,
            )
        }

        fn with<R>(
            &mut self,
            f: impl FnOnce(&mut StatusEffectManager, &mut EffectTarget<'_>, &mut TickScope<'_, '_>) -> R,
        ) -> R {
            let mut services = Services::new(&mut self.presentation, &mut self.feedback);
            let mut scope = TickScope {
                directory: &self.directory,
                services: &mut services,
                tuning: &self.tuning,
                events: &mut self.events,
            };
            let mut target = EffectTarget {
                id: self.target,
                vitals: &mut self.vitals,
                motion: &mut self.motion,
            };
            f(&mut self.manager, &mut target, &mut scope)
        }

        fn add(&mut self, effect: StatusEffect) -> AddOutcome {
            self.with(|m, t, s| m.add(effect, t, s))
        }

        fn update(&mut self, dt: f32) {
            self.with(|m, t, s| m.update(dt, t, s));
        }
    }

    #[test]
    fn test_immediate_single_tick_never_enters_active() {
        let mut rig = Rig::new();
        let effect = rig.packet(10, -1.0);
        assert_eq!(rig.add(effect), AddOutcome::Resolved);
        assert!(rig.manager.active().is_empty());
        assert!(rig.manager.pending().is_empty());
        assert!((rig.vitals.health() - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_dead_target_refuses_effects() {
        let mut rig = Rig::new();
        let lethal = rig.packet(500, -1.0);
        assert_eq!(rig.add(lethal), AddOutcome::Resolved);
        assert!(rig.vitals.is_destroyed());

        let late = rig.packet(10, 0.5);
        assert_eq!(rig.add(late), AddOutcome::Refused);
        assert!(rig.manager.pending().is_empty());
        assert!(rig.manager.active().is_empty());
    }

    #[test]
    fn test_delayed_packet_waits() {
        let mut rig = Rig::new();
        let effect = rig.packet(10, 0.5);
        assert_eq!(rig.add(effect), AddOutcome::Queued);
        assert_eq!(rig.manager.pending().len(), 1);

        rig.update(0.25);
        assert_eq!(rig.manager.active().len(), 1);
        assert!((rig.vitals.health() - 100.0).abs() < 1e-6);

        rig.update(0.25);
        assert!(rig.manager.active().is_empty());
        assert!((rig.vitals.health() - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_delay_resolves_on_first_update() {
        let mut rig = Rig::new();
        let effect = rig.packet(10, 0.0);
        rig.add(effect);
        rig.update(0.016);
        assert!((rig.vitals.health() - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_packets_stack() {
        let mut rig = Rig::new();
        for _ in 0..3 {
            let effect = rig.packet(5, 1.0);
            rig.add(effect);
        }
        rig.update(0.0);
        assert_eq!(rig.manager.count(EffectType::DamagePacket), 3);
    }

    #[test]
    fn test_non_stackable_merges_against_pending_and_active() {
        let mut rig = Rig::new();
        let first = StatusEffect::wet(&rig.directory, rig.hit(), 3.0);
        let second = StatusEffect::wet(&rig.directory, rig.hit(), 3.0);
        assert_eq!(rig.add(first), AddOutcome::Queued);
        assert_eq!(rig.add(second), AddOutcome::Merged);

        rig.update(0.1);
        let third = StatusEffect::wet(&rig.directory, rig.hit(), 3.0);
        assert_eq!(rig.add(third), AddOutcome::Merged);
        assert_eq!(rig.manager.count(EffectType::Wet), 1);
    }

    #[test]
    fn test_wet_signals_on_and_off() {
        let mut rig = Rig::new();
        let wet = StatusEffect::wet(&rig.directory, rig.hit(), 1.0);
        rig.add(wet);
        rig.update(0.1);
        assert_eq!(rig.presentation.last_bool(rig.target, Signal::Wet), Some(true));

        rig.update(1.0);
        assert_eq!(rig.presentation.last_bool(rig.target, Signal::Wet), Some(false));
        assert!(!rig.manager.has(EffectType::Wet));
    }

    #[test]
    fn test_poison_spawned_by_packet() {
        let mut rig = Rig::new();
        let spec = DamageSpec {
            poison: 3,
            ..Default::default()
        };
        let effect = StatusEffect::damage_packet(
            &rig.directory,
            rig.hit(),
            spec.into(),
            DirectionPolicies::default(),
            -1.0,
        );
        rig.add(effect);
        assert!(rig.manager.has(EffectType::Poison));

        for _ in 0..40 {
            rig.update(0.1);
        }
        assert!(!rig.manager.has(EffectType::Poison));
        assert!((rig.vitals.health() - 97.0).abs() < 1e-4);
    }

    #[test]
    fn test_force_tick() {
        let mut rig = Rig::new();
        let poison = StatusEffect::poison(&rig.directory, rig.hit(), 2, 10.0);
        rig.add(poison);
        rig.update(0.0);
        rig.with(|m, t, s| m.force_tick(EffectType::Poison, t, s));
        assert!((rig.vitals.health() - 99.0).abs() < 1e-6);
        assert_eq!(rig.manager.count(EffectType::Poison), 1);
        rig.with(|m, t, s| m.force_tick(EffectType::Poison, t, s));
        assert_eq!(rig.manager.count(EffectType::Poison), 0);
    }
}
