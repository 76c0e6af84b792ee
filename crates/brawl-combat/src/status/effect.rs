//! Status effects: delayed or repeating applications to one target.

use brawl_common::{EntityId, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::config::CombatTuning;
use crate::damage::{sanitize_duration, DamageContainer};
use crate::direction::{DirectionContext, DirectionPolicies, KnockbackType, Snapshot};
use crate::events::CombatEvent;
use crate::motion::Motion;
use crate::services::{EntityDirectory, InteractionType, Services, Signal};
use crate::stats::Vitals;

/// Kind of status effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectType {
    /// One resolved hit.
    DamagePacket,
    /// Damage over time.
    Poison,
    /// Not wired yet.
    Burn,
    /// Not wired yet.
    Bleed,
    /// Not wired yet.
    Blind,
    /// Soaked; signals the presentation layer while active.
    Wet,
}

/// Where a status effect came from and where it lands.
#[derive(Debug, Clone, Copy)]
pub struct HitSource {
    /// Root cause (the fighter who threw the fireball).
    pub origin: Option<EntityId>,
    /// Proximate cause (the fireball).
    pub source: Option<EntityId>,
    /// Entity receiving the effect.
    pub target: EntityId,
    /// Direction for `ExternalDir` policies.
    pub external_dir: Vec2,
}

/// Mutable state of the entity an effect is applied to.
pub struct EffectTarget<'a> {
    /// Target entity.
    pub id: EntityId,
    /// Target stat economy.
    pub vitals: &'a mut Vitals,
    /// Target impulses and posture.
    pub motion: &'a mut Motion,
}

/// Collaborators available while an effect ticks.
pub struct TickScope<'a, 'b> {
    /// Entity lookups.
    pub directory: &'a dyn EntityDirectory,
    /// Presentation and feedback.
    pub services: &'a mut Services<'b>,
    /// Simulation constants.
    pub tuning: &'a CombatTuning,
    /// Events produced by ticking.
    pub events: &'a mut Vec<CombatEvent>,
}

/// A scheduled application of damage or behavior to one target.
#[derive(Debug, Clone)]
pub struct StatusEffect {
    effect_type: EffectType,
    damage: DamageContainer,
    ticks_remaining: i32,
    time_per_tick: f32,
    current_tick_timer: f32,
    can_stack: bool,
    policies: DirectionPolicies,
    direction: DirectionContext,
    done: bool,
}

impl StatusEffect {
    fn base(
        effect_type: EffectType,
        directory: &dyn EntityDirectory,
        hit: HitSource,
        ticks: i32,
        time_per_tick: f32,
    ) -> Self {
        let snapshot = Snapshot::capture(directory, hit.origin, hit.source, hit.target);
        Self {
            effect_type,
            damage: DamageContainer::empty(),
            ticks_remaining: ticks,
            time_per_tick,
            current_tick_timer: time_per_tick,
            can_stack: false,
            policies: DirectionPolicies::default(),
            direction: DirectionContext {
                origin: hit.origin,
                source: hit.source,
                target: hit.target,
                snapshot,
                external: hit.external_dir,
            },
            done: false,
        }
    }

    /// One resolved hit, applied after `delay` seconds.
    ///
    /// A negative delay resolves synchronously when added to the manager.
    #[must_use]
    pub fn damage_packet(
        directory: &dyn EntityDirectory,
        hit: HitSource,
        damage: DamageContainer,
        policies: DirectionPolicies,
        delay: f32,
    ) -> Self {
        let mut effect = Self::base(EffectType::DamagePacket, directory, hit, 1, delay);
        effect.damage = damage;
        effect.policies = policies;
        effect.can_stack = true;
        effect
    }

    /// Poison dealing damage once per `interval` for `ticks` ticks.
    #[must_use]
    pub fn poison(directory: &dyn EntityDirectory, hit: HitSource, ticks: i32, interval: f32) -> Self {
        Self::base(EffectType::Poison, directory, hit, ticks, interval)
    }

    /// Wet status lasting `duration` seconds.
    #[must_use]
    pub fn wet(directory: &dyn EntityDirectory, hit: HitSource, duration: f32) -> Self {
        Self::base(EffectType::Wet, directory, hit, 1, duration)
    }

    /// Burn, bleed or blind. These hold their slot and expire without effect.
    #[must_use]
    pub fn placeholder(
        effect_type: EffectType,
        directory: &dyn EntityDirectory,
        hit: HitSource,
        ticks: i32,
        interval: f32,
    ) -> Self {
        Self::base(effect_type, directory, hit, ticks, interval)
    }

    // === Accessors ===

    /// Effect kind.
    #[must_use]
    pub fn effect_type(&self) -> EffectType {
        self.effect_type
    }

    /// Root cause, if it was known.
    #[must_use]
    pub fn origin(&self) -> Option<EntityId> {
        self.direction.origin
    }

    /// Proximate cause, if it was known.
    #[must_use]
    pub fn source(&self) -> Option<EntityId> {
        self.direction.source
    }

    /// Target entity.
    #[must_use]
    pub fn target(&self) -> EntityId {
        self.direction.target
    }

    /// Magnitudes carried.
    #[must_use]
    pub fn damage(&self) -> &DamageContainer {
        &self.damage
    }

    /// Placement captured at creation.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.direction.snapshot
    }

    /// Ticks left.
    #[must_use]
    pub fn ticks_remaining(&self) -> i32 {
        self.ticks_remaining
    }

    /// Seconds between ticks; negative resolves on add.
    #[must_use]
    pub fn time_per_tick(&self) -> f32 {
        self.time_per_tick
    }

    /// Seconds until the next tick.
    #[must_use]
    pub fn current_tick_timer(&self) -> f32 {
        self.current_tick_timer
    }

    /// True if instances of this effect coexist instead of merging.
    #[must_use]
    pub fn can_stack(&self) -> bool {
        self.can_stack
    }

    /// True if this effect resolves synchronously on add.
    #[must_use]
    pub fn is_immediate(&self) -> bool {
        self.time_per_tick < 0.0
    }

    /// True once every tick has fired.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Seconds until the last tick fires.
    #[must_use]
    pub fn remaining_duration(&self) -> f32 {
        if self.done {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let later = (self.ticks_remaining - 1).max(0) as f32;
        self.current_tick_timer.max(0.0) + later * self.time_per_tick.max(0.0)
    }

    // === Lifecycle ===

    /// Folds a second instance of the same non-stackable type into this one.
    pub fn merge(&mut self, incoming: &Self) {
        match self.effect_type {
            EffectType::Wet => {
                self.ticks_remaining = incoming.ticks_remaining;
                self.time_per_tick = incoming.time_per_tick;
                self.current_tick_timer = incoming.current_tick_timer;
            },
            EffectType::Poison => {
                if incoming.remaining_duration() > self.remaining_duration() {
                    self.ticks_remaining = incoming.ticks_remaining;
                    self.time_per_tick = incoming.time_per_tick;
                    self.current_tick_timer = incoming.current_tick_timer;
                    self.direction = incoming.direction;
                }
            },
            EffectType::DamagePacket | EffectType::Burn | EffectType::Bleed | EffectType::Blind => {},
        }
        trace!(
            "Merged {:?} on {}: {} ticks left",
            self.effect_type,
            self.target(),
            self.ticks_remaining
        );
    }

    /// Called once when the effect becomes active.
    pub fn start(&mut self, scope: &mut TickScope<'_, '_>) {
        if self.effect_type == EffectType::Wet {
            scope
                .services
                .presentation
                .set_bool(self.target(), Signal::Wet, true);
        }
        scope.events.push(CombatEvent::EffectApplied {
            target: self.target(),
            effect: self.effect_type,
        });
    }

    /// Advances the tick timer, firing when it lapses.
    pub fn advance(
        &mut self,
        dt: f32,
        target: &mut EffectTarget<'_>,
        scope: &mut TickScope<'_, '_>,
        spawned: &mut Vec<StatusEffect>,
    ) {
        if self.done {
            return;
        }
        self.current_tick_timer -= dt;
        if self.current_tick_timer <= 0.0 {
            self.fire(target, scope, spawned);
        }
    }

    /// Fires one tick now, resets the timer and counts the tick down.
    pub fn fire(
        &mut self,
        target: &mut EffectTarget<'_>,
        scope: &mut TickScope<'_, '_>,
        spawned: &mut Vec<StatusEffect>,
    ) {
        if self.done {
            return;
        }
        self.tick(target, scope, spawned);
        self.current_tick_timer = self.time_per_tick;
        self.ticks_remaining -= 1;
        if self.ticks_remaining < 1 {
            self.done = true;
            self.expire(scope);
        }
    }

    fn expire(&mut self, scope: &mut TickScope<'_, '_>) {
        if self.effect_type == EffectType::Wet {
            scope
                .services
                .presentation
                .set_bool(self.target(), Signal::Wet, false);
        }
    }

    fn tick(
        &mut self,
        target: &mut EffectTarget<'_>,
        scope: &mut TickScope<'_, '_>,
        spawned: &mut Vec<StatusEffect>,
    ) {
        trace!("{:?} tick on {}", self.effect_type, target.id);
        match self.effect_type {
            EffectType::DamagePacket => self.resolve_damage_packet(target, scope, spawned),
            EffectType::Poison => {
                self.play(InteractionType::Poison, scope);
                target
                    .vitals
                    .apply_damage(scope.tuning.status.poison_damage, self.origin());
            },
            EffectType::Burn | EffectType::Bleed | EffectType::Blind | EffectType::Wet => {},
        }
    }

    fn play(&self, kind: InteractionType, scope: &mut TickScope<'_, '_>) {
        let directory = scope.directory;
        let Some(table) = directory.interactions(self.target()) else {
            return;
        };
        let position = directory
            .transform(self.target())
            .map_or(self.snapshot().target.position, |t| t.position);
        let direction = self.direction.resolve(self.policies.particle, directory);
        table.play(kind, position, direction, scope.services.feedback);
    }

    fn resolve(&self, policy: KnockbackType, scope: &TickScope<'_, '_>) -> Vec2 {
        self.direction.resolve(policy, scope.directory)
    }

    #[allow(clippy::cast_precision_loss)]
    fn resolve_damage_packet(
        &self,
        target: &mut EffectTarget<'_>,
        scope: &mut TickScope<'_, '_>,
        spawned: &mut Vec<StatusEffect>,
    ) {
        let dmg = self.damage;
        self.play(InteractionType::Hit, scope);

        if dmg.damage() > 0 {
            target.vitals.apply_damage(dmg.damage() as f32, self.origin());
        }

        if dmg.poise_damage() > 0 {
            target.vitals.apply_poise_damage(dmg.poise_damage() as f32);
        }

        if dmg.knockback() > 0 {
            let dir = self.resolve(self.policies.knockback, scope);
            target.motion.push(dir * dmg.knockback() as f32);
        }

        if dmg.launch_power() > 0 {
            let dir = self.resolve(self.policies.launch, scope);
            target.motion.push(dir * dmg.launch_power() as f32);
            if target.motion.has_heavy_receiver() {
                let hang = sanitize_duration(dmg.launch_hang_time(), scope.tuning.timing.epsilon);
                target.motion.launch(hang);
                let presentation = &mut *scope.services.presentation;
                presentation.set_float(target.id, Signal::LaunchSpeed, 1.0 / hang);
                presentation.trigger(target.id, Signal::Launch);
                self.play(InteractionType::Launch, scope);
                scope.events.push(CombatEvent::Launched {
                    entity: target.id,
                    hang_time: hang,
                });
            } else {
                warn!("Launch on {} without a heavy receiver, impulse only", target.id);
            }
        }

        if dmg.knock_down_power() > 0 {
            let dir = self.resolve(self.policies.knock_down, scope);
            target.motion.push(dir * dmg.knock_down_power() as f32);
            if target.motion.has_heavy_receiver() {
                let time = sanitize_duration(dmg.knock_down_time(), scope.tuning.timing.epsilon);
                target.motion.knock_down(time);
                let presentation = &mut *scope.services.presentation;
                presentation.set_float(target.id, Signal::KnockDownSpeed, 1.0 / time);
                presentation.trigger(target.id, Signal::KnockDown);
                self.play(InteractionType::KnockDown, scope);
                scope.events.push(CombatEvent::KnockedDown {
                    entity: target.id,
                    time,
                });
            } else {
                warn!("Knockdown on {} without a heavy receiver, impulse only", target.id);
            }
        }

        if dmg.poison() > 0 {
            let hit = HitSource {
                origin: self.origin(),
                source: self.source(),
                target: target.id,
                external_dir: self.direction.external,
            };
            spawned.push(Self::poison(
                scope.directory,
                hit,
                dmg.poison(),
                scope.tuning.status.poison_interval,
            ));
        }
        // Burn, bleed and blind magnitudes are carried but not applied yet.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damage::DamageSpec;
    use crate::sandbox::{RecordingFeedback, RecordingPresentation, StaticDirectory};
    use crate::stats::VitalsConfig;

    struct Rig {
        directory: StaticDirectory,
        presentation: RecordingPresentation,
        feedback: RecordingFeedback,
        tuning: CombatTuning,
        vitals: Vitals,
        motion: Motion,
        target: EntityId,
        attacker: EntityId,
    }

    impl Rig {
        fn new(heavy: bool) -> Self {
            let attacker = EntityId::from_raw(10);
            let target = EntityId::from_raw(11);
            let mut directory = StaticDirectory::default();
            directory.place(attacker, Vec2::ZERO, Vec2::X);
            directory.place(target, Vec2::new(2.0, 0.0), Vec2::NEG_X);
            let tuning = CombatTuning::default();
            Self {
                directory,
                presentation: RecordingPresentation::default(),
                feedback: RecordingFeedback::default(),
                vitals: Vitals::new(&VitalsConfig::default(), &tuning),
                motion: Motion::new(heavy),
                tuning,
                target,
                attacker,
            }
        }

        fn hit(&self) -> HitSource {
            HitSource {
                origin: Some(self.attacker),
                source: Some(self.attacker),
                target: self.target,
                external_dir: Vec2::ZERO,
            }
        }

        fn packet(&self, spec: DamageSpec) -> StatusEffect {
            StatusEffect::damage_packet(
                &self.directory,
                self.hit(),
                spec.into(),
                DirectionPolicies::default(),
                -1.0,
            )
        }

        fn fire(&mut self, effect: &mut StatusEffect) -> (Vec<StatusEffect>, Vec<CombatEvent>) {
            let mut spawned = Vec::new();
            let mut events = Vec::new();
            let mut services = Services::new(&mut self.presentation, &mut self.feedback);
            let mut scope = TickScope {
                directory: &self.directory,
                services: &mut services,
                tuning: &self.tuning,
                events: &mut events,
            };
            let mut target = EffectTarget {
                id: self.target,
                vitals: &mut self.vitals,
                motion: &mut self.motion,
            };
            effect.fire(&mut target, &mut scope, &mut spawned);
            (spawned, events)
        }
    }

    #[test]
    fn test_damage_packet_applies_in_order() {
        let mut rig = Rig::new(true);
        let mut effect = rig.packet(DamageSpec {
            damage: 15,
            poise_damage: 20,
            knockback: 3,
            poison: 4,
            ..Default::default()
        });
        let (spawned, _) = rig.fire(&mut effect);

        assert!(effect.is_done());
        assert!((rig.vitals.health() - 85.0).abs() < 1e-6);
        assert!((rig.vitals.poise_damage() - 20.0).abs() < 1e-6);
        assert_eq!(rig.motion.pending_impulse(), Vec2::new(3.0, 0.0));
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].effect_type(), EffectType::Poison);
        assert_eq!(spawned[0].ticks_remaining(), 4);
    }

    #[test]
    fn test_zero_hang_time_uses_epsilon() {
        let mut rig = Rig::new(true);
        let mut effect = rig.packet(DamageSpec {
            launch_power: 20,
            launch_hang_time: 0.0,
            ..Default::default()
        });
        let (_, events) = rig.fire(&mut effect);

        let speed = rig
            .presentation
            .last_float(rig.target, Signal::LaunchSpeed)
            .unwrap();
        assert!(speed.is_finite());
        assert!((speed - 1000.0).abs() < 1.0);
        assert!(rig.presentation.was_triggered(rig.target, Signal::Launch));
        assert!(events.contains(&CombatEvent::Launched {
            entity: rig.target,
            hang_time: 0.001
        }));
    }

    #[test]
    fn test_launch_without_heavy_receiver_is_impulse_only() {
        let mut rig = Rig::new(false);
        let mut effect = rig.packet(DamageSpec {
            launch_power: 20,
            knock_down_power: 5,
            knock_down_time: 1.0,
            ..Default::default()
        });
        let (_, events) = rig.fire(&mut effect);

        assert_eq!(rig.motion.pending_impulse(), Vec2::new(25.0, 0.0));
        assert!(!rig.motion.posture().is_disabled());
        assert!(!rig.presentation.was_triggered(rig.target, Signal::Launch));
        assert!(events.is_empty());
    }

    #[test]
    fn test_wet_merge_refreshes() {
        let rig = Rig::new(true);
        let mut wet = StatusEffect::wet(&rig.directory, rig.hit(), 3.0);
        wet.current_tick_timer = 0.5;
        let fresh = StatusEffect::wet(&rig.directory, rig.hit(), 2.0);
        wet.merge(&fresh);
        assert!((wet.current_tick_timer() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_poison_merge_keeps_longer() {
        let rig = Rig::new(true);
        let mut long = StatusEffect::poison(&rig.directory, rig.hit(), 5, 1.0);
        let short = StatusEffect::poison(&rig.directory, rig.hit(), 2, 1.0);
        long.merge(&short);
        assert_eq!(long.ticks_remaining(), 5);

        let mut short = StatusEffect::poison(&rig.directory, rig.hit(), 2, 1.0);
        let long = StatusEffect::poison(&rig.directory, rig.hit(), 5, 1.0);
        short.merge(&long);
        assert_eq!(short.ticks_remaining(), 5);
    }

    #[test]
    fn test_poison_ticks_damage() {
        let mut rig = Rig::new(true);
        let mut poison = StatusEffect::poison(&rig.directory, rig.hit(), 2, 1.0);
        rig.fire(&mut poison);
        assert!(!poison.is_done());
        rig.fire(&mut poison);
        assert!(poison.is_done());
        assert!((rig.vitals.health() - 98.0).abs() < 1e-6);
    }
}
