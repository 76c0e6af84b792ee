//! Frame scheduler owning every combat entity.
//!
//! One `step` runs the phases in a fixed order:
//! 1. weapon sweeps and hit resolution,
//! 2. hazard movement and trigger resolution,
//! 3. status-effect ticks,
//! 4. regeneration, cooldowns, posture and hazard decay timers.
//!
//! Every map is ordered by entity id so iteration, and therefore the order of
//! hits and events, is identical from run to run.

use std::collections::BTreeMap;

use brawl_common::{EntityId, EntityKind, EntityTags, TeamId, Vec2};
use tracing::{debug, info, trace, warn};

use crate::collision::PartPose;
use crate::combatant::{Combatant, FighterConfig};
use crate::config::CombatTuning;
use crate::error::{CombatError, CombatResult};
use crate::events::{CombatEvent, CombatEventBus};
use crate::hazard::{Hazard, HazardState, HazardStats};
use crate::resolver::HitResolution;
use crate::services::{
    EntityDirectory, InteractionTable, InteractionType, PhysicsQuery, Services, Signal, Transform,
};
use crate::stats::Action;
use crate::status::{AddOutcome, StatusEffect, TickScope};
use crate::weapon::{Weapon, WeaponConfig};

// ============================================================================
// Body registry
// ============================================================================

/// Identity and placement of one registered entity.
#[derive(Debug, Clone)]
pub struct Body {
    /// Current transform.
    pub transform: Transform,
    /// Category tags.
    pub tags: EntityTags,
    /// Team.
    pub team: TeamId,
    /// Interaction feedback table.
    pub interactions: InteractionTable,
    /// Dead; still registered but no longer hittable.
    pub destroyed: bool,
}

/// Every entity the world knows about.
#[derive(Debug, Clone, Default)]
pub struct BodyRegistry {
    bodies: BTreeMap<EntityId, Body>,
}

impl BodyRegistry {
    /// Registers a body under `id`.
    pub fn insert(&mut self, id: EntityId, body: Body) {
        self.bodies.insert(id, body);
    }

    /// Unregisters a body.
    pub fn remove(&mut self, id: EntityId) -> Option<Body> {
        self.bodies.remove(&id)
    }

    /// Looks up a body.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    /// True if registered.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.bodies.contains_key(&id)
    }

    /// Number of registered bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// True if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    fn mark_destroyed(&mut self, id: EntityId) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.destroyed = true;
        }
    }

    fn set_position(&mut self, id: EntityId, position: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.transform.position = position;
        }
    }
}

impl EntityDirectory for BodyRegistry {
    fn transform(&self, id: EntityId) -> Option<Transform> {
        self.bodies.get(&id).map(|b| b.transform)
    }

    fn tags(&self, id: EntityId) -> EntityTags {
        self.bodies.get(&id).map_or(EntityTags::empty(), |b| b.tags)
    }

    fn team(&self, id: EntityId) -> Option<TeamId> {
        self.bodies.get(&id).map(|b| b.team)
    }

    fn interactions(&self, id: EntityId) -> Option<&InteractionTable> {
        self.bodies.get(&id).map(|b| &b.interactions)
    }

    fn is_destroyed(&self, id: EntityId) -> bool {
        self.bodies.get(&id).is_some_and(|b| b.destroyed)
    }
}

// ============================================================================
// World
// ============================================================================

/// Owns bodies, combatants, weapons and hazards and steps them per frame.
#[derive(Debug)]
pub struct CombatWorld {
    bodies: BodyRegistry,
    combatants: BTreeMap<EntityId, Combatant>,
    weapons: BTreeMap<EntityId, Weapon>,
    hazards: BTreeMap<EntityId, Hazard>,
    tuning: CombatTuning,
    bus: CombatEventBus,
}

impl CombatWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new(tuning: CombatTuning) -> Self {
        Self::with_bus(tuning, CombatEventBus::default())
    }

    /// Creates an empty world publishing to `bus`.
    #[must_use]
    pub fn with_bus(tuning: CombatTuning, bus: CombatEventBus) -> Self {
        Self {
            bodies: BodyRegistry::default(),
            combatants: BTreeMap::new(),
            weapons: BTreeMap::new(),
            hazards: BTreeMap::new(),
            tuning,
            bus,
        }
    }

    // === Accessors ===

    /// Simulation constants.
    #[must_use]
    pub fn tuning(&self) -> &CombatTuning {
        &self.tuning
    }

    /// Registered bodies.
    #[must_use]
    pub fn bodies(&self) -> &BodyRegistry {
        &self.bodies
    }

    /// Event bus.
    #[must_use]
    pub fn bus(&self) -> &CombatEventBus {
        &self.bus
    }

    /// Drains every published event.
    pub fn drain_events(&self) -> Vec<CombatEvent> {
        self.bus.drain()
    }

    /// Combat state of a destructible entity.
    #[must_use]
    pub fn combatant(&self, id: EntityId) -> Option<&Combatant> {
        self.combatants.get(&id)
    }

    /// Weapon held by `wielder`.
    #[must_use]
    pub fn weapon(&self, wielder: EntityId) -> Option<&Weapon> {
        self.weapons.get(&wielder)
    }

    /// A live hazard.
    #[must_use]
    pub fn hazard(&self, id: EntityId) -> Option<&Hazard> {
        self.hazards.get(&id)
    }

    /// Number of live hazards.
    #[must_use]
    pub fn hazard_count(&self) -> usize {
        self.hazards.len()
    }

    fn missing(&self, id: EntityId) -> CombatError {
        if self.bodies.contains(id) {
            CombatError::NotACombatant(id)
        } else {
            CombatError::EntityNotFound(id)
        }
    }

    fn combatant_mut(&mut self, id: EntityId) -> CombatResult<&mut Combatant> {
        let err = self.missing(id);
        self.combatants.get_mut(&id).ok_or(err)
    }

    fn weapon_mut(&mut self, wielder: EntityId) -> CombatResult<&mut Weapon> {
        self.weapons
            .get_mut(&wielder)
            .ok_or(CombatError::NoWeapon(wielder))
    }

    // === Spawning ===

    /// Spawns a fighter or destructible prop. Fails on a config that does
    /// not validate.
    pub fn spawn_fighter(
        &mut self,
        config: &FighterConfig,
        transform: Transform,
    ) -> CombatResult<EntityId> {
        config.validate()?;
        let interactions = if config.interactions.is_empty() {
            InteractionTable::silent()
        } else {
            InteractionTable::new(config.interactions.clone())?
        };
        let id = EntityId::new();
        self.bodies.insert(
            id,
            Body {
                transform,
                tags: config.kind.lattice(),
                team: config.team,
                interactions,
                destroyed: false,
            },
        );
        self.combatants
            .insert(id, Combatant::new(id, config, &self.tuning));
        info!("Spawned {} as {}", config.name, id);
        Ok(id)
    }

    /// Spawns a wall or static prop.
    pub fn spawn_obstacle(&mut self, transform: Transform) -> EntityId {
        let id = EntityId::new();
        self.bodies.insert(
            id,
            Body {
                transform,
                tags: EntityKind::Obstacle.lattice(),
                team: TeamId::NEUTRAL,
                interactions: InteractionTable::silent(),
                destroyed: false,
            },
        );
        debug!("Spawned obstacle {}", id);
        id
    }

    /// Spawns a hazard fighting for its origin's team.
    ///
    /// A wet hazard without its own duration takes the tuned default.
    pub fn spawn_hazard(
        &mut self,
        stats: &HazardStats,
        origin: Option<EntityId>,
        source: Option<EntityId>,
        position: Vec2,
        velocity: Vec2,
    ) -> CombatResult<EntityId> {
        stats.validate()?;
        let interactions = if stats.interactions.is_empty() {
            InteractionTable::silent()
        } else {
            InteractionTable::new(stats.interactions.clone())?
        };
        let mut stats = stats.clone();
        if stats.wet && stats.wet_duration <= 0.0 {
            stats.wet_duration = self.tuning.status.wet_duration;
        }

        let id = EntityId::new();
        let team = origin
            .and_then(|o| self.bodies.team(o))
            .unwrap_or(TeamId::NEUTRAL);
        self.bodies.insert(
            id,
            Body {
                transform: Transform::new(position, velocity),
                tags: stats.kind.lattice(),
                team,
                interactions,
                destroyed: false,
            },
        );
        debug!("Spawned hazard {} ({}) from {:?}", stats.name, id, origin);
        self.hazards
            .insert(id, Hazard::new(id, stats, origin, source, position, velocity));
        Ok(id)
    }

    /// Puts a weapon in `wielder`'s hands, replacing any previous one.
    pub fn equip(&mut self, wielder: EntityId, config: WeaponConfig) -> CombatResult<()> {
        self.combatant_mut(wielder)?;
        debug!("{} equipped {}", wielder, config.name);
        self.weapons.insert(wielder, Weapon::new(wielder, config));
        Ok(())
    }

    /// Removes an entity and everything it owns. Returns whether it existed.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let existed = self.bodies.remove(id).is_some();
        self.combatants.remove(&id);
        self.weapons.remove(&id);
        self.hazards.remove(&id);
        existed
    }

    // === Host inputs ===

    /// Updates an entity's transform.
    pub fn set_transform(&mut self, id: EntityId, transform: Transform) -> CombatResult<()> {
        let body = self
            .bodies
            .bodies
            .get_mut(&id)
            .ok_or(CombatError::EntityNotFound(id))?;
        body.transform = transform;
        Ok(())
    }

    /// Places one weapon part for the next sweep.
    pub fn set_weapon_pose(&mut self, wielder: EntityId, part: usize, pose: PartPose) -> CombatResult<()> {
        self.weapon_mut(wielder)?.set_pose(part, pose)
    }

    /// Opens an activation window on entry into an attack state.
    pub fn enter_attack_state(&mut self, wielder: EntityId) -> CombatResult<()> {
        self.weapon_mut(wielder)?.enter_activation();
        Ok(())
    }

    /// Closes the activation window and drops pending intents.
    pub fn exit_attack_state(&mut self, wielder: EntityId) -> CombatResult<()> {
        self.weapon_mut(wielder)?.clear_attack_state_info();
        self.combatant_mut(wielder)?.clear_intents();
        Ok(())
    }

    /// Records an action intent if affordable.
    pub fn request_action(&mut self, id: EntityId, action: Action) -> CombatResult<bool> {
        self.combatant_mut(id)?.request(action)
    }

    /// Fires a pending intent, paying its cost.
    pub fn commit_action(&mut self, id: EntityId, action: Action) -> CombatResult<bool> {
        self.combatant_mut(id)?.commit(action)
    }

    /// Drains the impulse accumulated on an entity for the host physics.
    pub fn take_impulse(&mut self, id: EntityId) -> CombatResult<Vec2> {
        Ok(self.combatant_mut(id)?.motion_mut().take_impulse())
    }

    /// Hands an effect straight to an entity's status manager.
    pub fn apply_effect(
        &mut self,
        target: EntityId,
        effect: StatusEffect,
        services: &mut Services<'_>,
    ) -> CombatResult<AddOutcome> {
        let err = self.missing(target);
        let combatant = self.combatants.get_mut(&target).ok_or(err)?;
        let mut events = Vec::new();
        let mut scope = TickScope {
            directory: &self.bodies,
            services: &mut *services,
            tuning: &self.tuning,
            events: &mut events,
        };
        let outcome = combatant.add_effect(effect, &mut scope);
        combatant.flush(&self.bodies, services, &mut events);
        self.bus.publish_all(events);
        self.mark_dead_bodies();
        Ok(outcome)
    }

    fn mark_dead_bodies(&mut self) {
        for (&id, combatant) in &self.combatants {
            if combatant.is_destroyed() {
                self.bodies.mark_destroyed(id);
            }
        }
    }

    // === Frame ===

    /// Runs one frame.
    pub fn step(&mut self, dt: f32, physics: &dyn PhysicsQuery, services: &mut Services<'_>) {
        let mut events = Vec::new();
        self.step_weapons(physics, services, &mut events);
        self.step_hazards(dt, physics, services, &mut events);
        self.step_status(dt, services, &mut events);
        self.step_timers(dt, services, &mut events);
        self.bus.publish_all(events);
    }

    fn step_weapons(
        &mut self,
        physics: &dyn PhysicsQuery,
        services: &mut Services<'_>,
        events: &mut Vec<CombatEvent>,
    ) {
        for (&wielder, weapon) in &mut self.weapons {
            if self.combatants.get(&wielder).map_or(true, Combatant::is_destroyed) {
                continue;
            }
            for sweep in weapon.sweep(physics) {
                let resolution = match weapon.handle_collision(&sweep, &self.bodies) {
                    Ok(resolution) => resolution,
                    Err(err) => {
                        warn!("Dropped sweep hit of {}: {}", wielder, err);
                        continue;
                    },
                };
                #[allow(clippy::cast_possible_wrap)]
                let hit_count = weapon.hit_count() as i32;
                match resolution {
                    HitResolution::Damage {
                        target,
                        group,
                        effects,
                    } => {
                        let Some(combatant) = self.combatants.get_mut(&target) else {
                            warn!("Hit on {} has no combatant to land on", target);
                            continue;
                        };
                        if combatant.is_destroyed() {
                            trace!("{} struck the remains of {}", wielder, target);
                            continue;
                        }
                        services.presentation.set_int(wielder, Signal::HitCount, hit_count);
                        events.push(CombatEvent::HitRegistered {
                            origin: Some(wielder),
                            source: wielder,
                            target,
                            group,
                        });
                        let mut scope = TickScope {
                            directory: &self.bodies,
                            services: &mut *services,
                            tuning: &self.tuning,
                            events: &mut *events,
                        };
                        for effect in effects {
                            combatant.add_effect(effect, &mut scope);
                        }
                        if combatant.is_destroyed() {
                            self.bodies.mark_destroyed(target);
                        }
                    },
                    HitResolution::Obstacle {
                        obstacle,
                        point,
                        direction,
                    } => {
                        let bounce_power = weapon.bounce_power(sweep.part).unwrap_or(1.0);
                        services.presentation.set_int(wielder, Signal::HitCount, hit_count);
                        services
                            .presentation
                            .set_float(wielder, Signal::BouncePower, bounce_power);
                        if let Some(table) = self.bodies.interactions(wielder) {
                            table.play(InteractionType::Obstacle, point, direction, services.feedback);
                        }
                        events.push(CombatEvent::ObstacleStruck {
                            source: wielder,
                            obstacle,
                            bounce_power,
                        });
                    },
                    HitResolution::Hazard { other } => {
                        trace!("{} swept through hazard {}", wielder, other);
                    },
                    HitResolution::Ignored | HitResolution::Rejected(_) => {},
                }
            }
        }
    }

    fn step_hazards(
        &mut self,
        dt: f32,
        physics: &dyn PhysicsQuery,
        services: &mut Services<'_>,
        events: &mut Vec<CombatEvent>,
    ) {
        for hazard in self.hazards.values_mut() {
            hazard.integrate(dt);
            self.bodies.set_position(hazard.id(), hazard.position());
        }

        for hazard in self.hazards.values_mut() {
            for contact in hazard.candidates(physics) {
                let (target, group, effects) =
                    match hazard.handle_trigger(&contact, &self.bodies, physics) {
                        HitResolution::Damage {
                            target,
                            group,
                            effects,
                        } => (target, group, effects),
                        HitResolution::Obstacle {
                            obstacle,
                            point,
                            direction,
                        } => {
                            if let Some(table) = self.bodies.interactions(hazard.id()) {
                                table.play(InteractionType::Obstacle, point, direction, services.feedback);
                            }
                            events.push(CombatEvent::ObstacleStruck {
                                source: hazard.id(),
                                obstacle,
                                bounce_power: 0.0,
                            });
                            continue;
                        },
                        HitResolution::Hazard { other } => {
                            trace!("Hazard {} overlapped hazard {}", hazard.id(), other);
                            continue;
                        },
                        HitResolution::Ignored | HitResolution::Rejected(_) => continue,
                    };
                let Some(combatant) = self.combatants.get_mut(&target) else {
                    warn!("Hazard hit on {} has no combatant to land on", target);
                    continue;
                };
                if combatant.is_destroyed() {
                    trace!("Hazard {} struck the remains of {}", hazard.id(), target);
                    continue;
                }
                events.push(CombatEvent::HitRegistered {
                    origin: hazard.origin(),
                    source: hazard.id(),
                    target,
                    group,
                });
                if let Some(table) = self.bodies.interactions(target) {
                    table.play(
                        InteractionType::HazardImpact,
                        contact.point,
                        hazard.velocity().normalize_or_zero(),
                        services.feedback,
                    );
                }
                let mut scope = TickScope {
                    directory: &self.bodies,
                    services: &mut *services,
                    tuning: &self.tuning,
                    events: &mut *events,
                };
                for effect in effects {
                    combatant.add_effect(effect, &mut scope);
                }
                if combatant.is_destroyed() {
                    self.bodies.mark_destroyed(target);
                }

                let mana = hazard.stats().mana_generation;
                if mana > 0.0 {
                    let origin = hazard.origin().and_then(|o| self.combatants.get_mut(&o));
                    if let Some(origin) = origin.filter(|c| !c.is_destroyed()) {
                        origin.vitals_mut().gain_mana(mana);
                    }
                }
            }
        }
    }

    fn step_status(&mut self, dt: f32, services: &mut Services<'_>, events: &mut Vec<CombatEvent>) {
        let mut scope = TickScope {
            directory: &self.bodies,
            services: &mut *services,
            tuning: &self.tuning,
            events: &mut *events,
        };
        for combatant in self.combatants.values_mut() {
            if !combatant.is_destroyed() {
                combatant.update_effects(dt, &mut scope);
            }
        }
        self.mark_dead_bodies();
    }

    fn step_timers(&mut self, dt: f32, services: &mut Services<'_>, events: &mut Vec<CombatEvent>) {
        for combatant in self.combatants.values_mut() {
            if combatant.tick_timers(dt) {
                trace!("{} back on its feet", combatant.id());
            }
            combatant.flush(&self.bodies, services, events);
        }
        self.mark_dead_bodies();

        let mut removed = Vec::new();
        for hazard in self.hazards.values_mut() {
            for state in hazard.advance(dt) {
                match state {
                    HazardState::Decaying => {
                        services.presentation.trigger(hazard.id(), Signal::Decay);
                        events.push(CombatEvent::HazardDecaying { hazard: hazard.id() });
                    },
                    HazardState::Removed => {
                        events.push(CombatEvent::HazardRemoved { hazard: hazard.id() });
                        removed.push(hazard.id());
                    },
                    HazardState::Alive => {},
                }
            }
        }
        for id in removed {
            self.hazards.remove(&id);
            self.bodies.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damage::DamageSpec;
    use crate::sandbox::{CircleWorld, RecordingFeedback, RecordingPresentation};
    use crate::services::InteractionEntry;
    use crate::weapon::WeaponPartConfig;
    use brawl_common::{LayerMask, ParticleId};

    fn fighter() -> FighterConfig {
        FighterConfig {
            name: "knight".to_string(),
            ..Default::default()
        }
    }

    fn step(world: &mut CombatWorld, physics: &CircleWorld, dt: f32) -> RecordingPresentation {
        let mut presentation = RecordingPresentation::default();
        let mut feedback = RecordingFeedback::default();
        let mut services = Services::new(&mut presentation, &mut feedback);
        world.step(dt, physics, &mut services);
        presentation
    }

    #[test]
    fn test_lookup_errors() {
        let mut world = CombatWorld::new(CombatTuning::default());
        let wall = world.spawn_obstacle(Transform::default());
        let ghost = EntityId::from_raw(u64::MAX);
        assert_eq!(
            world.request_action(wall, Action::Attack),
            Err(CombatError::NotACombatant(wall))
        );
        assert_eq!(
            world.request_action(ghost, Action::Attack),
            Err(CombatError::EntityNotFound(ghost))
        );
        let knight = world.spawn_fighter(&fighter(), Transform::default()).unwrap();
        assert_eq!(
            world.enter_attack_state(knight),
            Err(CombatError::NoWeapon(knight))
        );
    }

    #[test]
    fn test_short_interaction_table_rejected_at_spawn() {
        let mut world = CombatWorld::new(CombatTuning::default());
        let config = FighterConfig {
            interactions: vec![Default::default(); 2],
            ..fighter()
        };
        assert!(matches!(
            world.spawn_fighter(&config, Transform::default()),
            Err(CombatError::InvalidConfig(msg)) if msg.contains("interaction rows")
        ));
        assert!(world.bodies().is_empty());
    }

    #[test]
    fn test_invalid_fighter_rejected_at_spawn() {
        let mut world = CombatWorld::new(CombatTuning::default());
        let config = FighterConfig {
            vitals: crate::stats::VitalsConfig {
                poise_resistance: -1.0,
                ..Default::default()
            },
            ..fighter()
        };
        assert!(matches!(
            world.spawn_fighter(&config, Transform::default()),
            Err(CombatError::InvalidConfig(_))
        ));
        assert!(world.bodies().is_empty());

        let bad_hazard = HazardStats {
            name: "dud".to_string(),
            radius: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            world.spawn_hazard(&bad_hazard, None, None, Vec2::ZERO, Vec2::ZERO),
            Err(CombatError::InvalidConfig(_))
        ));
        assert_eq!(world.hazard_count(), 0);
    }

    #[test]
    fn test_hazard_strikes_obstacle() {
        let mut world = CombatWorld::new(CombatTuning::default());
        let wall = world.spawn_obstacle(Transform::new(Vec2::new(1.0, 0.0), Vec2::X));
        let mut physics = CircleWorld::new();
        physics.add_circle(wall, Vec2::new(1.0, 0.0), 0.5, LayerMask::OBSTACLES);

        let mut rows = vec![InteractionEntry::default(); InteractionType::COUNT];
        rows[InteractionType::Obstacle.index()].particle = Some(ParticleId::new(3));
        let stats = HazardStats {
            name: "spark".to_string(),
            interactions: rows,
            ..Default::default()
        };
        let spark = world
            .spawn_hazard(&stats, None, None, Vec2::new(0.5, 0.0), Vec2::X)
            .unwrap();

        let mut presentation = RecordingPresentation::default();
        let mut feedback = RecordingFeedback::default();
        for _ in 0..2 {
            let mut services = Services::new(&mut presentation, &mut feedback);
            world.step(0.016, &physics, &mut services);
        }

        let struck: Vec<_> = world
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, CombatEvent::ObstacleStruck { .. }))
            .collect();
        assert_eq!(
            struck,
            vec![CombatEvent::ObstacleStruck {
                source: spark,
                obstacle: wall,
                bounce_power: 0.0,
            }]
        );
        assert_eq!(feedback.particles.len(), 1);
        assert_eq!(feedback.particles[0].0, ParticleId::new(3));
    }

    #[test]
    fn test_wet_hazard_takes_tuned_duration() {
        let mut world = CombatWorld::new(CombatTuning::default());
        let stats = HazardStats {
            name: "splash".to_string(),
            wet: true,
            ..Default::default()
        };
        let splash = world
            .spawn_hazard(&stats, None, None, Vec2::ZERO, Vec2::ZERO)
            .unwrap();
        let duration = world.hazard(splash).unwrap().stats().wet_duration;
        assert!((duration - world.tuning().status.wet_duration).abs() < 1e-6);

        let own = HazardStats {
            wet_duration: 1.25,
            ..stats
        };
        let soaked = world.spawn_hazard(&own, None, None, Vec2::ZERO, Vec2::ZERO).unwrap();
        assert!((world.hazard(soaked).unwrap().stats().wet_duration - 1.25).abs() < 1e-6);
    }

    #[test]
    fn test_hazard_hits_once_and_credits_mana() {
        let mut world = CombatWorld::new(CombatTuning::default());
        let caster = world.spawn_fighter(&fighter(), Transform::default()).unwrap();
        let enemy = world
            .spawn_fighter(&fighter(), Transform::new(Vec2::new(3.0, 0.0), Vec2::NEG_X))
            .unwrap();
        let mut physics = CircleWorld::new();
        physics.add_circle(caster, Vec2::ZERO, 0.5, LayerMask::BODIES);
        physics.add_circle(enemy, Vec2::new(3.0, 0.0), 0.5, LayerMask::BODIES);

        // Drain the caster's mana so the credit is visible.
        let caster_vitals = world.combatant_mut(caster).unwrap().vitals_mut();
        caster_vitals.spend_mana(50.0, false);

        let stats = HazardStats {
            name: "bolt".to_string(),
            damage: DamageSpec {
                damage: 6,
                ..Default::default()
            },
            mana_generation: 5.0,
            decay_time: 0.5,
            linger_time: 0.25,
            ..Default::default()
        };
        let bolt = world
            .spawn_hazard(&stats, Some(caster), Some(caster), Vec2::new(2.0, 0.0), Vec2::ZERO)
            .unwrap();

        step(&mut world, &physics, 0.1);
        step(&mut world, &physics, 0.1);

        let enemy_health = world.combatant(enemy).unwrap().vitals().health();
        assert!((enemy_health - 94.0).abs() < 1e-4);
        let caster_mana = world.combatant(caster).unwrap().vitals().mana();
        assert!((caster_mana - 5.0).abs() < 1e-4);

        let hits = world
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, CombatEvent::HitRegistered { source, .. } if *source == bolt))
            .count();
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_hazard_decays_then_is_removed() {
        let mut world = CombatWorld::new(CombatTuning::default());
        let physics = CircleWorld::new();
        let stats = HazardStats {
            name: "cloud".to_string(),
            kind: EntityKind::EffectField,
            decay_time: 0.2,
            linger_time: 0.2,
            ..Default::default()
        };
        let cloud = world
            .spawn_hazard(&stats, None, None, Vec2::ZERO, Vec2::ZERO)
            .unwrap();

        let presentation = step(&mut world, &physics, 0.25);
        assert!(presentation.was_triggered(cloud, Signal::Decay));
        assert_eq!(world.hazard(cloud).map(Hazard::state), Some(HazardState::Decaying));

        step(&mut world, &physics, 0.25);
        assert!(world.hazard(cloud).is_none());
        assert!(!world.bodies().contains(cloud));
        assert_eq!(
            world.drain_events(),
            vec![
                CombatEvent::HazardDecaying { hazard: cloud },
                CombatEvent::HazardRemoved { hazard: cloud },
            ]
        );
    }

    #[test]
    fn test_exit_attack_state_clears_intents() {
        let mut world = CombatWorld::new(CombatTuning::default());
        let knight = world.spawn_fighter(&fighter(), Transform::default()).unwrap();
        world
            .equip(
                knight,
                WeaponConfig {
                    name: "sword".to_string(),
                    parts: vec![WeaponPartConfig {
                        nodes: vec![Vec2::X],
                        ..Default::default()
                    }],
                    ..Default::default()
                },
            )
            .unwrap();
        world.enter_attack_state(knight).unwrap();
        assert!(world.request_action(knight, Action::Attack).unwrap());
        world.exit_attack_state(knight).unwrap();
        assert!(!world.weapon(knight).unwrap().is_active());
        assert!(!world.commit_action(knight, Action::Attack).unwrap());
    }
}
