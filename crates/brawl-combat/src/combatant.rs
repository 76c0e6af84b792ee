//! Destructible entities with a stat economy.
//!
//! A combatant bundles everything the combat core mutates on a fighter or
//! breakable prop: vitals, the status-effect scheduler, impulses/posture and
//! the action gate. Stat changes are buffered in the vitals outbox and
//! flushed to presentation and the event list once per frame.

use brawl_common::{EntityId, EntityKind, TeamId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{CombatTuning, ConfigError, ConfigResult};
use crate::error::CombatResult;
use crate::events::CombatEvent;
use crate::motion::Motion;
use crate::services::{EntityDirectory, InteractionEntry, InteractionType, Services, Signal};
use crate::stats::{Action, ActionCost, ActionGate, VitalEvent, Vitals, VitalsConfig};
use crate::status::{AddOutcome, EffectTarget, StatusEffect, StatusEffectManager, TickScope};

/// Fighter or breakable prop definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FighterConfig {
    /// Unique name.
    pub name: String,
    /// Category; must be destructible.
    pub kind: EntityKind,
    /// Team.
    pub team: TeamId,
    /// Stat maxima.
    pub vitals: VitalsConfig,
    /// Launch and knockdown drive posture, not just impulses.
    pub heavy_receiver: bool,
    /// Basic attack cost.
    pub attack: ActionCost,
    /// Evade cost.
    pub evade: ActionCost,
    /// Ability slots in order.
    pub abilities: Vec<ActionCost>,
    /// Interaction feedback rows; empty means silent.
    pub interactions: Vec<InteractionEntry>,
    /// Body collider radius.
    pub radius: f32,
}

impl Default for FighterConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: EntityKind::Character,
            team: TeamId::NEUTRAL,
            vitals: VitalsConfig::default(),
            heavy_receiver: true,
            attack: ActionCost::stamina(10.0),
            evade: ActionCost::stamina(20.0),
            abilities: Vec::new(),
            interactions: Vec::new(),
            radius: 0.5,
        }
    }
}

impl FighterConfig {
    /// Validates the definition.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.name.is_empty() {
            return Err(ConfigError::Validation("fighter has empty name".to_string()));
        }
        if !self.kind.lattice().is(EntityKind::Destructible) {
            return Err(ConfigError::Validation(format!(
                "fighter {} has non-destructible kind {:?}",
                self.name, self.kind
            )));
        }
        if self.radius <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "fighter {} has non-positive radius",
                self.name
            )));
        }
        if !self.interactions.is_empty() && self.interactions.len() < InteractionType::COUNT {
            return Err(ConfigError::Validation(format!(
                "fighter {} has {} interaction rows, expected {}",
                self.name,
                self.interactions.len(),
                InteractionType::COUNT
            )));
        }
        self.vitals.validate()
    }
}

/// Mutable combat state of one destructible entity.
#[derive(Debug, Clone)]
pub struct Combatant {
    id: EntityId,
    vitals: Vitals,
    status: StatusEffectManager,
    motion: Motion,
    gate: ActionGate,
}

impl Combatant {
    /// Creates a combatant at full stats.
    #[must_use]
    pub fn new(id: EntityId, config: &FighterConfig, tuning: &CombatTuning) -> Self {
        Self {
            id,
            vitals: Vitals::new(&config.vitals, tuning),
            status: StatusEffectManager::new(),
            motion: Motion::new(config.heavy_receiver),
            gate: ActionGate::new(config.attack, config.evade, config.abilities.clone()),
        }
    }

    /// Entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Stat economy.
    #[must_use]
    pub fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    /// Mutable stat economy.
    pub fn vitals_mut(&mut self) -> &mut Vitals {
        &mut self.vitals
    }

    /// Status effects.
    #[must_use]
    pub fn status(&self) -> &StatusEffectManager {
        &self.status
    }

    /// Impulses and posture.
    #[must_use]
    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    /// Mutable impulses and posture.
    pub fn motion_mut(&mut self) -> &mut Motion {
        &mut self.motion
    }

    /// Action gate.
    #[must_use]
    pub fn gate(&self) -> &ActionGate {
        &self.gate
    }

    /// True once dead.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.vitals.is_destroyed()
    }

    fn split(&mut self) -> (&mut StatusEffectManager, EffectTarget<'_>) {
        (
            &mut self.status,
            EffectTarget {
                id: self.id,
                vitals: &mut self.vitals,
                motion: &mut self.motion,
            },
        )
    }

    /// Hands an effect to the status manager.
    pub fn add_effect(&mut self, effect: StatusEffect, scope: &mut TickScope<'_, '_>) -> AddOutcome {
        let (status, mut target) = self.split();
        status.add(effect, &mut target, scope)
    }

    /// Ticks status effects.
    pub fn update_effects(&mut self, dt: f32, scope: &mut TickScope<'_, '_>) {
        let (status, mut target) = self.split();
        status.update(dt, &mut target, scope);
    }

    /// Advances regeneration, cooldowns and posture timers.
    ///
    /// Returns true when a launch or knockdown ended this step.
    pub fn tick_timers(&mut self, dt: f32) -> bool {
        self.vitals.regenerate(dt);
        self.gate.tick(dt);
        self.motion.tick(dt)
    }

    /// Records an intent; see [`ActionGate::request`].
    pub fn request(&mut self, action: Action) -> CombatResult<bool> {
        self.gate.request(action, &self.vitals)
    }

    /// Fires a pending intent; see [`ActionGate::commit`].
    pub fn commit(&mut self, action: Action) -> CombatResult<bool> {
        self.gate.commit(action, &mut self.vitals)
    }

    /// Drops every pending intent.
    pub fn clear_intents(&mut self) {
        self.gate.clear_intents();
    }

    /// Pushes buffered stat changes to presentation and events.
    ///
    /// Also runs the affordability scan if stamina or mana dropped since the
    /// last flush, and drops every status effect once dead.
    pub fn flush(
        &mut self,
        directory: &dyn EntityDirectory,
        services: &mut Services<'_>,
        events: &mut Vec<CombatEvent>,
    ) {
        for event in self.vitals.take_events() {
            match event {
                VitalEvent::Changed { stat, value } => {
                    services.presentation.set_float(self.id, stat.signal(), value);
                },
                VitalEvent::Died { killer } => {
                    services.presentation.trigger(self.id, Signal::Death);
                    self.play(InteractionType::Death, directory, services);
                    self.status.clear();
                    self.gate.clear_intents();
                    debug!("{} died, killed by {:?}", self.id, killer);
                    events.push(CombatEvent::Died {
                        entity: self.id,
                        killer,
                    });
                },
                VitalEvent::Staggered => {
                    services.presentation.trigger(self.id, Signal::Stagger);
                    self.play(InteractionType::Stagger, directory, services);
                    events.push(CombatEvent::Staggered { entity: self.id });
                },
            }
        }

        if self.vitals.take_gating_dropped() {
            for action in self.gate.revoke_unaffordable(&self.vitals) {
                events.push(CombatEvent::IntentRevoked {
                    entity: self.id,
                    action,
                });
            }
        }
    }

    fn play(&self, kind: InteractionType, directory: &dyn EntityDirectory, services: &mut Services<'_>) {
        let (Some(table), Some(transform)) =
            (directory.interactions(self.id), directory.transform(self.id))
        else {
            return;
        };
        table.play(kind, transform.position, transform.facing, services.feedback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaminaPolicy;
    use crate::sandbox::{RecordingFeedback, RecordingPresentation, StaticDirectory};
    use crate::services::InteractionTable;
    use brawl_common::{ClipId, Vec2};

    fn clamped() -> CombatTuning {
        CombatTuning {
            stamina_policy: StaminaPolicy::Clamped,
            ..Default::default()
        }
    }

    #[test]
    fn test_config_validation() {
        let ok = FighterConfig {
            name: "knight".to_string(),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let wall = FighterConfig {
            kind: EntityKind::Obstacle,
            ..ok.clone()
        };
        assert!(wall.validate().is_err());

        let short = FighterConfig {
            interactions: vec![InteractionEntry::default(); 3],
            ..ok
        };
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_flush_pushes_stats_and_death() {
        let id = EntityId::from_raw(5);
        let killer = EntityId::from_raw(6);
        let mut directory = StaticDirectory::default();
        directory.place(id, Vec2::ZERO, Vec2::X);
        directory.set_interactions(
            id,
            InteractionTable::silent().with(
                InteractionType::Death,
                InteractionEntry {
                    audio: Some(ClipId::new(9)),
                    particle: None,
                },
            ),
        );
        let mut fighter = Combatant::new(id, &FighterConfig::default(), &clamped());
        let mut presentation = RecordingPresentation::default();
        let mut feedback = RecordingFeedback::default();
        let mut events = Vec::new();

        fighter.vitals_mut().apply_damage(150.0, Some(killer));
        fighter.vitals_mut().apply_damage(10.0, Some(killer));
        {
            let mut services = Services::new(&mut presentation, &mut feedback);
            fighter.flush(&directory, &mut services, &mut events);
        }

        assert_eq!(presentation.last_float(id, Signal::Health), Some(0.0));
        assert_eq!(presentation.trigger_count(id, Signal::Death), 1);
        assert_eq!(feedback.audio, vec![ClipId::new(9)]);
        assert_eq!(
            events,
            vec![CombatEvent::Died {
                entity: id,
                killer: Some(killer)
            }]
        );
    }

    #[test]
    fn test_flush_revokes_unaffordable_intents() {
        let id = EntityId::from_raw(7);
        let directory = StaticDirectory::default();
        let config = FighterConfig {
            abilities: vec![ActionCost::mana(40.0)],
            ..Default::default()
        };
        let mut fighter = Combatant::new(id, &config, &clamped());
        assert!(fighter.request(Action::Ability(0)).unwrap());

        fighter.vitals_mut().spend_mana(20.0, false);
        let mut presentation = RecordingPresentation::default();
        let mut feedback = RecordingFeedback::default();
        let mut events = Vec::new();
        {
            let mut services = Services::new(&mut presentation, &mut feedback);
            fighter.flush(&directory, &mut services, &mut events);
        }

        assert!(events.contains(&CombatEvent::IntentRevoked {
            entity: id,
            action: Action::Ability(0)
        }));
        assert!(!fighter.gate().has_intent(Action::Ability(0)).unwrap());
        assert!(!fighter.commit(Action::Ability(0)).unwrap());
    }

    #[test]
    fn test_stagger_flushes_trigger() {
        let id = EntityId::from_raw(8);
        let directory = StaticDirectory::default();
        let mut fighter = Combatant::new(id, &FighterConfig::default(), &clamped());
        assert!(!fighter.vitals_mut().apply_poise_damage(50.0));
        assert!(fighter.vitals_mut().apply_poise_damage(50.0));

        let mut presentation = RecordingPresentation::default();
        let mut feedback = RecordingFeedback::default();
        let mut events = Vec::new();
        {
            let mut services = Services::new(&mut presentation, &mut feedback);
            fighter.flush(&directory, &mut services, &mut events);
        }
        assert!(presentation.was_triggered(id, Signal::Stagger));
        assert_eq!(events, vec![CombatEvent::Staggered { entity: id }]);
        assert_eq!(fighter.vitals().poise_damage(), 0.0);
    }
}
