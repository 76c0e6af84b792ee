//! Resource-gated actions and queued intents.
//!
//! An intent is set when input asks for an action and consumed when the
//! action resolves. Whenever stamina or mana drops between the two, a scan
//! revokes every intent that is no longer affordable.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CombatError, CombatResult};

use super::vitals::Vitals;

/// A gated action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Basic attack.
    Attack,
    /// Dodge/roll.
    Evade,
    /// Special ability in a registered slot.
    Ability(usize),
}

/// Resource an action draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// Free.
    #[default]
    None,
    /// Permitted while any stamina remains; may overspend.
    Stamina,
    /// Permitted only if the full cost is available.
    Mana,
}

/// Cost and limits of one action.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionCost {
    /// Resource drawn.
    pub resource: Resource,
    /// Amount drawn.
    pub cost: f32,
    /// Cooldown after use (seconds).
    pub cooldown: f32,
    /// Charges; `None` is unlimited.
    pub ammo: Option<u32>,
    /// Heavy spends delay regeneration longer.
    pub heavy: bool,
}

impl ActionCost {
    /// Stamina-costed action.
    #[must_use]
    pub const fn stamina(cost: f32) -> Self {
        Self {
            resource: Resource::Stamina,
            cost,
            cooldown: 0.0,
            ammo: None,
            heavy: false,
        }
    }

    /// Mana-costed action.
    #[must_use]
    pub const fn mana(cost: f32) -> Self {
        Self {
            resource: Resource::Mana,
            cost,
            cooldown: 0.0,
            ammo: None,
            heavy: false,
        }
    }

    /// Sets the cooldown.
    #[must_use]
    pub const fn with_cooldown(mut self, cooldown: f32) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Sets limited charges.
    #[must_use]
    pub const fn with_ammo(mut self, ammo: u32) -> Self {
        self.ammo = Some(ammo);
        self
    }

    /// Marks the spend as heavy.
    #[must_use]
    pub const fn heavy(mut self) -> Self {
        self.heavy = true;
        self
    }
}

#[derive(Debug, Clone)]
struct GatedAction {
    cost: ActionCost,
    cooldown_remaining: f32,
    ammo: Option<u32>,
    intent: bool,
}

impl GatedAction {
    fn new(cost: ActionCost) -> Self {
        Self {
            cost,
            cooldown_remaining: 0.0,
            ammo: cost.ammo,
            intent: false,
        }
    }

    fn affordable(&self, vitals: &Vitals) -> bool {
        if vitals.is_destroyed() || self.cooldown_remaining > 0.0 || self.ammo == Some(0) {
            return false;
        }
        match self.cost.resource {
            Resource::None => true,
            Resource::Stamina => vitals.stamina() > 0.0,
            Resource::Mana => vitals.mana() >= self.cost.cost,
        }
    }
}

/// Gate over attack, evade and ability actions of one fighter.
#[derive(Debug, Clone)]
pub struct ActionGate {
    attack: GatedAction,
    evade: GatedAction,
    abilities: Vec<GatedAction>,
}

impl Default for ActionGate {
    fn default() -> Self {
        Self::new(ActionCost::default(), ActionCost::default(), Vec::new())
    }
}

impl ActionGate {
    /// Creates a gate; abilities occupy slots in the given order.
    #[must_use]
    pub fn new(attack: ActionCost, evade: ActionCost, abilities: Vec<ActionCost>) -> Self {
        Self {
            attack: GatedAction::new(attack),
            evade: GatedAction::new(evade),
            abilities: abilities.into_iter().map(GatedAction::new).collect(),
        }
    }

    /// Number of registered ability slots.
    #[must_use]
    pub fn ability_count(&self) -> usize {
        self.abilities.len()
    }

    fn slot(&self, action: Action) -> CombatResult<&GatedAction> {
        match action {
            Action::Attack => Ok(&self.attack),
            Action::Evade => Ok(&self.evade),
            Action::Ability(slot) => self.abilities.get(slot).ok_or(CombatError::UnknownAbilitySlot {
                slot,
                registered: self.abilities.len(),
            }),
        }
    }

    fn slot_mut(&mut self, action: Action) -> CombatResult<&mut GatedAction> {
        let registered = self.abilities.len();
        match action {
            Action::Attack => Ok(&mut self.attack),
            Action::Evade => Ok(&mut self.evade),
            Action::Ability(slot) => self
                .abilities
                .get_mut(slot)
                .ok_or(CombatError::UnknownAbilitySlot { slot, registered }),
        }
    }

    fn actions(&self) -> impl Iterator<Item = Action> {
        [Action::Attack, Action::Evade]
            .into_iter()
            .chain((0..self.abilities.len()).map(Action::Ability))
    }

    /// True if the action's preconditions hold right now.
    pub fn can_perform(&self, action: Action, vitals: &Vitals) -> CombatResult<bool> {
        Ok(self.slot(action)?.affordable(vitals))
    }

    /// Records an intent if the action is affordable. Returns whether it was.
    pub fn request(&mut self, action: Action, vitals: &Vitals) -> CombatResult<bool> {
        let gated = self.slot_mut(action)?;
        gated.intent = gated.affordable(vitals);
        Ok(gated.intent)
    }

    /// True if an intent is pending for the action.
    pub fn has_intent(&self, action: Action) -> CombatResult<bool> {
        Ok(self.slot(action)?.intent)
    }

    /// Consumes a pending intent, paying its cost. Returns whether it fired.
    pub fn commit(&mut self, action: Action, vitals: &mut Vitals) -> CombatResult<bool> {
        let gated = self.slot_mut(action)?;
        let fire = gated.intent && gated.affordable(vitals);
        gated.intent = false;
        if !fire {
            return Ok(false);
        }
        match gated.cost.resource {
            Resource::None => {},
            Resource::Stamina => vitals.spend_stamina(gated.cost.cost, gated.cost.heavy),
            Resource::Mana => vitals.spend_mana(gated.cost.cost, gated.cost.heavy),
        }
        gated.cooldown_remaining = gated.cost.cooldown;
        if let Some(ammo) = gated.ammo.as_mut() {
            *ammo = ammo.saturating_sub(1);
        }
        Ok(true)
    }

    /// Clears every intent that is no longer affordable; returns them.
    pub fn revoke_unaffordable(&mut self, vitals: &Vitals) -> Vec<Action> {
        let revoked: Vec<Action> = self
            .actions()
            .filter(|a| {
                self.slot(*a)
                    .is_ok_and(|g| g.intent && !g.affordable(vitals))
            })
            .collect();
        for action in &revoked {
            if let Ok(gated) = self.slot_mut(*action) {
                gated.intent = false;
            }
            debug!("Revoked intent {:?}", action);
        }
        revoked
    }

    /// Drops every pending intent.
    pub fn clear_intents(&mut self) {
        self.attack.intent = false;
        self.evade.intent = false;
        for gated in &mut self.abilities {
            gated.intent = false;
        }
    }

    /// Refills an ability's charges.
    pub fn refill(&mut self, slot: usize, ammo: u32) -> CombatResult<()> {
        let gated = self.slot_mut(Action::Ability(slot))?;
        gated.ammo = gated.cost.ammo.map(|_| ammo);
        Ok(())
    }

    /// Remaining charges of an ability; `None` is unlimited.
    pub fn ammo(&self, slot: usize) -> CombatResult<Option<u32>> {
        Ok(self.slot(Action::Ability(slot))?.ammo)
    }

    /// Advances cooldowns.
    pub fn tick(&mut self, dt: f32) {
        self.attack.cooldown_remaining = (self.attack.cooldown_remaining - dt).max(0.0);
        self.evade.cooldown_remaining = (self.evade.cooldown_remaining - dt).max(0.0);
        for gated in &mut self.abilities {
            gated.cooldown_remaining = (gated.cooldown_remaining - dt).max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CombatTuning, StaminaPolicy};
    use crate::stats::VitalsConfig;

    fn vitals() -> Vitals {
        let tuning = CombatTuning {
            stamina_policy: StaminaPolicy::Clamped,
            ..Default::default()
        };
        Vitals::new(&VitalsConfig::default(), &tuning)
    }

    fn gate() -> ActionGate {
        ActionGate::new(
            ActionCost::stamina(20.0),
            ActionCost::stamina(30.0).heavy(),
            vec![
                ActionCost::mana(30.0).with_cooldown(2.0),
                ActionCost::default().with_ammo(1),
            ],
        )
    }

    #[test]
    fn test_unknown_slot_is_an_error() {
        let mut gate = gate();
        let v = vitals();
        assert_eq!(
            gate.request(Action::Ability(5), &v),
            Err(CombatError::UnknownAbilitySlot {
                slot: 5,
                registered: 2
            })
        );
    }

    #[test]
    fn test_commit_pays_and_starts_cooldown() {
        let mut gate = gate();
        let mut v = vitals();
        assert!(gate.request(Action::Ability(0), &v).unwrap());
        assert!(gate.commit(Action::Ability(0), &mut v).unwrap());
        assert!((v.mana() - 20.0).abs() < 1e-6);

        assert!(!gate.request(Action::Ability(0), &v).unwrap());
        gate.tick(2.0);
        assert!(!gate.can_perform(Action::Ability(0), &v).unwrap());
        v.gain_mana(10.0);
        assert!(gate.can_perform(Action::Ability(0), &v).unwrap());
    }

    #[test]
    fn test_commit_without_intent_does_nothing() {
        let mut gate = gate();
        let mut v = vitals();
        assert!(!gate.commit(Action::Attack, &mut v).unwrap());
        assert!((v.stamina() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_stamina_allows_overspend_while_positive() {
        let mut gate = gate();
        let mut v = vitals();
        v.spend_stamina(95.0, false);
        assert!(gate.request(Action::Evade, &v).unwrap());
        assert!(gate.commit(Action::Evade, &mut v).unwrap());
        assert_eq!(v.stamina(), 0.0);
        assert!(!gate.can_perform(Action::Attack, &v).unwrap());
    }

    #[test]
    fn test_drop_revokes_unaffordable_intents() {
        let mut gate = gate();
        let mut v = vitals();
        assert!(gate.request(Action::Attack, &v).unwrap());
        assert!(gate.request(Action::Ability(0), &v).unwrap());

        v.spend_mana(25.0, false);
        let revoked = gate.revoke_unaffordable(&v);
        assert_eq!(revoked, vec![Action::Ability(0)]);
        assert!(gate.has_intent(Action::Attack).unwrap());
        assert!(!gate.has_intent(Action::Ability(0)).unwrap());
    }

    #[test]
    fn test_ammo_runs_out_and_refills() {
        let mut gate = gate();
        let mut v = vitals();
        assert!(gate.request(Action::Ability(1), &v).unwrap());
        assert!(gate.commit(Action::Ability(1), &mut v).unwrap());
        assert_eq!(gate.ammo(1).unwrap(), Some(0));
        assert!(!gate.request(Action::Ability(1), &v).unwrap());

        gate.refill(1, 3).unwrap();
        assert!(gate.can_perform(Action::Ability(1), &v).unwrap());
    }
}
