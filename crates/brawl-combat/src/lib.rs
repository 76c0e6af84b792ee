//! # Brawl Combat
//!
//! Combat resolution and status-effect simulation for Brawl.
//!
//! This crate turns raw collisions into gameplay outcomes:
//! - Swept weapon collision nodes and hazard trigger overlaps
//! - Hit validation with per-activation de-duplication
//! - Damage containers and scheduled status effects (damage packets, poison, wet)
//! - Knockback, launch, knockdown and poise-break
//! - Health, stamina, mana and poise with delayed regeneration
//! - Resource-gated actions with intent revocation
//! - Hazard decay and linger teardown
//! - A combat event bus for the host
//!
//! Presentation, audio, particles and physics stay on the host side behind
//! the traits in [`services`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod collision;
pub mod combatant;
pub mod config;
pub mod damage;
pub mod direction;
pub mod error;
pub mod events;
pub mod hazard;
pub mod ledger;
pub mod motion;
pub mod resolver;
pub mod sandbox;
pub mod services;
pub mod stats;
pub mod status;
pub mod weapon;
pub mod world;


/// Prelude for convenient imports
pub mod prelude {
    pub use crate::collision::{CollisionNode, CollisionNodeManager, PartPose, SweepHit};
    pub use crate::combatant::{Combatant, FighterConfig};
    pub use crate::config::{
        Catalog, CombatTuning, ConfigError, ConfigResult, StaminaPolicy,
    };
    pub use crate::damage::{DamageContainer, DamageSpec};
    pub use crate::direction::{DirectionPolicies, KnockbackType};
    pub use crate::error::{CombatError, CombatResult};
    pub use crate::events::{CombatEvent, CombatEventBus};
    pub use crate::hazard::{BlockCheck, Hazard, HazardState, HazardStats};
    pub use crate::ledger::RecentCollisionLedger;
    pub use crate::motion::{Motion, Posture};
    pub use crate::resolver::{HitResolution, RejectReason};
    pub use crate::services::{
        EntityDirectory, FeedbackService, InteractionEntry, InteractionTable, InteractionType,
        PhysicsQuery, PresentationSink, RaycastHit, Services, Signal, StateTag, Transform,
    };
    pub use crate::stats::{Action, ActionCost, Resource, Vitals, VitalsConfig};
    pub use crate::status::{EffectType, HitSource, StatusEffect, StatusEffectManager};
    pub use crate::weapon::{Weapon, WeaponConfig, WeaponPartConfig};
    pub use crate::world::CombatWorld;
}

pub use prelude::*;
