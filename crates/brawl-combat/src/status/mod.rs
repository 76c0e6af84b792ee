//! Status effects and their per-target scheduler.

pub mod effect;
pub mod manager;

pub use effect::{EffectTarget, EffectType, HitSource, StatusEffect, TickScope};
pub use manager::{AddOutcome, StatusEffectManager};
