//! Combat contract violations.
//!
//! Expected gameplay conditions (rejected collisions, resource underflow,
//! degenerate timings, double destruction) never produce one of these; they
//! are recovered where they happen. These errors mean the caller referenced
//! something that was never set up.

use brawl_common::EntityId;
use thiserror::Error;

/// Combat system error types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CombatError {
    /// Entity not registered with the world
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),
    /// Entity exists but has no stat economy
    #[error("entity {0} is not a combatant")]
    NotACombatant(EntityId),
    /// Ability slot never registered on the action gate
    #[error("unknown ability slot {slot} ({registered} registered)")]
    UnknownAbilitySlot {
        /// Requested slot
        slot: usize,
        /// Number of registered slots
        registered: usize,
    },
    /// Weapon part index out of range
    #[error("unknown weapon part {part} ({parts} parts)")]
    UnknownWeaponPart {
        /// Requested part
        part: usize,
        /// Number of parts on the weapon
        parts: usize,
    },
    /// Entity wields no weapon
    #[error("entity {0} has no weapon equipped")]
    NoWeapon(EntityId),
    /// Interaction table does not cover every interaction type
    #[error("interaction table has {actual} entries, expected {expected}")]
    InteractionTableIncomplete {
        /// Entries required
        expected: usize,
        /// Entries supplied
        actual: usize,
    },    /// Spawn was handed a config that fails validation
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type for combat operations.
pub type CombatResult<T> = Result<T, CombatError>;

impl From<crate::config::ConfigError> for CombatError {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

impl From<CombatError> for brawl_common::BrawlError {
    fn from(err: CombatError) -> Self {
        Self::Combat(err.to_string())
    }
}
