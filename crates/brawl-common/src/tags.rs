//! Entity category lattice and physics layers.
//!
//! Every entity carries a fixed set of category tags. A player answers true
//! for `ACTOR`, `DESTRUCTIBLE`, `CHARACTER` and `PLAYER` at once; membership
//! is a bit test rather than a chain of name comparisons.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Category tags an entity answers to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EntityTags: u16 {
        /// Anything simulated by the combat core.
        const ACTOR = 1 << 0;
        /// Has a stat economy and a status-effect manager.
        const DESTRUCTIBLE = 1 << 1;
        /// A fighter.
        const CHARACTER = 1 << 2;
        /// A player-controlled fighter.
        const PLAYER = 1 << 3;
        /// Walls and props that weapons bounce off.
        const OBSTACLE = 1 << 4;
        /// Deals damage on contact.
        const HAZARD = 1 << 5;
        /// Moving hazard.
        const PROJECTILE = 1 << 6;
        /// Burst hazard.
        const EXPLOSION = 1 << 7;
        /// Lingering area hazard.
        const EFFECT_FIELD = 1 << 8;
    }
}

impl Default for EntityTags {
    fn default() -> Self {
        Self::empty()
    }
}

impl EntityTags {
    /// Checks membership in a category.
    #[must_use]
    pub fn is(self, kind: EntityKind) -> bool {
        self.contains(kind.own_tag())
    }
}

/// Concrete kind of an entity; expands to its full ancestor closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Bare actor.
    Actor,
    /// Breakable prop with health.
    Destructible,
    /// Non-player fighter.
    Character,
    /// Player fighter.
    Player,
    /// Wall or static prop.
    Obstacle,
    /// Generic hazard body.
    Hazard,
    /// Thrown or fired hazard.
    Projectile,
    /// Burst hazard.
    Explosion,
    /// Lingering area hazard.
    EffectField,
}

impl EntityKind {
    /// Tag that identifies this kind alone.
    #[must_use]
    pub const fn own_tag(self) -> EntityTags {
        match self {
            Self::Actor => EntityTags::ACTOR,
            Self::Destructible => EntityTags::DESTRUCTIBLE,
            Self::Character => EntityTags::CHARACTER,
            Self::Player => EntityTags::PLAYER,
            Self::Obstacle => EntityTags::OBSTACLE,
            Self::Hazard => EntityTags::HAZARD,
            Self::Projectile => EntityTags::PROJECTILE,
            Self::Explosion => EntityTags::EXPLOSION,
            Self::EffectField => EntityTags::EFFECT_FIELD,
        }
    }

    /// Full tag set: this kind plus every category above it.
    #[must_use]
    pub const fn lattice(self) -> EntityTags {
        match self {
            Self::Actor => EntityTags::ACTOR,
            Self::Destructible => EntityTags::ACTOR.union(EntityTags::DESTRUCTIBLE),
            Self::Character => Self::Destructible.lattice().union(EntityTags::CHARACTER),
            Self::Player => Self::Character.lattice().union(EntityTags::PLAYER),
            Self::Obstacle => EntityTags::OBSTACLE,
            Self::Hazard => EntityTags::ACTOR.union(EntityTags::HAZARD),
            Self::Projectile => Self::Hazard.lattice().union(EntityTags::PROJECTILE),
            Self::Explosion => Self::Hazard.lattice().union(EntityTags::EXPLOSION),
            Self::EffectField => Self::Hazard.lattice().union(EntityTags::EFFECT_FIELD),
        }
    }
}

bitflags! {
    /// Physics layers used to filter sweeps and overlaps.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct LayerMask: u8 {
        /// Fighters and destructible props.
        const BODIES = 1 << 0;
        /// Walls and static props.
        const OBSTACLES = 1 << 1;
        /// Hazard bodies.
        const HAZARDS = 1 << 2;
        /// Static level geometry.
        const TERRAIN = 1 << 3;
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_lattice() {
        let tags = EntityKind::Player.lattice();
        assert!(tags.is(EntityKind::Actor));
        assert!(tags.is(EntityKind::Destructible));
        assert!(tags.is(EntityKind::Character));
        assert!(tags.is(EntityKind::Player));
        assert!(!tags.is(EntityKind::Hazard));
    }

    #[test]
    fn test_projectile_is_hazard_not_destructible() {
        let tags = EntityKind::Projectile.lattice();
        assert!(tags.is(EntityKind::Hazard));
        assert!(!tags.is(EntityKind::Destructible));
    }

    #[test]
    fn test_obstacle_is_not_actor() {
        assert!(!EntityKind::Obstacle.lattice().is(EntityKind::Actor));
    }

    #[test]
    fn test_tags_parse_from_toml() {
        #[derive(Deserialize)]
        struct Row {
            tags: EntityTags,
        }
        let row: Row = toml::from_str(r#"tags = "OBSTACLE | HAZARD""#).unwrap();
        assert_eq!(row.tags, EntityTags::OBSTACLE | EntityTags::HAZARD);
    }
}
