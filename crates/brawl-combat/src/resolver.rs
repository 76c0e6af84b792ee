//! Shared outcome types of the weapon and hazard hit pipelines.

use brawl_common::{CollisionGroup, EntityId, EntityKind, EntityTags, Vec2};

use crate::status::StatusEffect;

/// Why a raw collision was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// The wielder or the hazard itself.
    SelfHit,
    /// The hazard's origin while it ignores its origin.
    IgnoredOrigin,
    /// The hazard's source while it ignores its source.
    IgnoredSource,
    /// Already credited in this activation window.
    AlreadyHit,
    /// Target category is on the ignore list.
    IgnoredKind,
    /// Geometry blocks the hit.
    Blocked,
    /// The target is already dead.
    Destroyed,
}

/// How a validated collision is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetClass {
    /// Has a stat economy; takes damage.
    Destructible,
    /// Wall or prop; feedback only.
    Obstacle,
    /// Another hazard; recorded, nothing else.
    Hazard,
    /// Anything else; no-op.
    Other,
}

impl TargetClass {
    /// Classifies by category tags.
    #[must_use]
    pub fn of(tags: EntityTags) -> Self {
        if tags.is(EntityKind::Destructible) {
            Self::Destructible
        } else if tags.is(EntityKind::Obstacle) {
            Self::Obstacle
        } else if tags.is(EntityKind::Hazard) {
            Self::Hazard
        } else {
            Self::Other
        }
    }
}

/// Outcome of one raw collision.
#[derive(Debug, Clone)]
pub enum HitResolution {
    /// Dropped during validation.
    Rejected(RejectReason),
    /// Validated but the target category does nothing.
    Ignored,
    /// Queue these effects on a destructible target.
    Damage {
        /// Target entity.
        target: EntityId,
        /// Group credited.
        group: CollisionGroup,
        /// Effects to enqueue, in order.
        effects: Vec<StatusEffect>,
    },
    /// Play obstacle feedback.
    Obstacle {
        /// Obstacle entity.
        obstacle: EntityId,
        /// Contact point.
        point: Vec2,
        /// Direction of travel.
        direction: Vec2,
    },
    /// Struck another hazard.
    Hazard {
        /// Other hazard.
        other: EntityId,
    },
}

impl HitResolution {
    /// True unless the collision was rejected.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}
