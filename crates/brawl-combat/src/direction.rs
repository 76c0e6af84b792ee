//! Direction policies for knockback, launch, knockdown and particles.

use brawl_common::{EntityId, Vec2};
use serde::{Deserialize, Serialize};

use crate::services::{EntityDirectory, Transform};

/// Selects which vector drives a directional effect.
///
/// One enum serves knockback, launch, knockdown and particle direction. The
/// four use sites are independent; a weapon part may knock back radially
/// while launching along the source's facing.
///
/// Variants without the `Curr` prefix read the snapshot captured when the
/// effect was created. `Curr` variants query the live transform and fall back
/// to the snapshot once the entity is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnockbackType {
    /// No direction.
    None,
    /// Origin's facing at creation.
    OriginFacing,
    /// From the origin toward the target, at creation.
    OriginRadial,
    /// Source's facing at creation.
    SourceFacing,
    /// From the source toward the target, at creation.
    #[default]
    SourceRadial,
    /// Origin's live facing.
    CurrOriginFacing,
    /// From the origin's live position toward the target's.
    CurrOriginRadial,
    /// Source's live facing.
    CurrSourceFacing,
    /// From the source's live position toward the target's.
    CurrSourceRadial,
    /// Direction supplied by whoever built the effect.
    ExternalDir,
}

/// Per-use-site direction policies of one hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionPolicies {
    /// Knockback impulse direction.
    pub knockback: KnockbackType,
    /// Launch impulse direction.
    pub launch: KnockbackType,
    /// Knockdown impulse direction.
    pub knock_down: KnockbackType,
    /// Particle spray direction.
    pub particle: KnockbackType,
}

/// Origin, source and target placement captured when an effect is created.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Origin transform (substituted by the source if the origin was gone).
    pub origin: Transform,
    /// Source transform (substituted by the origin if the source was gone).
    pub source: Transform,
    /// Target transform.
    pub target: Transform,
}

impl Snapshot {
    /// Captures the current transforms.
    ///
    /// A missing origin is replaced by the source and vice versa; if both are
    /// gone the target stands in, which makes radial directions zero.
    #[must_use]
    pub fn capture(
        directory: &dyn EntityDirectory,
        origin: Option<EntityId>,
        source: Option<EntityId>,
        target: EntityId,
    ) -> Self {
        let target = directory.transform(target).unwrap_or_default();
        let origin_tf = origin.and_then(|id| directory.transform(id));
        let source_tf = source.and_then(|id| directory.transform(id));
        let origin = origin_tf.or(source_tf).unwrap_or(target);
        let source = source_tf.or(origin_tf).unwrap_or(target);
        Self {
            origin,
            source,
            target,
        }
    }
}

/// Everything needed to resolve a [`KnockbackType`] into a vector.
#[derive(Debug, Clone, Copy)]
pub struct DirectionContext {
    /// Root cause of the hit.
    pub origin: Option<EntityId>,
    /// Proximate cause of the hit.
    pub source: Option<EntityId>,
    /// Entity receiving the hit.
    pub target: EntityId,
    /// Placement at creation.
    pub snapshot: Snapshot,
    /// Externally supplied direction.
    pub external: Vec2,
}

impl DirectionContext {
    /// Resolves a policy into a unit vector (or zero).
    #[must_use]
    pub fn resolve(&self, policy: KnockbackType, directory: &dyn EntityDirectory) -> Vec2 {
        let snap = &self.snapshot;
        match policy {
            KnockbackType::None => Vec2::ZERO,
            KnockbackType::OriginFacing => snap.origin.facing,
            KnockbackType::OriginRadial => radial(snap.origin.position, snap.target.position),
            KnockbackType::SourceFacing => snap.source.facing,
            KnockbackType::SourceRadial => radial(snap.source.position, snap.target.position),
            KnockbackType::CurrOriginFacing => live(self.origin, directory)
                .map_or(snap.origin.facing, |t| t.facing),
            KnockbackType::CurrOriginRadial => {
                let from = live(self.origin, directory)
                    .map_or(snap.origin.position, |t| t.position);
                radial(from, self.live_target_position(directory))
            }
            KnockbackType::CurrSourceFacing => live(self.source, directory)
                .map_or(snap.source.facing, |t| t.facing),
            KnockbackType::CurrSourceRadial => {
                let from = live(self.source, directory)
                    .map_or(snap.source.position, |t| t.position);
                radial(from, self.live_target_position(directory))
            }
            KnockbackType::ExternalDir => self.external.normalize_or_zero(),
        }
    }

    fn live_target_position(&self, directory: &dyn EntityDirectory) -> Vec2 {
        directory
            .transform(self.target)
            .map_or(self.snapshot.target.position, |t| t.position)
    }
}

fn live(id: Option<EntityId>, directory: &dyn EntityDirectory) -> Option<Transform> {
    id.and_then(|id| directory.transform(id))
}

fn radial(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InteractionTable;
    use brawl_common::{EntityTags, TeamId};
    use std::collections::HashMap;

    #[derive(Default)]
    struct Positions(HashMap<EntityId, Transform>);

    impl EntityDirectory for Positions {
        fn transform(&self, id: EntityId) -> Option<Transform> {
            self.0.get(&id).copied()
        }
        fn tags(&self, _id: EntityId) -> EntityTags {
            EntityTags::empty()
        }
        fn team(&self, _id: EntityId) -> Option<TeamId> {
            None
        }
        fn interactions(&self, _id: EntityId) -> Option<&InteractionTable> {
            None
        }
    }

    fn setup() -> (Positions, EntityId, EntityId) {
        let attacker = EntityId::from_raw(1);
        let target = EntityId::from_raw(2);
        let mut dir = Positions::default();
        dir.0.insert(attacker, Transform::new(Vec2::ZERO, Vec2::Y));
        dir.0.insert(target, Transform::new(Vec2::new(5.0, 0.0), Vec2::NEG_X));
        (dir, attacker, target)
    }

    #[test]
    fn test_radial_and_facing() {
        let (dir, attacker, target) = setup();
        let snapshot = Snapshot::capture(&dir, Some(attacker), Some(attacker), target);
        let ctx = DirectionContext {
            origin: Some(attacker),
            source: Some(attacker),
            target,
            snapshot,
            external: Vec2::ZERO,
        };
        assert_eq!(ctx.resolve(KnockbackType::SourceRadial, &dir), Vec2::X);
        assert_eq!(ctx.resolve(KnockbackType::OriginFacing, &dir), Vec2::Y);
        assert_eq!(ctx.resolve(KnockbackType::None, &dir), Vec2::ZERO);
    }

    #[test]
    fn test_snapshot_ignores_later_movement() {
        let (mut dir, attacker, target) = setup();
        let snapshot = Snapshot::capture(&dir, Some(attacker), Some(attacker), target);
        let ctx = DirectionContext {
            origin: Some(attacker),
            source: Some(attacker),
            target,
            snapshot,
            external: Vec2::ZERO,
        };
        dir.0.insert(attacker, Transform::new(Vec2::new(5.0, 5.0), Vec2::X));
        assert_eq!(ctx.resolve(KnockbackType::SourceRadial, &dir), Vec2::X);
        assert_eq!(ctx.resolve(KnockbackType::CurrSourceRadial, &dir), Vec2::NEG_Y);
        assert_eq!(ctx.resolve(KnockbackType::CurrSourceFacing, &dir), Vec2::X);
    }

    #[test]
    fn test_curr_falls_back_when_gone() {
        let (mut dir, attacker, target) = setup();
        let snapshot = Snapshot::capture(&dir, Some(attacker), Some(attacker), target);
        let ctx = DirectionContext {
            origin: Some(attacker),
            source: Some(attacker),
            target,
            snapshot,
            external: Vec2::ZERO,
        };
        dir.0.remove(&attacker);
        assert_eq!(ctx.resolve(KnockbackType::CurrOriginFacing, &dir), Vec2::Y);
        assert_eq!(ctx.resolve(KnockbackType::CurrOriginRadial, &dir), Vec2::X);
    }

    #[test]
    fn test_missing_source_substitutes_origin() {
        let (dir, attacker, target) = setup();
        let gone = EntityId::from_raw(99);
        let snapshot = Snapshot::capture(&dir, Some(attacker), Some(gone), target);
        assert_eq!(snapshot.source, snapshot.origin);
    }

    #[test]
    fn test_external_direction_is_normalized() {
        let (dir, _, target) = setup();
        let ctx = DirectionContext {
            origin: None,
            source: None,
            target,
            snapshot: Snapshot::default(),
            external: Vec2::new(0.0, -3.0),
        };
        assert_eq!(ctx.resolve(KnockbackType::ExternalDir, &dir), Vec2::NEG_Y);
    }
}
