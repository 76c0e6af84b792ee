//! Swept collision nodes of weapon parts.
//!
//! Each weapon part carries a sequence of nodes at fixed offsets. Every frame
//! the nodes take their new world position, and a segment is cast from the
//! previous position to the current one. Sweeping instead of sampling keeps
//! fast swings from tunnelling through thin targets.

use brawl_common::{EntityId, LayerMask, Vec2};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{CombatError, CombatResult};
use crate::services::{PhysicsQuery, RaycastHit};

/// World placement of one weapon part.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PartPose {
    /// Part pivot in world space.
    pub origin: Vec2,
    /// Rotation in radians.
    pub rotation: f32,
}

impl PartPose {
    /// Creates a pose.
    #[must_use]
    pub const fn new(origin: Vec2, rotation: f32) -> Self {
        Self { origin, rotation }
    }

    /// Maps a part-local offset into world space.
    #[must_use]
    pub fn apply(&self, offset: Vec2) -> Vec2 {
        self.origin + Vec2::from_angle(self.rotation).rotate(offset)
    }
}

/// A point on a weapon part tracked across frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionNode {
    offset: Vec2,
    prev: Option<Vec2>,
    curr: Option<Vec2>,
}

impl CollisionNode {
    /// Creates a node at a part-local offset.
    #[must_use]
    pub const fn new(offset: Vec2) -> Self {
        Self {
            offset,
            prev: None,
            curr: None,
        }
    }

    /// Part-local offset.
    #[must_use]
    pub const fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Shifts current to previous and takes a new current position.
    pub fn snapshot(&mut self, pose: &PartPose) {
        self.prev = self.curr;
        self.curr = Some(pose.apply(self.offset));
    }

    /// Forgets both positions.
    pub fn reset(&mut self) {
        self.prev = None;
        self.curr = None;
    }

    /// Segment travelled since the last snapshot, once two exist.
    #[must_use]
    pub fn segment(&self) -> Option<(Vec2, Vec2)> {
        Some((self.prev?, self.curr?))
    }
}

/// Raw geometric hit of one weapon part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    /// Index of the part whose node hit.
    pub part: usize,
    /// Physics result.
    pub hit: RaycastHit,
    /// Start of the swept segment.
    pub origin: Vec2,
    /// Unit direction of the sweep.
    pub direction: Vec2,
}

/// Node sets of every part of one weapon.
#[derive(Debug, Clone, Default)]
pub struct CollisionNodeManager {
    parts: Vec<Vec<CollisionNode>>,
}

impl CollisionNodeManager {
    /// Creates nodes from per-part offset lists.
    #[must_use]
    pub fn new<'a>(parts: impl IntoIterator<Item = &'a [Vec2]>) -> Self {
        Self {
            parts: parts
                .into_iter()
                .map(|offsets| offsets.iter().copied().map(CollisionNode::new).collect())
                .collect(),
        }
    }

    /// Number of parts.
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Nodes of one part.
    pub fn nodes(&self, part: usize) -> CombatResult<&[CollisionNode]> {
        self.parts
            .get(part)
            .map(Vec::as_slice)
            .ok_or(CombatError::UnknownWeaponPart {
                part,
                parts: self.parts.len(),
            })
    }

    /// Snapshots every node of every part; `poses[i]` places part `i`.
    pub fn snapshot(&mut self, poses: &[PartPose]) {
        for (nodes, pose) in self.parts.iter_mut().zip(poses) {
            for node in nodes {
                node.snapshot(pose);
            }
        }
    }

    /// Forgets every node position.
    pub fn reset(&mut self) {
        for node in self.parts.iter_mut().flatten() {
            node.reset();
        }
    }

    /// Casts every node segment and collects hits in declaration order.
    ///
    /// Hits on `wielder` are dropped, and each root is reported at most once
    /// per call no matter how many nodes or parts touched it.
    pub fn sweep(
        &self,
        physics: &dyn PhysicsQuery,
        wielder: EntityId,
        layers: LayerMask,
    ) -> Vec<SweepHit> {
        let mut ignore: Vec<EntityId> = Vec::new();
        let mut hits = Vec::new();
        for (part, nodes) in self.parts.iter().enumerate() {
            for (from, to) in nodes.iter().filter_map(CollisionNode::segment) {
                for hit in physics.segment_cast(from, to, layers) {
                    if hit.root == wielder || ignore.contains(&hit.root) {
                        continue;
                    }
                    trace!("Part {} swept into {}", part, hit.root);
                    ignore.push(hit.root);
                    hits.push(SweepHit {
                        part,
                        hit,
                        origin: from,
                        direction: (to - from).normalize_or_zero(),
                    });
                }
            }
        }
        hits
    }
}
