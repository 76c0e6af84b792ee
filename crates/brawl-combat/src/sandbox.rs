//! In-memory collaborators for tests and headless hosts.
//!
//! Nothing here is needed by the combat core itself. These stand in for the
//! engine-side presentation, feedback and physics services.

use std::collections::HashMap;

use brawl_common::{ClipId, EntityId, EntityKind, EntityTags, LayerMask, ParticleId, TeamId, Vec2};

use crate::services::{
    EntityDirectory, FeedbackService, InteractionTable, PhysicsQuery, PresentationSink, RaycastHit,
    Signal, StateTag, Transform,
};

// ============================================================================
// Presentation
// ============================================================================

/// One recorded presentation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PresentationCall {
    /// `set_float`
    Float(EntityId, Signal, f32),
    /// `set_int`
    Int(EntityId, Signal, i32),
    /// `set_bool`
    Bool(EntityId, Signal, bool),
    /// `trigger`
    Trigger(EntityId, Signal),
}

/// Presentation sink that records every call.
#[derive(Debug, Default)]
pub struct RecordingPresentation {
    calls: Vec<PresentationCall>,
    state_tags: HashMap<EntityId, Vec<StateTag>>,
}

impl RecordingPresentation {
    /// Every call in order.
    #[must_use]
    pub fn calls(&self) -> &[PresentationCall] {
        &self.calls
    }

    /// Forgets recorded calls.
    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Sets the state tags `is_state_tagged` answers for.
    pub fn set_state_tags(&mut self, entity: EntityId, tags: Vec<StateTag>) {
        self.state_tags.insert(entity, tags);
    }

    /// Last float pushed for a signal.
    #[must_use]
    pub fn last_float(&self, entity: EntityId, signal: Signal) -> Option<f32> {
        self.calls.iter().rev().find_map(|c| match *c {
            PresentationCall::Float(e, s, v) if e == entity && s == signal => Some(v),
            _ => None,
        })
    }

    /// Last integer pushed for a signal.
    #[must_use]
    pub fn last_int(&self, entity: EntityId, signal: Signal) -> Option<i32> {
        self.calls.iter().rev().find_map(|c| match *c {
            PresentationCall::Int(e, s, v) if e == entity && s == signal => Some(v),
            _ => None,
        })
    }

    /// Last boolean pushed for a signal.
    #[must_use]
    pub fn last_bool(&self, entity: EntityId, signal: Signal) -> Option<bool> {
        self.calls.iter().rev().find_map(|c| match *c {
            PresentationCall::Bool(e, s, v) if e == entity && s == signal => Some(v),
            _ => None,
        })
    }

    /// Number of times a trigger fired.
    #[must_use]
    pub fn trigger_count(&self, entity: EntityId, signal: Signal) -> usize {
        self.calls
            .iter()
            .filter(|c| **c == PresentationCall::Trigger(entity, signal))
            .count()
    }

    /// True if a trigger fired at least once.
    #[must_use]
    pub fn was_triggered(&self, entity: EntityId, signal: Signal) -> bool {
        self.trigger_count(entity, signal) > 0
    }
}

impl PresentationSink for RecordingPresentation {
    fn set_float(&mut self, entity: EntityId, signal: Signal, value: f32) {
        self.calls.push(PresentationCall::Float(entity, signal, value));
    }

    fn set_int(&mut self, entity: EntityId, signal: Signal, value: i32) {
        self.calls.push(PresentationCall::Int(entity, signal, value));
    }

    fn set_bool(&mut self, entity: EntityId, signal: Signal, value: bool) {
        self.calls.push(PresentationCall::Bool(entity, signal, value));
    }

    fn trigger(&mut self, entity: EntityId, signal: Signal) {
        self.calls.push(PresentationCall::Trigger(entity, signal));
    }

    fn is_state_tagged(&self, entity: EntityId, tag: StateTag) -> bool {
        self.state_tags
            .get(&entity)
            .is_some_and(|tags| tags.contains(&tag))
    }
}

// ============================================================================
// Feedback
// ============================================================================

/// Feedback service that records playback requests.
#[derive(Debug, Default)]
pub struct RecordingFeedback {
    /// Clips played, in order.
    pub audio: Vec<ClipId>,
    /// Particle effects spawned, in order.
    pub particles: Vec<(ParticleId, Vec2, Vec2)>,
}

impl FeedbackService for RecordingFeedback {
    fn play_audio(&mut self, clip: ClipId) {
        self.audio.push(clip);
    }

    fn play_particle(&mut self, effect: ParticleId, position: Vec2, direction: Vec2) {
        self.particles.push((effect, position, direction));
    }
}

// ============================================================================
// Directory
// ============================================================================

#[derive(Debug, Clone)]
struct DirectoryEntry {
    transform: Transform,
    tags: EntityTags,
    team: TeamId,
    interactions: InteractionTable,
    destroyed: bool,
}

/// Fixed entity directory for unit tests.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    entries: HashMap<EntityId, DirectoryEntry>,
}

impl StaticDirectory {
    /// Places a neutral character with a silent interaction table.
    pub fn place(&mut self, id: EntityId, position: Vec2, facing: Vec2) {
        self.insert(id, EntityKind::Character, TeamId::NEUTRAL, Transform::new(position, facing));
    }

    /// Inserts an entity of the given kind.
    pub fn insert(&mut self, id: EntityId, kind: EntityKind, team: TeamId, transform: Transform) {
        self.entries.insert(
            id,
            DirectoryEntry {
                transform,
                tags: kind.lattice(),
                team,
                interactions: InteractionTable::silent(),
                destroyed: false,
            },
        );
    }

    /// Replaces an entity's interaction table.
    pub fn set_interactions(&mut self, id: EntityId, table: InteractionTable) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.interactions = table;
        }
    }

    /// Marks an entity dead.
    pub fn mark_destroyed(&mut self, id: EntityId) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.destroyed = true;
        }
    }

    /// Removes an entity.
    pub fn remove(&mut self, id: EntityId) {
        self.entries.remove(&id);
    }
}

impl EntityDirectory for StaticDirectory {
    fn transform(&self, id: EntityId) -> Option<Transform> {
        self.entries.get(&id).map(|e| e.transform)
    }

    fn tags(&self, id: EntityId) -> EntityTags {
        self.entries.get(&id).map_or(EntityTags::empty(), |e| e.tags)
    }

    fn team(&self, id: EntityId) -> Option<TeamId> {
        self.entries.get(&id).map(|e| e.team)
    }

    fn interactions(&self, id: EntityId) -> Option<&InteractionTable> {
        self.entries.get(&id).map(|e| &e.interactions)
    }

    fn is_destroyed(&self, id: EntityId) -> bool {
        self.entries.get(&id).is_some_and(|e| e.destroyed)
    }
}

// ============================================================================
// Physics
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Circle {
    root: EntityId,
    center: Vec2,
    radius: f32,
    layer: LayerMask,
}

/// Circle-collider physics world.
///
/// Each root owns any number of circles. Queries return hits ordered by
/// distance, ties broken by insertion order.
#[derive(Debug, Default)]
pub struct CircleWorld {
    circles: Vec<Circle>,
}

impl CircleWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a circle collider owned by `root`.
    pub fn add_circle(&mut self, root: EntityId, center: Vec2, radius: f32, layer: LayerMask) {
        self.circles.push(Circle {
            root,
            center,
            radius,
            layer,
        });
    }

    /// Moves every circle of `root` by the same offset so the first lands on
    /// `center`.
    pub fn move_root(&mut self, root: EntityId, center: Vec2) {
        let Some(first) = self.circles.iter().find(|c| c.root == root) else {
            return;
        };
        let offset = center - first.center;
        for circle in self.circles.iter_mut().filter(|c| c.root == root) {
            circle.center += offset;
        }
    }

    /// Removes every circle of `root`.
    pub fn remove_root(&mut self, root: EntityId) {
        self.circles.retain(|c| c.root != root);
    }

    /// Number of colliders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.circles.len()
    }

    /// True if there are no colliders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.circles.is_empty()
    }

    fn sorted(mut hits: Vec<RaycastHit>) -> Vec<RaycastHit> {
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

/// Entry distance of segment `from + t * d` (t in `[0, 1]`) into a circle.
fn segment_entry(from: Vec2, to: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let d = to - from;
    let f = from - center;
    let c = f.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    let a = d.length_squared();
    if a <= f32::EPSILON {
        return None;
    }
    let b = 2.0 * f.dot(d);
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()) / (2.0 * a);
    (0.0..=1.0).contains(&t).then_some(t)
}

impl PhysicsQuery for CircleWorld {
    fn segment_cast(&self, from: Vec2, to: Vec2, layers: LayerMask) -> Vec<RaycastHit> {
        let length = (to - from).length();
        let hits = self
            .circles
            .iter()
            .filter(|c| layers.intersects(c.layer))
            .filter_map(|c| {
                let t = segment_entry(from, to, c.center, c.radius)?;
                let point = from.lerp(to, t);
                Some(RaycastHit {
                    root: c.root,
                    point,
                    normal: (point - c.center).normalize_or_zero(),
                    distance: t * length,
                })
            })
            .collect();
        Self::sorted(hits)
    }

    fn overlap_circle(&self, center: Vec2, radius: f32, layers: LayerMask) -> Vec<RaycastHit> {
        let hits = self
            .circles
            .iter()
            .filter(|c| layers.intersects(c.layer))
            .filter_map(|c| {
                let between = c.center - center;
                let distance = between.length();
                if distance > radius + c.radius {
                    return None;
                }
                let normal = between.normalize_or_zero();
                Some(RaycastHit {
                    root: c.root,
                    point: center + normal * distance.min(radius),
                    normal: -normal,
                    distance,
                })
            })
            .collect();
        Self::sorted(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_cast_orders_by_distance() {
        let mut world = CircleWorld::new();
        let far = EntityId::from_raw(1);
        let near = EntityId::from_raw(2);
        world.add_circle(far, Vec2::new(8.0, 0.0), 1.0, LayerMask::BODIES);
        world.add_circle(near, Vec2::new(4.0, 0.0), 1.0, LayerMask::BODIES);

        let hits = world.segment_cast(Vec2::ZERO, Vec2::new(10.0, 0.0), LayerMask::all());
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].root, near);
        assert!((hits[0].distance - 3.0).abs() < 1e-4);
        assert_eq!(hits[1].root, far);
    }

    #[test]
    fn test_segment_cast_filters_layers() {
        let mut world = CircleWorld::new();
        world.add_circle(EntityId::from_raw(1), Vec2::new(2.0, 0.0), 1.0, LayerMask::TERRAIN);
        assert!(world
            .segment_cast(Vec2::ZERO, Vec2::new(5.0, 0.0), LayerMask::BODIES)
            .is_empty());
    }

    #[test]
    fn test_segment_starting_inside_hits_at_zero() {
        let mut world = CircleWorld::new();
        world.add_circle(EntityId::from_raw(1), Vec2::ZERO, 1.0, LayerMask::BODIES);
        let hits = world.segment_cast(Vec2::ZERO, Vec2::new(0.1, 0.0), LayerMask::all());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].distance, 0.0);
    }

    #[test]
    fn test_short_segment_misses() {
        let mut world = CircleWorld::new();
        world.add_circle(EntityId::from_raw(1), Vec2::new(5.0, 0.0), 1.0, LayerMask::BODIES);
        assert!(world
            .segment_cast(Vec2::ZERO, Vec2::new(2.0, 0.0), LayerMask::all())
            .is_empty());
    }

    #[test]
    fn test_overlap_circle() {
        let mut world = CircleWorld::new();
        let root = EntityId::from_raw(1);
        world.add_circle(root, Vec2::new(1.5, 0.0), 1.0, LayerMask::BODIES);
        assert_eq!(world.overlap_circle(Vec2::ZERO, 1.0, LayerMask::all()).len(), 1);
        world.move_root(root, Vec2::new(5.0, 0.0));
        assert!(world.overlap_circle(Vec2::ZERO, 1.0, LayerMask::all()).is_empty());
    }

    #[test]
    fn test_recording_presentation_queries() {
        let mut p = RecordingPresentation::default();
        let e = EntityId::from_raw(1);
        p.set_float(e, Signal::Health, 10.0);
        p.set_float(e, Signal::Health, 5.0);
        p.trigger(e, Signal::Death);
        assert_eq!(p.last_float(e, Signal::Health), Some(5.0));
        assert_eq!(p.trigger_count(e, Signal::Death), 1);
        assert!(!p.is_state_tagged(e, StateTag::Idle));
        p.set_state_tags(e, vec![StateTag::Idle]);
        assert!(p.is_state_tagged(e, StateTag::Idle));
    }
}
