//! Collaborator contracts consumed by the combat core.
//!
//! The core never owns presentation, audio, particles or physics. Hosts hand
//! implementations in through [`Services`] and the query traits on every
//! call, so the core can be built and tested without any of them existing.

use brawl_common::{ClipId, EntityId, EntityKind, EntityTags, LayerMask, ParticleId, TeamId, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::{CombatError, CombatResult};

/// Position and facing of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    /// World position.
    pub position: Vec2,
    /// Unit facing vector.
    pub facing: Vec2,
}

impl Transform {
    /// Creates a transform; the facing is normalized.
    #[must_use]
    pub fn new(position: Vec2, facing: Vec2) -> Self {
        Self {
            position,
            facing: facing.normalize_or_zero(),
        }
    }
}

/// Read-only view of entity identity and placement.
pub trait EntityDirectory {
    /// Current transform, or `None` once the entity is gone.
    fn transform(&self, id: EntityId) -> Option<Transform>;
    /// Category tags; empty once the entity is gone.
    fn tags(&self, id: EntityId) -> EntityTags;
    /// Team the entity fights for.
    fn team(&self, id: EntityId) -> Option<TeamId>;
    /// Interaction clip/particle table.
    fn interactions(&self, id: EntityId) -> Option<&InteractionTable>;

    /// Checks category membership.
    fn is(&self, id: EntityId, kind: EntityKind) -> bool {
        self.tags(id).is(kind)
    }

    /// True once a destructible entity has died. Dead entities stay
    /// registered (corpses still block and still have transforms) but take
    /// no further hits.
    fn is_destroyed(&self, _id: EntityId) -> bool {
        false
    }
}

/// Named signals pushed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// Current health.
    Health,
    /// Current stamina.
    Stamina,
    /// Current mana.
    Mana,
    /// Accumulated poise damage.
    PoiseDamage,
    /// Poise broke.
    Stagger,
    /// Launched into the air.
    Launch,
    /// Animation speed modifier for the launch arc.
    LaunchSpeed,
    /// Knocked to the ground.
    KnockDown,
    /// Animation speed modifier for the knockdown.
    KnockDownSpeed,
    /// Weapon bounced off an obstacle.
    BouncePower,
    /// Hits landed by the current weapon.
    HitCount,
    /// Wet status on or off.
    Wet,
    /// Entity died.
    Death,
    /// Hazard started decaying.
    Decay,
}

impl Signal {
    /// Parameter name as used by animation controllers.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Health => "Health",
            Self::Stamina => "Stamina",
            Self::Mana => "Mana",
            Self::PoiseDamage => "PoiseDamage",
            Self::Stagger => "Stagger",
            Self::Launch => "Launch",
            Self::LaunchSpeed => "LaunchSpeed",
            Self::KnockDown => "KnockDown",
            Self::KnockDownSpeed => "KnockDownSpeed",
            Self::BouncePower => "BouncePower",
            Self::HitCount => "HitCount",
            Self::Wet => "Wet",
            Self::Death => "Death",
            Self::Decay => "Decay",
        }
    }
}

/// Animation state tags the core may ask about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateTag {
    /// Standing still.
    Idle,
    /// Sprinting.
    Sprint,
    /// Inside an attack state.
    Attack,
}

/// Sink for animation/UI signals.
pub trait PresentationSink {
    /// Sets a float parameter.
    fn set_float(&mut self, entity: EntityId, signal: Signal, value: f32);
    /// Sets an integer parameter.
    fn set_int(&mut self, entity: EntityId, signal: Signal, value: i32);
    /// Sets a boolean parameter.
    fn set_bool(&mut self, entity: EntityId, signal: Signal, value: bool);
    /// Fires a one-shot trigger.
    fn trigger(&mut self, entity: EntityId, signal: Signal);

    /// Gating query: is the entity's current animation state tagged `tag`.
    fn is_state_tagged(&self, _entity: EntityId, _tag: StateTag) -> bool {
        false
    }
}

/// Fire-and-forget audio and particle playback.
pub trait FeedbackService {
    /// Plays an audio clip.
    fn play_audio(&mut self, clip: ClipId);
    /// Spawns a particle effect.
    fn play_particle(&mut self, effect: ParticleId, position: Vec2, direction: Vec2);
}

/// Per-call bundle of the mutable collaborators.
pub struct Services<'a> {
    /// Animation/UI sink.
    pub presentation: &'a mut dyn PresentationSink,
    /// Audio/particle playback.
    pub feedback: &'a mut dyn FeedbackService,
}

impl<'a> Services<'a> {
    /// Bundles the collaborators.
    pub fn new(
        presentation: &'a mut dyn PresentationSink,
        feedback: &'a mut dyn FeedbackService,
    ) -> Self {
        Self {
            presentation,
            feedback,
        }
    }
}

/// Result of a physics query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaycastHit {
    /// Root entity owning the collider that was hit.
    pub root: EntityId,
    /// Contact point.
    pub point: Vec2,
    /// Surface normal at the contact.
    pub normal: Vec2,
    /// Distance from the query origin.
    pub distance: f32,
}

/// Physics queries; both return hits ordered by distance.
pub trait PhysicsQuery {
    /// Swept segment from `from` to `to` against `layers`.
    fn segment_cast(&self, from: Vec2, to: Vec2, layers: LayerMask) -> Vec<RaycastHit>;
    /// Static circle overlap against `layers`.
    fn overlap_circle(&self, center: Vec2, radius: f32, layers: LayerMask) -> Vec<RaycastHit>;
}

/// Kind of interaction that selects a clip and particle effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    /// Struck by a weapon or hazard.
    Hit,
    /// Weapon glanced off an obstacle.
    Obstacle,
    /// Poisoned.
    Poison,
    /// Launched.
    Launch,
    /// Knocked down.
    KnockDown,
    /// Poise broke.
    Stagger,
    /// Died.
    Death,
    /// Hazard impact.
    HazardImpact,
}

impl InteractionType {
    /// Number of interaction types.
    pub const COUNT: usize = 8;

    /// All interaction types in table order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Hit,
        Self::Obstacle,
        Self::Poison,
        Self::Launch,
        Self::KnockDown,
        Self::Stagger,
        Self::Death,
        Self::HazardImpact,
    ];

    /// Row of this interaction in an [`InteractionTable`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Clip and particle played for one interaction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionEntry {
    /// Clip to play.
    pub audio: Option<ClipId>,
    /// Particle effect to spawn.
    pub particle: Option<ParticleId>,
}

/// Per-entity lookup from interaction type to feedback assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<InteractionEntry>", into = "Vec<InteractionEntry>")]
pub struct InteractionTable {
    entries: Vec<InteractionEntry>,
}

impl InteractionTable {
    /// Builds a table with one row per interaction type, in table order.
    pub fn new(entries: Vec<InteractionEntry>) -> CombatResult<Self> {
        if entries.len() < InteractionType::COUNT {
            return Err(CombatError::InteractionTableIncomplete {
                expected: InteractionType::COUNT,
                actual: entries.len(),
            });
        }
        Ok(Self { entries })
    }

    /// Table that plays nothing.
    #[must_use]
    pub fn silent() -> Self {
        Self {
            entries: vec![InteractionEntry::default(); InteractionType::COUNT],
        }
    }

    /// Sets the row for one interaction type.
    #[must_use]
    pub fn with(mut self, kind: InteractionType, entry: InteractionEntry) -> Self {
        self.entries[kind.index()] = entry;
        self
    }

    /// Clip for an interaction.
    #[must_use]
    pub fn audio_clip(&self, kind: InteractionType) -> Option<ClipId> {
        self.entries.get(kind.index()).and_then(|e| e.audio)
    }

    /// Particle effect for an interaction.
    #[must_use]
    pub fn particle_effect(&self, kind: InteractionType) -> Option<ParticleId> {
        self.entries.get(kind.index()).and_then(|e| e.particle)
    }

    /// Plays whatever the table holds for `kind`.
    pub fn play(
        &self,
        kind: InteractionType,
        position: Vec2,
        direction: Vec2,
        feedback: &mut dyn FeedbackService,
    ) {
        if let Some(clip) = self.audio_clip(kind) {
            feedback.play_audio(clip);
        }
        if let Some(effect) = self.particle_effect(kind) {
            feedback.play_particle(effect, position, direction);
        }
    }
}

impl Default for InteractionTable {
    fn default() -> Self {
        Self::silent()
    }
}

impl TryFrom<Vec<InteractionEntry>> for InteractionTable {
    type Error = CombatError;

    fn try_from(entries: Vec<InteractionEntry>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<InteractionTable> for Vec<InteractionEntry> {
    fn from(table: InteractionTable) -> Self {
        table.entries
    }
}
