//! Hazard bodies: projectiles, explosions and effect fields.
//!
//! A hazard overlaps targets with its trigger circle instead of sweeping
//! nodes. It runs a two-step teardown: once alive-time reaches the decay
//! time its trigger shuts off and the death animation plays; once the linger
//! time has also passed it is removed.

use brawl_common::{CollisionGroup, EntityId, EntityKind, LayerMask, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::{ConfigError, ConfigResult};
use crate::damage::DamageSpec;
use crate::direction::DirectionPolicies;
use crate::ledger::RecentCollisionLedger;
use crate::resolver::{HitResolution, RejectReason, TargetClass};
use crate::services::{EntityDirectory, InteractionEntry, InteractionType, PhysicsQuery, RaycastHit};
use crate::status::{HitSource, StatusEffect};

/// Geometry check that can block a hazard hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockCheck {
    /// Never blocked.
    #[default]
    None,
    /// Blocked if terrain lies between the hazard and the target.
    LineOfSight,
}

/// Static stat block of a hazard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardStats {
    /// Unique name.
    pub name: String,
    /// Category of the hazard body.
    pub kind: EntityKind,
    /// Trigger radius.
    pub radius: f32,
    /// Layers the trigger overlaps.
    pub layers: LayerMask,
    /// De-duplication group.
    pub group: CollisionGroup,
    /// Magnitudes dealt.
    pub damage: DamageSpec,
    /// Direction policies of the hit.
    pub directions: DirectionPolicies,
    /// Delay before the hit resolves; negative resolves on the spot.
    pub hit_delay: f32,
    /// Mana credited to the origin per destructible hit.
    pub mana_generation: f32,
    /// Applies Wet to destructibles it hits.
    pub wet: bool,
    /// Wet duration; zero takes the tuned default at spawn.
    pub wet_duration: f32,
    /// Obstacles may be struck repeatedly over the hazard's life.
    pub obstacle_multi_hit: bool,
    /// Alive-time at which the trigger shuts off.
    pub decay_time: f32,
    /// Time spent decaying before removal.
    pub linger_time: f32,
    /// Skip the origin entity.
    pub ignore_origin: bool,
    /// Skip the source entity.
    pub ignore_source: bool,
    /// Categories never hit.
    pub ignored_kinds: Vec<EntityKind>,
    /// Geometry check.
    pub block_check: BlockCheck,
    /// Interaction feedback rows; empty means silent.
    pub interactions: Vec<InteractionEntry>,
}

impl Default for HazardStats {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: EntityKind::Projectile,
            radius: 0.5,
            layers: LayerMask::BODIES | LayerMask::OBSTACLES,
            group: CollisionGroup::default(),
            damage: DamageSpec::default(),
            directions: DirectionPolicies::default(),
            hit_delay: -1.0,
            mana_generation: 0.0,
            wet: false,
            wet_duration: 0.0,
            obstacle_multi_hit: false,
            decay_time: 5.0,
            linger_time: 0.5,
            ignore_origin: true,
            ignore_source: true,
            ignored_kinds: Vec::new(),
            block_check: BlockCheck::None,
            interactions: Vec::new(),
        }
    }
}

impl HazardStats {
    /// Validates the stat block.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.name.is_empty() {
            return Err(ConfigError::Validation("hazard has empty name".to_string()));
        }
        if !self.kind.lattice().is(EntityKind::Hazard) {
            return Err(ConfigError::Validation(format!(
                "hazard {} has non-hazard kind {:?}",
                self.name, self.kind
            )));
        }
        if self.radius <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "hazard {} has non-positive radius {}",
                self.name, self.radius
            )));
        }
        if self.decay_time <= 0.0 || self.linger_time < 0.0 {
            return Err(ConfigError::Validation(format!(
                "hazard {} needs positive decay time and non-negative linger time",
                self.name
            )));
        }
        if self.mana_generation < 0.0 || self.wet_duration < 0.0 {
            return Err(ConfigError::Validation(format!(
                "hazard {} has negative mana generation or wet duration",
                self.name
            )));
        }
        if !self.interactions.is_empty() && self.interactions.len() < InteractionType::COUNT {
            return Err(ConfigError::Validation(format!(
                "hazard {} has {} interaction rows, expected {}",
                self.name,
                self.interactions.len(),
                InteractionType::COUNT
            )));
        }
        Ok(())
    }
}

/// Teardown state of a hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HazardState {
    /// Trigger live.
    Alive,
    /// Trigger off, death animation playing.
    Decaying,
    /// Ready to despawn.
    Removed,
}

/// A live hazard body.
#[derive(Debug, Clone)]
pub struct Hazard {
    id: EntityId,
    origin: Option<EntityId>,
    source: Option<EntityId>,
    stats: HazardStats,
    position: Vec2,
    velocity: Vec2,
    alive_time: f32,
    state: HazardState,
    ledger: RecentCollisionLedger,
}

impl Hazard {
    /// Creates a hazard.
    #[must_use]
    pub fn new(
        id: EntityId,
        stats: HazardStats,
        origin: Option<EntityId>,
        source: Option<EntityId>,
        position: Vec2,
        velocity: Vec2,
    ) -> Self {
        Self {
            id,
            origin,
            source,
            stats,
            position,
            velocity,
            alive_time: 0.0,
            state: HazardState::Alive,
            ledger: RecentCollisionLedger::new(),
        }
    }

    /// Hazard entity.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Root cause.
    #[must_use]
    pub fn origin(&self) -> Option<EntityId> {
        self.origin
    }

    /// Proximate cause.
    #[must_use]
    pub fn source(&self) -> Option<EntityId> {
        self.source
    }

    /// Stat block.
    #[must_use]
    pub fn stats(&self) -> &HazardStats {
        &self.stats
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Current velocity.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Seconds since spawn.
    #[must_use]
    pub fn alive_time(&self) -> f32 {
        self.alive_time
    }

    /// Teardown state.
    #[must_use]
    pub fn state(&self) -> HazardState {
        self.state
    }

    /// Moves the body. Only alive hazards move.
    pub fn integrate(&mut self, dt: f32) {
        if self.state == HazardState::Alive {
            self.position += self.velocity * dt;
        }
    }

    /// Trigger overlaps this frame; none once decaying.
    #[must_use]
    pub fn candidates(&self, physics: &dyn PhysicsQuery) -> Vec<RaycastHit> {
        if self.state != HazardState::Alive {
            return Vec::new();
        }
        physics.overlap_circle(self.position, self.stats.radius, self.stats.layers)
    }

    /// Advances alive-time; returns every state entered during this step.
    pub fn advance(&mut self, dt: f32) -> Vec<HazardState> {
        self.alive_time += dt;
        let mut entered = Vec::new();
        if self.state == HazardState::Alive && self.alive_time >= self.stats.decay_time {
            self.state = HazardState::Decaying;
            debug!("Hazard {} decaying", self.id);
            entered.push(HazardState::Decaying);
        }
        if self.state == HazardState::Decaying
            && self.alive_time >= self.stats.decay_time + self.stats.linger_time
        {
            self.state = HazardState::Removed;
            debug!("Hazard {} removed", self.id);
            entered.push(HazardState::Removed);
        }
        entered
    }

    fn validate(
        &self,
        other: EntityId,
        directory: &dyn EntityDirectory,
        physics: &dyn PhysicsQuery,
    ) -> Result<(), RejectReason> {
        if other == self.id {
            return Err(RejectReason::SelfHit);
        }
        if self.stats.ignore_origin && self.origin == Some(other) {
            return Err(RejectReason::IgnoredOrigin);
        }
        if self.stats.ignore_source && self.source == Some(other) {
            return Err(RejectReason::IgnoredSource);
        }
        if self.ledger.contains(self.stats.group, other) {
            return Err(RejectReason::AlreadyHit);
        }
        let tags = directory.tags(other);
        if self.stats.ignored_kinds.iter().any(|k| tags.is(*k)) {
            return Err(RejectReason::IgnoredKind);
        }
        if self.is_blocked(other, directory, physics) {
            return Err(RejectReason::Blocked);
        }
        Ok(())
    }

    fn is_blocked(
        &self,
        other: EntityId,
        directory: &dyn EntityDirectory,
        physics: &dyn PhysicsQuery,
    ) -> bool {
        match self.stats.block_check {
            BlockCheck::None => false,
            BlockCheck::LineOfSight => {
                let Some(target) = directory.transform(other) else {
                    return false;
                };
                let reach = self.position.distance(target.position);
                physics
                    .segment_cast(self.position, target.position, LayerMask::TERRAIN)
                    .iter()
                    .any(|hit| hit.root != other && hit.distance < reach)
            },
        }
    }

    /// Validates and classifies one trigger overlap.
    pub fn handle_trigger(
        &mut self,
        contact: &RaycastHit,
        directory: &dyn EntityDirectory,
        physics: &dyn PhysicsQuery,
    ) -> HitResolution {
        let other = contact.root;
        if let Err(reason) = self.validate(other, directory, physics) {
            trace!("Hazard {} rejected {}: {:?}", self.id, other, reason);
            return HitResolution::Rejected(reason);
        }

        let group = self.stats.group;
        match TargetClass::of(directory.tags(other)) {
            TargetClass::Destructible if directory.is_destroyed(other) => {
                trace!("Hazard {} passed over the remains of {}", self.id, other);
                HitResolution::Rejected(RejectReason::Destroyed)
            },
            TargetClass::Destructible => {
                self.ledger.insert(group, other);
                HitResolution::Damage {
                    target: other,
                    group,
                    effects: self.build_effects(other, directory),
                }
            },
            TargetClass::Obstacle => {
                if !self.stats.obstacle_multi_hit {
                    self.ledger.insert(group, other);
                }
                HitResolution::Obstacle {
                    obstacle: other,
                    point: contact.point,
                    direction: self.velocity.normalize_or_zero(),
                }
            },
            TargetClass::Hazard => {
                self.ledger.insert(group, other);
                HitResolution::Hazard { other }
            },
            TargetClass::Other => HitResolution::Ignored,
        }
    }

    fn build_effects(&self, target: EntityId, directory: &dyn EntityDirectory) -> Vec<StatusEffect> {
        let hit = HitSource {
            origin: self.origin,
            source: Some(self.id),
            target,
            external_dir: self.velocity.normalize_or_zero(),
        };
        let mut effects = vec![StatusEffect::damage_packet(
            directory,
            hit,
            self.stats.damage.into(),
            self.stats.directions,
            self.stats.hit_delay,
        )];
        if self.stats.wet && self.stats.wet_duration > 0.0 {
            effects.push(StatusEffect::wet(directory, hit, self.stats.wet_duration));
        }
        effects
    }
}
