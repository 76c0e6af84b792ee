//! Weapon swing pipeline.

use brawl_common::{CollisionGroup, EntityId, EntityKind, LayerMask, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::collision::{CollisionNodeManager, PartPose, SweepHit};
use crate::config::{ConfigError, ConfigResult};
use crate::damage::DamageSpec;
use crate::direction::DirectionPolicies;
use crate::error::{CombatError, CombatResult};
use crate::ledger::RecentCollisionLedger;
use crate::resolver::{HitResolution, RejectReason, TargetClass};
use crate::services::{EntityDirectory, PhysicsQuery};
use crate::status::{HitSource, StatusEffect};

// ============================================================================
// Definitions
// ============================================================================

/// One independently posed piece of a weapon (blade, pommel, shield rim).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponPartConfig {
    /// De-duplication group.
    pub group: CollisionGroup,
    /// Part-local node offsets, swept every frame.
    pub nodes: Vec<Vec2>,
    /// Delay before the hit resolves; negative resolves on the spot.
    pub hit_delay: f32,
    /// Magnitudes dealt.
    pub damage: DamageSpec,
    /// Direction policies of the hit.
    pub directions: DirectionPolicies,
    /// Bounce signalled when glancing off an obstacle.
    pub bounce_power: f32,
}

impl Default for WeaponPartConfig {
    fn default() -> Self {
        Self {
            group: CollisionGroup::default(),
            nodes: Vec::new(),
            hit_delay: 0.0,
            damage: DamageSpec::default(),
            directions: DirectionPolicies::default(),
            bounce_power: 1.0,
        }
    }
}

/// Weapon definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    /// Unique name.
    pub name: String,
    /// Layers the sweep tests against.
    pub layers: LayerMask,
    /// Obstacles may be struck repeatedly within one window.
    pub obstacle_multi_hit: bool,
    /// Parts in resolution order.
    pub parts: Vec<WeaponPartConfig>,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            layers: LayerMask::BODIES | LayerMask::OBSTACLES | LayerMask::HAZARDS,
            obstacle_multi_hit: false,
            parts: Vec::new(),
        }
    }
}

impl WeaponConfig {
    /// Validates the definition.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.name.is_empty() {
            return Err(ConfigError::Validation("weapon has empty name".to_string()));
        }
        if self.parts.is_empty() {
            return Err(ConfigError::Validation(format!(
                "weapon {} has no parts",
                self.name
            )));
        }
        for (i, part) in self.parts.iter().enumerate() {
            if part.nodes.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "weapon {} part {} has no collision nodes",
                    self.name, i
                )));
            }
            if !part.hit_delay.is_finite() {
                return Err(ConfigError::Validation(format!(
                    "weapon {} part {} has non-finite hit delay",
                    self.name, i
                )));
            }
            if part.damage.damage < 0 || part.damage.poise_damage < 0 {
                return Err(ConfigError::Validation(format!(
                    "weapon {} part {} has negative damage",
                    self.name, i
                )));
            }
        }
        if self.layers.is_empty() {
            warn!("Weapon {} sweeps no layers and can never hit", self.name);
        }
        Ok(())
    }
}

// ============================================================================
// Runtime
// ============================================================================

/// A weapon held by one fighter.
#[derive(Debug, Clone)]
pub struct Weapon {
    wielder: EntityId,
    config: WeaponConfig,
    nodes: CollisionNodeManager,
    poses: Vec<PartPose>,
    ledger: RecentCollisionLedger,
    active: bool,
    hit_count: u32,
}

impl Weapon {
    /// Equips a weapon definition on `wielder`.
    #[must_use]
    pub fn new(wielder: EntityId, config: WeaponConfig) -> Self {
        let nodes = CollisionNodeManager::new(config.parts.iter().map(|p| p.nodes.as_slice()));
        let poses = vec![PartPose::default(); config.parts.len()];
        Self {
            wielder,
            config,
            nodes,
            poses,
            ledger: RecentCollisionLedger::new(),
            active: false,
            hit_count: 0,
        }
    }

    /// Fighter holding the weapon.
    #[must_use]
    pub fn wielder(&self) -> EntityId {
        self.wielder
    }

    /// Definition.
    #[must_use]
    pub fn config(&self) -> &WeaponConfig {
        &self.config
    }

    /// True inside an activation window.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Hits credited in the current activation window.
    #[must_use]
    pub fn hit_count(&self) -> u32 {
        self.hit_count
    }

    /// Recent-collision ledger.
    #[must_use]
    pub fn ledger(&self) -> &RecentCollisionLedger {
        &self.ledger
    }

    /// Places one part for the next sweep.
    pub fn set_pose(&mut self, part: usize, pose: PartPose) -> CombatResult<()> {
        let parts = self.poses.len();
        let slot = self
            .poses
            .get_mut(part)
            .ok_or(CombatError::UnknownWeaponPart { part, parts })?;
        *slot = pose;
        Ok(())
    }

    /// Opens an activation window on entry into an attack state.
    pub fn enter_activation(&mut self) {
        self.ledger.clear();
        self.nodes.reset();
        self.hit_count = 0;
        self.active = true;
        debug!("Weapon {} of {} activated", self.config.name, self.wielder);
    }

    /// Closes the activation window on exit from an attack state.
    pub fn clear_attack_state_info(&mut self) {
        self.ledger.clear();
        self.nodes.reset();
        self.active = false;
    }

    /// Snapshots node positions and sweeps them. Empty outside a window.
    pub fn sweep(&mut self, physics: &dyn PhysicsQuery) -> Vec<SweepHit> {
        if !self.active {
            return Vec::new();
        }
        self.nodes.snapshot(&self.poses);
        self.nodes.sweep(physics, self.wielder, self.config.layers)
    }

    /// Validates and classifies one sweep hit.
    pub fn handle_collision(
        &mut self,
        sweep: &SweepHit,
        directory: &dyn EntityDirectory,
    ) -> CombatResult<HitResolution> {
        let parts = self.config.parts.len();
        let part = self
            .config
            .parts
            .get(sweep.part)
            .ok_or(CombatError::UnknownWeaponPart {
                part: sweep.part,
                parts,
            })?;
        let other = sweep.hit.root;

        if other == self.wielder {
            return Ok(HitResolution::Rejected(RejectReason::SelfHit));
        }
        if self.ledger.contains(part.group, other) {
            trace!("{} already hit {} in group {:?}", self.wielder, other, part.group);
            return Ok(HitResolution::Rejected(RejectReason::AlreadyHit));
        }

        let tags = directory.tags(other);
        let multi_hit_obstacle = self.config.obstacle_multi_hit && tags.is(EntityKind::Obstacle);
        let resolution = match TargetClass::of(tags) {
            TargetClass::Destructible if directory.is_destroyed(other) => {
                trace!("{} swept through the remains of {}", self.wielder, other);
                HitResolution::Rejected(RejectReason::Destroyed)
            },
            TargetClass::Destructible => {
                let hit = HitSource {
                    origin: Some(self.wielder),
                    source: Some(self.wielder),
                    target: other,
                    external_dir: sweep.direction,
                };
                let effect = StatusEffect::damage_packet(
                    directory,
                    hit,
                    part.damage.into(),
                    part.directions,
                    part.hit_delay,
                );
                self.hit_count += 1;
                if !multi_hit_obstacle {
                    self.ledger.insert(part.group, other);
                }
                debug!("{} hit {} (group {:?})", self.wielder, other, part.group);
                HitResolution::Damage {
                    target: other,
                    group: part.group,
                    effects: vec![effect],
                }
            },
            TargetClass::Obstacle => {
                self.hit_count += 1;
                if !multi_hit_obstacle {
                    self.ledger.insert(part.group, other);
                }
                HitResolution::Obstacle {
                    obstacle: other,
                    point: sweep.hit.point,
                    direction: sweep.direction,
                }
            },
            TargetClass::Hazard => {
                self.ledger.insert(part.group, other);
                HitResolution::Hazard { other }
            },
            TargetClass::Other => HitResolution::Ignored,
        };
        Ok(resolution)
    }

    /// Bounce power of a part.
    pub fn bounce_power(&self, part: usize) -> CombatResult<f32> {
        self.config
            .parts
            .get(part)
            .map(|p| p.bounce_power)
            .ok_or(CombatError::UnknownWeaponPart {
                part,
                parts: self.config.parts.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::StaticDirectory;
    use crate::services::{RaycastHit, Transform};
    use brawl_common::TeamId;

    fn config(multi: bool) -> WeaponConfig {
        WeaponConfig {
            name: "sword".to_string(),
            obstacle_multi_hit: multi,
            parts: vec![
                WeaponPartConfig {
                    nodes: vec![Vec2::X],
                    damage: DamageSpec {
                        damage: 10,
                        ..Default::default()
                    },
                    ..Default::default()
                },
                WeaponPartConfig {
                    group: CollisionGroup::new(1),
                    nodes: vec![Vec2::Y],
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    fn sweep_into(part: usize, root: EntityId) -> SweepHit {
        SweepHit {
            part,
            hit: RaycastHit {
                root,
                point: Vec2::ZERO,
                normal: Vec2::X,
                distance: 0.0,
            },
            origin: Vec2::ZERO,
            direction: Vec2::X,
        }
    }

    fn directory(wielder: EntityId, enemy: EntityId, wall: EntityId) -> StaticDirectory {
        let mut dir = StaticDirectory::default();
        dir.place(wielder, Vec2::ZERO, Vec2::X);
        dir.place(enemy, Vec2::new(1.0, 0.0), Vec2::NEG_X);
        dir.insert(
            wall,
            EntityKind::Obstacle,
            TeamId::NEUTRAL,
            Transform::new(Vec2::new(0.0, 3.0), Vec2::X),
        );
        dir
    }

    #[test]
    fn test_validation() {
        assert!(config(false).validate().is_ok());
        let mut bad = config(false);
        bad.parts[1].nodes.clear();
        assert!(bad.validate().is_err());
        assert!(WeaponConfig::default().validate().is_err());
    }

    #[test]
    fn test_self_hit_rejected() {
        let wielder = EntityId::from_raw(1);
        let dir = directory(wielder, EntityId::from_raw(2), EntityId::from_raw(3));
        let mut weapon = Weapon::new(wielder, config(false));
        weapon.enter_activation();
        let res = weapon.handle_collision(&sweep_into(0, wielder), &dir).unwrap();
        assert!(matches!(res, HitResolution::Rejected(RejectReason::SelfHit)));
    }

    #[test]
    fn test_destructible_once_per_group_per_window() {
        let wielder = EntityId::from_raw(1);
        let enemy = EntityId::from_raw(2);
        let dir = directory(wielder, enemy, EntityId::from_raw(3));
        let mut weapon = Weapon::new(wielder, config(false));
        weapon.enter_activation();

        let first = weapon.handle_collision(&sweep_into(0, enemy), &dir).unwrap();
        assert!(matches!(first, HitResolution::Damage { target, .. } if target == enemy));
        let again = weapon.handle_collision(&sweep_into(0, enemy), &dir).unwrap();
        assert!(matches!(again, HitResolution::Rejected(RejectReason::AlreadyHit)));
        let other_group = weapon.handle_collision(&sweep_into(1, enemy), &dir).unwrap();
        assert!(other_group.is_accepted());
        assert_eq!(weapon.hit_count(), 2);

        weapon.clear_attack_state_info();
        weapon.enter_activation();
        let fresh = weapon.handle_collision(&sweep_into(0, enemy), &dir).unwrap();
        assert!(fresh.is_accepted());
    }

    #[test]
    fn test_dead_target_rejected_without_credit() {
        let wielder = EntityId::from_raw(1);
        let enemy = EntityId::from_raw(2);
        let mut dir = directory(wielder, enemy, EntityId::from_raw(3));
        dir.mark_destroyed(enemy);
        let mut weapon = Weapon::new(wielder, config(false));
        weapon.enter_activation();

        let res = weapon.handle_collision(&sweep_into(0, enemy), &dir).unwrap();
        assert!(matches!(res, HitResolution::Rejected(RejectReason::Destroyed)));
        assert_eq!(weapon.hit_count(), 0);
        assert!(!weapon.ledger().contains(CollisionGroup::default(), enemy));
    }

    #[test]
    fn test_obstacle_multi_hit() {
        let wielder = EntityId::from_raw(1);
        let wall = EntityId::from_raw(3);
        let dir = directory(wielder, EntityId::from_raw(2), wall);

        let mut single = Weapon::new(wielder, config(false));
        single.enter_activation();
        assert!(matches!(
            single.handle_collision(&sweep_into(0, wall), &dir).unwrap(),
            HitResolution::Obstacle { .. }
        ));
        assert!(!single.handle_collision(&sweep_into(0, wall), &dir).unwrap().is_accepted());

        let mut multi = Weapon::new(wielder, config(true));
        multi.enter_activation();
        for _ in 0..3 {
            assert!(multi.handle_collision(&sweep_into(0, wall), &dir).unwrap().is_accepted());
        }
        assert_eq!(multi.hit_count(), 3);
    }

    #[test]
    fn test_unknown_part_errors() {
        let wielder = EntityId::from_raw(1);
        let mut weapon = Weapon::new(wielder, config(false));
        assert_eq!(
            weapon.set_pose(7, PartPose::default()),
            Err(CombatError::UnknownWeaponPart { part: 7, parts: 2 })
        );
    }

    #[test]
    fn test_inactive_weapon_does_not_sweep() {
        let wielder = EntityId::from_raw(1);
        let mut weapon = Weapon::new(wielder, config(false));
        let world = crate::sandbox::CircleWorld::new();
        assert!(weapon.sweep(&world).is_empty());
    }
}
