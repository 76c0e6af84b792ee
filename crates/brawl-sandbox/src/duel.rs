//! Scripted knight-versus-brute exchange.
//!
//! The knight swings a longsword at the brute on a fixed cadence, with every
//! third swing a backhand into the wall behind it. The brute lobs firebombs
//! whenever its mana allows. Impulses taken from the core are applied to the
//! host-side transforms so knockback actually moves the fighters.

use std::f32::consts::PI;

use anyhow::{Context, Result};
use brawl_combat::sandbox::{CircleWorld, RecordingFeedback, RecordingPresentation};
use brawl_combat::{
    Action, Catalog, CombatEvent, CombatTuning, CombatWorld, Combatant, HazardStats, PartPose,
    Services, Transform,
};
use brawl_common::{EntityId, LayerMask, Vec2};
use tracing::{debug, info};

/// Fixed frame length (seconds).
const FRAME: f32 = 1.0 / 60.0;

// === Script cadence ===

/// Frames between swing starts.
const SWING_PERIOD: u32 = 40;
/// Frames one swing sweeps for.
const SWING_FRAMES: u32 = 8;
/// Half the swing arc (radians).
const SWING_ARC: f32 = 1.2;
/// Every n-th swing is a backhand.
const BACKHAND_EVERY: u32 = 3;
/// Frames between firebomb attempts.
const THROW_PERIOD: u32 = 90;
/// Firebomb speed (units per second).
const THROW_SPEED: f32 = 6.0;
/// Host displacement per unit of impulse.
const IMPULSE_SCALE: f32 = 0.05;

// === Arena layout ===

const KNIGHT_START: Vec2 = Vec2::new(0.0, 0.0);
const BRUTE_START: Vec2 = Vec2::new(1.8, 0.0);
const WALL_POSITION: Vec2 = Vec2::new(-1.5, 0.0);
const WALL_RADIUS: f32 = 0.5;

/// Summary of a finished duel.
#[derive(Debug, Clone, Default)]
pub struct DuelReport {
    /// Frames simulated.
    pub frames: u32,
    /// Combat events published.
    pub events: usize,
    /// Hits registered on fighters.
    pub hits: usize,
    /// Entities that died, in order.
    pub deaths: Vec<EntityId>,
    /// Knight health at the end.
    pub knight_health: f32,
    /// Brute health at the end.
    pub brute_health: f32,
}

impl DuelReport {
    fn record(&mut self, event: &CombatEvent) {
        self.events += 1;
        match event {
            CombatEvent::HitRegistered { .. } => self.hits += 1,
            CombatEvent::Died { entity, .. } => self.deaths.push(*entity),
            _ => {},
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Swing {
    frame: u32,
    backhand: bool,
}

/// Arena state driven frame by frame.
pub struct Duel {
    world: CombatWorld,
    physics: CircleWorld,
    presentation: RecordingPresentation,
    feedback: RecordingFeedback,
    knight: EntityId,
    brute: EntityId,
    firebomb: HazardStats,
    swing: Option<Swing>,
    swings: u32,
}

impl Duel {
    /// Spawns the cast from catalog entries.
    pub fn new(tuning: CombatTuning, catalog: &Catalog) -> Result<Self> {
        let knight_config = catalog.fighter("knight").context("catalog has no knight")?;
        let brute_config = catalog.fighter("brute").context("catalog has no brute")?;
        let sword = catalog
            .weapon("longsword")
            .context("catalog has no longsword")?
            .clone();
        let firebomb = catalog
            .hazard("firebomb")
            .context("catalog has no firebomb")?
            .clone();

        let mut world = CombatWorld::new(tuning);
        let knight = world.spawn_fighter(knight_config, Transform::new(KNIGHT_START, Vec2::X))?;
        let brute = world.spawn_fighter(brute_config, Transform::new(BRUTE_START, Vec2::NEG_X))?;
        let wall = world.spawn_obstacle(Transform::new(WALL_POSITION, Vec2::X));
        world.equip(knight, sword)?;

        let mut physics = CircleWorld::new();
        physics.add_circle(knight, KNIGHT_START, knight_config.radius, LayerMask::BODIES);
        physics.add_circle(brute, BRUTE_START, brute_config.radius, LayerMask::BODIES);
        physics.add_circle(wall, WALL_POSITION, WALL_RADIUS, LayerMask::OBSTACLES);

        info!(
            "Spawned knight {}, brute {} and wall {}",
            knight, brute, wall
        );

        Ok(Self {
            world,
            physics,
            presentation: RecordingPresentation::default(),
            feedback: RecordingFeedback::default(),
            knight,
            brute,
            firebomb,
            swing: None,
            swings: 0,
        })
    }

    /// Runs up to `frames` frames, stopping early once someone dies.
    pub fn run(&mut self, frames: u32) -> Result<DuelReport> {
        let mut report = DuelReport::default();
        for frame in 0..frames {
            self.script(frame)?;
            {
                let mut services = Services::new(&mut self.presentation, &mut self.feedback);
                self.world.step(FRAME, &self.physics, &mut services);
            }
            self.apply_impulses()?;

            for event in self.world.drain_events() {
                info!("[{:>4}] {:?}", frame, event);
                report.record(&event);
            }
            report.frames = frame + 1;
            if !report.deaths.is_empty() {
                break;
            }
        }

        report.knight_health = self.health(self.knight);
        report.brute_health = self.health(self.brute);
        debug!(
            "Presentation saw {} calls; feedback played {} clips and {} particles",
            self.presentation.calls().len(),
            self.feedback.audio.len(),
            self.feedback.particles.len()
        );
        Ok(report)
    }

    fn script(&mut self, frame: u32) -> Result<()> {
        if self.is_down(self.knight) || self.is_down(self.brute) {
            return Ok(());
        }

        if let Some(swing) = self.swing {
            if swing.frame == SWING_FRAMES {
                self.world.exit_attack_state(self.knight)?;
                self.swing = None;
            }
        }
        if self.swing.is_none() && frame % SWING_PERIOD == 0 {
            self.start_swing()?;
        }
        if let Some(swing) = self.swing {
            let t = swing.frame as f32 / (SWING_FRAMES - 1) as f32;
            let base = if swing.backhand { PI } else { 0.0 };
            let pose = PartPose::new(
                self.position(self.knight),
                base + SWING_ARC - 2.0 * SWING_ARC * t,
            );
            self.swing = Some(Swing {
                frame: swing.frame + 1,
                ..swing
            });
            let parts = self
                .world
                .weapon(self.knight)
                .map_or(0, |w| w.config().parts.len());
            for part in 0..parts {
                self.world.set_weapon_pose(self.knight, part, pose)?;
            }
        }

        if frame % THROW_PERIOD == THROW_PERIOD / 2 {
            self.throw_firebomb()?;
        }
        Ok(())
    }

    fn start_swing(&mut self) -> Result<()> {
        self.world.request_action(self.knight, Action::Attack)?;
        if !self.world.commit_action(self.knight, Action::Attack)? {
            debug!("Knight cannot attack yet");
            return Ok(());
        }
        self.world.enter_attack_state(self.knight)?;
        self.swings += 1;
        self.swing = Some(Swing {
            frame: 0,
            backhand: self.swings % BACKHAND_EVERY == 0,
        });
        Ok(())
    }

    fn throw_firebomb(&mut self) -> Result<()> {
        let slot = Action::Ability(0);
        self.world.request_action(self.brute, slot)?;
        if !self.world.commit_action(self.brute, slot)? {
            debug!("Brute is out of mana");
            return Ok(());
        }
        let from = self.position(self.brute);
        let direction = (self.position(self.knight) - from).normalize_or_zero();
        let spawn = from + direction * (self.firebomb.radius + 0.4);
        let id = self.world.spawn_hazard(
            &self.firebomb,
            Some(self.brute),
            Some(self.brute),
            spawn,
            direction * THROW_SPEED,
        )?;
        debug!("Brute threw firebomb {}", id);
        Ok(())
    }

    fn apply_impulses(&mut self) -> Result<()> {
        for id in [self.knight, self.brute] {
            let push = self.world.take_impulse(id)?;
            if push == Vec2::ZERO {
                continue;
            }
            let Some(body) = self.world.bodies().get(id) else {
                continue;
            };
            let moved = Transform::new(
                body.transform.position + push * IMPULSE_SCALE,
                body.transform.facing,
            );
            self.world.set_transform(id, moved)?;
            self.physics.move_root(id, moved.position);
        }
        Ok(())
    }

    fn position(&self, id: EntityId) -> Vec2 {
        self.world
            .bodies()
            .get(id)
            .map_or(Vec2::ZERO, |body| body.transform.position)
    }

    fn health(&self, id: EntityId) -> f32 {
        self.world
            .combatant(id)
            .map_or(0.0, |c| c.vitals().health())
    }

    fn is_down(&self, id: EntityId) -> bool {
        self.world.combatant(id).map_or(true, Combatant::is_destroyed)
    }
}
