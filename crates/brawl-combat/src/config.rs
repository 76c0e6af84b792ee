//! Combat tuning and content catalogs.
//!
//! `CombatTuning` holds the global simulation constants. `Catalog` holds the
//! named weapon, hazard and fighter definitions. Both load from TOML.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::combatant::FighterConfig;
use crate::hazard::HazardStats;
use crate::weapon::WeaponConfig;

/// Errors that can occur while loading tuning or catalogs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read file.
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML.
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation error.
    #[error("Config validation error: {0}")]
    Validation(String),

    /// Two entries share a name.
    #[error("Duplicate catalog entry: {0}")]
    DuplicateName(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for brawl_common::BrawlError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

// ============================================================================
// Tuning
// ============================================================================

/// Regeneration template shared by every stat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegenTuning {
    /// Amount regenerated per second once the delay lapses.
    pub rate: f32,
    /// Delay after an ordinary spend (seconds).
    pub short_delay: f32,
    /// Delay after a heavy or over-budget spend (seconds).
    pub long_delay: f32,
}

impl RegenTuning {
    /// Creates a regen template.
    #[must_use]
    pub const fn new(rate: f32, short_delay: f32, long_delay: f32) -> Self {
        Self {
            rate,
            short_delay,
            long_delay,
        }
    }
}

impl Default for RegenTuning {
    fn default() -> Self {
        Self::new(1.0, 1.0, 2.0)
    }
}

/// Regen templates for the four stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalsTuning {
    /// Health regeneration.
    pub health: RegenTuning,
    /// Stamina regeneration.
    pub stamina: RegenTuning,
    /// Mana regeneration.
    pub mana: RegenTuning,
    /// Poise damage recovery (toward zero).
    pub poise: RegenTuning,
    /// Poise damage immunity after a stagger (seconds).
    pub stagger_immunity: f32,
}

impl Default for VitalsTuning {
    fn default() -> Self {
        Self {
            health: RegenTuning::new(2.0, 3.0, 6.0),
            stamina: RegenTuning::new(25.0, 0.5, 1.5),
            mana: RegenTuning::new(5.0, 1.0, 3.0),
            poise: RegenTuning::new(20.0, 2.0, 4.0),
            stagger_immunity: 1.5,
        }
    }
}

/// Timing guards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingTuning {
    /// Replacement for hang and knockdown times at or below zero.
    pub epsilon: f32,
}

impl Default for TimingTuning {
    fn default() -> Self {
        Self { epsilon: 0.001 }
    }
}

/// Status effect constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusTuning {
    /// Seconds between poison ticks.
    pub poison_interval: f32,
    /// Health lost per poison tick.
    pub poison_damage: f32,
    /// Wet duration when a source does not set one (seconds).
    pub wet_duration: f32,
}

impl Default for StatusTuning {
    fn default() -> Self {
        Self {
            poison_interval: 1.0,
            poison_damage: 1.0,
            wet_duration: 3.0,
        }
    }
}

/// How the stamina setter treats incoming values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaminaPolicy {
    /// Every write pins stamina at its maximum, so spends never drain it.
    ///
    /// This is the shipped behavior; switching to `Clamped` is a design
    /// decision still to be confirmed.
    #[default]
    Frozen,
    /// Ordinary `[0, max]` clamp.
    Clamped,
}

/// Global simulation constants.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Stat regeneration.
    pub vitals: VitalsTuning,
    /// Timing guards.
    pub timing: TimingTuning,
    /// Status effect constants.
    pub status: StatusTuning,
    /// Stamina setter policy.
    pub stamina_policy: StaminaPolicy,
}

impl CombatTuning {
    /// Loads tuning from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let tuning = Self::from_toml_str(&content)?;
        info!("Loaded combat tuning from {:?}", path);
        Ok(tuning)
    }

    /// Parses and validates tuning from TOML text.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let tuning: Self = toml::from_str(content)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Validates the tuning values.
    pub fn validate(&self) -> ConfigResult<()> {
        let regen = [
            ("health", &self.vitals.health),
            ("stamina", &self.vitals.stamina),
            ("mana", &self.vitals.mana),
            ("poise", &self.vitals.poise),
        ];
        for (name, track) in regen {
            if track.rate < 0.0 || track.short_delay < 0.0 || track.long_delay < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{name} regen has a negative rate or delay"
                )));
            }
            if track.long_delay < track.short_delay {
                warn!(
                    "{} regen long delay {} is shorter than short delay {}",
                    name, track.long_delay, track.short_delay
                );
            }
        }

        if self.timing.epsilon <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "timing epsilon must be positive, got {}",
                self.timing.epsilon
            )));
        }

        if self.status.poison_interval <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "poison interval must be positive, got {}",
                self.status.poison_interval
            )));
        }

        if self.vitals.stagger_immunity < 0.0 {
            return Err(ConfigError::Validation(
                "stagger immunity cannot be negative".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// On-disk layout of a catalog file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogFile {
    /// Weapon definitions.
    pub weapons: Vec<WeaponConfig>,
    /// Hazard definitions.
    pub hazards: Vec<HazardStats>,
    /// Fighter definitions.
    pub fighters: Vec<FighterConfig>,
}

/// Named weapon, hazard and fighter definitions.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    weapons: HashMap<String, WeaponConfig>,
    hazards: HashMap<String, HazardStats>,
    fighters: HashMap<String, FighterConfig>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a catalog file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let catalog = Self::from_toml_str(&content)?;
        info!(
            "Loaded {} weapons, {} hazards, {} fighters from {:?}",
            catalog.weapons.len(),
            catalog.hazards.len(),
            catalog.fighters.len(),
            path
        );
        Ok(catalog)
    }

    /// Parses, validates and indexes a catalog from TOML text.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        let mut catalog = Self::new();
        for weapon in file.weapons {
            catalog.register_weapon(weapon)?;
        }
        for hazard in file.hazards {
            catalog.register_hazard(hazard)?;
        }
        for fighter in file.fighters {
            catalog.register_fighter(fighter)?;
        }
        Ok(catalog)
    }

    /// Validates and registers a weapon.
    pub fn register_weapon(&mut self, weapon: WeaponConfig) -> ConfigResult<()> {
        weapon.validate()?;
        if self.weapons.contains_key(&weapon.name) {
            return Err(ConfigError::DuplicateName(weapon.name));
        }
        debug!("Registered weapon {}", weapon.name);
        self.weapons.insert(weapon.name.clone(), weapon);
        Ok(())
    }

    /// Validates and registers a hazard.
    pub fn register_hazard(&mut self, hazard: HazardStats) -> ConfigResult<()> {
        hazard.validate()?;
        if self.hazards.contains_key(&hazard.name) {
            return Err(ConfigError::DuplicateName(hazard.name));
        }
        debug!("Registered hazard {}", hazard.name);
        self.hazards.insert(hazard.name.clone(), hazard);
        Ok(())
    }

    /// Validates and registers a fighter.
    pub fn register_fighter(&mut self, fighter: FighterConfig) -> ConfigResult<()> {
        fighter.validate()?;
        if self.fighters.contains_key(&fighter.name) {
            return Err(ConfigError::DuplicateName(fighter.name));
        }
        debug!("Registered fighter {}", fighter.name);
        self.fighters.insert(fighter.name.clone(), fighter);
        Ok(())
    }

    /// Looks up a weapon by name.
    #[must_use]
    pub fn weapon(&self, name: &str) -> Option<&WeaponConfig> {
        self.weapons.get(name)
    }

    /// Looks up a hazard by name.
    #[must_use]
    pub fn hazard(&self, name: &str) -> Option<&HazardStats> {
        self.hazards.get(name)
    }

    /// Looks up a fighter by name.
    #[must_use]
    pub fn fighter(&self, name: &str) -> Option<&FighterConfig> {
        self.fighters.get(name)
    }

    /// Number of weapons.
    #[must_use]
    pub fn weapon_count(&self) -> usize {
        self.weapons.len()
    }

    /// Number of hazards.
    #[must_use]
    pub fn hazard_count(&self) -> usize {
        self.hazards.len()
    }

    /// Number of fighters.
    #[must_use]
    pub fn fighter_count(&self) -> usize {
        self.fighters.len()
    }
}
