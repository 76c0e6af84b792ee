//! Tuning and catalog loading.

use std::path::Path;

use anyhow::{Context, Result};
use brawl_combat::{Catalog, CombatTuning};
use tracing::info;

const TUNING_FILE: &str = "tuning.toml";
const CATALOG_FILE: &str = "catalog.toml";

const BUNDLED_TUNING: &str = include_str!("../assets/tuning.toml");
const BUNDLED_CATALOG: &str = include_str!("../assets/catalog.toml");

/// Loads tuning and catalog from `dir`, or the bundled copies when absent.
pub fn load(dir: Option<&Path>) -> Result<(CombatTuning, Catalog)> {
    match dir {
        Some(dir) => {
            let tuning = CombatTuning::load(dir.join(TUNING_FILE))
                .with_context(|| format!("loading tuning from {}", dir.display()))?;
            let catalog = Catalog::load(dir.join(CATALOG_FILE))
                .with_context(|| format!("loading catalog from {}", dir.display()))?;
            Ok((tuning, catalog))
        },
        None => {
            info!("Using bundled assets");
            let tuning =
                CombatTuning::from_toml_str(BUNDLED_TUNING).context("parsing bundled tuning")?;
            let catalog =
                Catalog::from_toml_str(BUNDLED_CATALOG).context("parsing bundled catalog")?;
            Ok((tuning, catalog))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brawl_combat::StaminaPolicy;

    #[test]
    fn test_bundled_assets_load() {
        let (tuning, catalog) = load(None).unwrap();
        assert_eq!(tuning.stamina_policy, StaminaPolicy::Frozen);
        assert_eq!(catalog.weapon_count(), 1);
        assert_eq!(catalog.hazard_count(), 1);
        assert_eq!(catalog.fighter_count(), 2);
        assert_eq!(catalog.weapon("longsword").unwrap().parts.len(), 2);
        assert!(catalog.fighter("brute").unwrap().abilities.len() == 1);
    }

    #[test]
    fn test_missing_dir_fails() {
        assert!(load(Some(Path::new("/nonexistent/brawl-assets"))).is_err());
    }
}
