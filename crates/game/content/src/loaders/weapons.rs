//! Weapon catalog loader.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::armory::{Armory, WeaponDef};
use crate::loaders::{LoadResult, read_file};

/// Weapon catalog structure for TOML files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponCatalog {
    pub weapons: Vec<WeaponDef>,
}

/// Loader for the weapon catalog.
pub struct WeaponLoader;

impl WeaponLoader {
    /// Load an [`Armory`] from a TOML file.
    ///
    /// ```toml
    /// [[weapons]]
    /// name = "Shuriken"
    ///
    /// [[weapons.moves]]
    /// name = "Throw"
    /// hp_change = -3
    /// inflicts = [{ kind = "poisoned", damage = 2, turns = 3 }]
    /// ```
    pub fn load(path: &Path) -> LoadResult<Armory> {
        let content = read_file(path)?;
        let catalog: WeaponCatalog = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse weapon catalog TOML: {}", e))?;

        Armory::new(catalog.weapons)
            .map_err(|e| anyhow::anyhow!("Invalid weapon catalog {}: {}", path.display(), e))
    }
}
