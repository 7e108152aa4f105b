//! Content factory for loading everything from a data directory.

use std::path::{Path, PathBuf};

use battle_core::BattleConfig;
use tracing::debug;

use crate::armory::Armory;
use crate::loaders::{ConfigLoader, LoadResult, PropertyLoader, RosterLoader, WeaponLoader};
use crate::properties::PropertyTable;
use crate::roster::Roster;

/// Everything a battle host needs, loaded from one data directory.
#[derive(Clone, Debug)]
pub struct Content {
    pub config: BattleConfig,
    pub armory: Armory,
    pub roster: Roster,
    pub properties: PropertyTable,
}

/// Content factory that loads all game content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── battle.toml
/// ├── weapons.toml
/// ├── properties.toml
/// └── roster.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The data directory shipped with this crate.
    pub fn bundled() -> Self {
        Self::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("data"))
    }

    /// Load battle configuration from `battle.toml`.
    pub fn load_config(&self) -> LoadResult<BattleConfig> {
        ConfigLoader::load(&self.data_dir.join("battle.toml"))
    }

    /// Load the weapon catalog from `weapons.toml`.
    pub fn load_armory(&self) -> LoadResult<Armory> {
        WeaponLoader::load(&self.data_dir.join("weapons.toml"))
    }

    /// Load teams from `roster.ron`.
    pub fn load_roster(&self) -> LoadResult<Roster> {
        RosterLoader::load(&self.data_dir.join("roster.ron"))
    }

    /// Load property rules from `properties.toml`.
    pub fn load_properties(&self) -> LoadResult<PropertyTable> {
        PropertyLoader::load(&self.data_dir.join("properties.toml"))
    }

    /// Load every content file.
    pub fn load_all(&self) -> LoadResult<Content> {
        let content = Content {
            config: self.load_config()?,
            armory: self.load_armory()?,
            roster: self.load_roster()?,
            properties: self.load_properties()?,
        };
        debug!(
            target: "ninja_content::loaders",
            data_dir = %self.data_dir.display(),
            weapons = content.armory.len(),
            teams = content.roster.teams.len(),
            rules = content.properties.rules.len(),
            "content loaded"
        );
        Ok(content)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
