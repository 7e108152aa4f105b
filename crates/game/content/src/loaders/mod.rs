//! Content loaders for reading game data from files.
//!
//! Weapons, property rules and battle configuration are TOML; the roster is
//! RON.

pub mod config;
pub mod factory;
pub mod properties;
pub mod roster;
pub mod weapons;

pub use config::ConfigLoader;
pub use factory::{Content, ContentFactory};
pub use properties::PropertyLoader;
pub use roster::RosterLoader;
pub use weapons::WeaponLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
