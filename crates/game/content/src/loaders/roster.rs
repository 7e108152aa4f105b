//! Roster loader.

use std::path::Path;

use crate::loaders::{LoadResult, read_file};
use crate::roster::Roster;

/// Loader for team rosters from RON files.
pub struct RosterLoader;

impl RosterLoader {
    /// Load a roster from a RON file.
    ///
    /// Example:
    /// ```ron
    /// (
    ///     teams: [
    ///         (name: "Wanderers", members: [
    ///             (id: 1, name: "Aiko", hp: 40, weapons: ["Katana"]),
    ///         ]),
    ///     ],
    /// )
    /// ```
    pub fn load(path: &Path) -> LoadResult<Roster> {
        let content = read_file(path)?;
        let roster: Roster = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse roster RON at {:?}: {}", path, e))?;

        Ok(roster)
    }
}
