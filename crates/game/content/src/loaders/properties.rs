//! Property rule loader.

use std::path::Path;

use crate::loaders::{LoadResult, read_file};
use crate::properties::PropertyTable;

pub struct PropertyLoader;

impl PropertyLoader {
    /// Load property rules from a TOML file.
    ///
    /// ```toml
    /// [[rules]]
    /// tag = "ninja"
    /// effect = { kind = "damage_modifier", name = "Light Armor", factor = 1.2, direction = "incoming", tag = "sword" }
    /// ```
    pub fn load(path: &Path) -> LoadResult<PropertyTable> {
        let content = read_file(path)?;
        let table: PropertyTable = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse property rules TOML: {}", e))?;

        Ok(table)
    }
}
