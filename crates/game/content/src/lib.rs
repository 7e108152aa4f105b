//! Data-driven content for "Trail of Ninjas".
//!
//! This crate turns static definitions into battle-core objects:
//! - Weapons and their moves (the [`Armory`], also the restore catalog)
//! - Rosters of named teams
//! - Property rules wired into battles at start ("sword slash does x1.2
//!   against ninjas")
//! - Battle configuration
//!
//! With the `loaders` feature, everything above is read from TOML/RON files
//! under a data directory.

pub mod armory;
pub mod error;
pub mod properties;
pub mod roster;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use armory::{Armory, WeaponDef};
pub use error::ContentError;
pub use properties::{PropertyRule, PropertyTable};
pub use roster::{CombatantDef, Roster, TeamDef};

#[cfg(feature = "loaders")]
pub use loaders::{
    ConfigLoader, Content, ContentFactory, PropertyLoader, RosterLoader, WeaponLoader,
};
