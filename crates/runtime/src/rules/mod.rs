//! Action managers the runtime installs on its bus.
//!
//! - [`LocationLock`] keeps combatants in place while their battle runs
//! - [`PropertyEffects`] installs per-combatant effects when a battle starts
mod location;
mod property;

pub use location::LocationLock;
pub use property::{PropertyEffects, PropertySource};
