//! Persistent battle participants.
//!
//! Combatants and teams outlive individual turns: a [`Combatant`] keeps its HP
//! and inventory for the whole battle, while per-turn views over it are
//! rebuilt every round (see [`crate::engine::Target`]).
pub mod combatant;
pub mod team;

pub use combatant::{Combatant, CombatantId, Item};
pub use team::{Team, TeamId};
