//! Battle controller and turn state machine.
//!
//! A [`Battle`] owns its teams and the current [`Turn`]. The host drives it
//! with [`Battle::update`], once per outer-loop iteration; every state change
//! made while a turn resolves travels through the [`ActionBus`] passed in.
//!
//! [`ActionBus`]: crate::action::ActionBus

mod battle;
mod turn;

pub use battle::{Battle, BattleEvent, BattleId};
pub use turn::{AttachedEffect, Target, Turn, TurnPhase};
