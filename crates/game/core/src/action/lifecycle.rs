//! Battle lifecycle notifications.
//!
//! These actions carry no state change of their own. Rules observe them to
//! track which combatants are engaged and to prepare battles (property effects
//! at start, cleanup at end).

use std::fmt;

use super::{Action, ActionKind};
use crate::engine::BattleId;
use crate::state::{CombatantId, TeamId};

/// How a battle finished.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "team", rename_all = "snake_case"))]
pub enum BattleResult {
    /// Exactly one team had a standing member.
    Victory(TeamId),
    /// Every team was knocked out in the same turn.
    Draw,
    /// Force-ended by the host before a winner emerged.
    Aborted,
}

impl BattleResult {
    pub fn winner(&self) -> Option<TeamId> {
        match self {
            Self::Victory(team) => Some(*team),
            Self::Draw | Self::Aborted => None,
        }
    }
}

impl fmt::Display for BattleResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Victory(team) => write!(f, "victory for {team}"),
            Self::Draw => f.write_str("draw"),
            Self::Aborted => f.write_str("aborted"),
        }
    }
}

/// Payload of `BattleCreated` and `BattleStart`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BattleLifecycleAction {
    pub battle: BattleId,
    pub combatants: Vec<CombatantId>,
}

impl BattleLifecycleAction {
    pub fn new(battle: BattleId, combatants: Vec<CombatantId>) -> Self {
        Self { battle, combatants }
    }

    /// The battle was registered with a manager but has not started.
    pub fn created(self) -> Action {
        Action::new(ActionKind::BattleCreated(self))
    }

    /// Turn 0 exists; rules may install effects.
    pub fn start(self) -> Action {
        Action::new(ActionKind::BattleStart(self))
    }
}

/// Payload of `BattleEnd`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BattleEndAction {
    pub battle: BattleId,
    pub result: BattleResult,
    pub combatants: Vec<CombatantId>,
}

impl BattleEndAction {
    pub fn new(battle: BattleId, result: BattleResult, combatants: Vec<CombatantId>) -> Self {
        Self {
            battle,
            result,
            combatants,
        }
    }
}
