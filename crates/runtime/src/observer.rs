//! Host callbacks.
//!
//! The manager reports everything a battle produces through a
//! [`BattleObserver`]. Callback failures never interrupt a battle: they are
//! logged at `warn` and dropped.

use battle_core::{
    Battle, BattleId, BattleResult, CombatantId, MoveOutcome, Notice, TurnReport,
};

use crate::errors::ObserverError;

pub type ObserverResult<T = ()> = std::result::Result<T, ObserverError>;

/// A move selection made by a host or an input queue.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Selection {
    pub option: String,
    pub targets: Vec<CombatantId>,
}

impl Selection {
    pub fn new(option: impl Into<String>, targets: Vec<CombatantId>) -> Self {
        Self {
            option: option.into(),
            targets,
        }
    }
}

/// Receives battle output. Every method defaults to doing nothing.
pub trait BattleObserver {
    fn on_outcome(&mut self, _battle: BattleId, _outcome: &MoveOutcome) -> ObserverResult {
        Ok(())
    }

    fn on_turn_end(&mut self, _battle: BattleId, _report: &TurnReport) -> ObserverResult {
        Ok(())
    }

    fn on_broadcast(&mut self, _battle: BattleId, _text: &str) -> ObserverResult {
        Ok(())
    }

    /// A vetoed action addressed its reason to `notice.recipient`.
    fn on_notice(&mut self, _notice: &Notice) -> ObserverResult {
        Ok(())
    }

    fn on_battle_end(&mut self, _battle: BattleId, _result: &BattleResult) -> ObserverResult {
        Ok(())
    }

    /// Asks the host for the move of a combatant driven by a set chooser.
    ///
    /// Called every tick while the combatant's choice is missing. `Ok(None)`
    /// means the host has not decided yet.
    fn on_request_move(
        &mut self,
        _battle: &Battle,
        _combatant: CombatantId,
    ) -> ObserverResult<Option<Selection>> {
        Ok(None)
    }
}

/// Observer used when the host registers none.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl BattleObserver for NullObserver {}
