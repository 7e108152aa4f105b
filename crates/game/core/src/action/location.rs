use super::Action;
use crate::state::CombatantId;

/// A combatant walking from one location to another.
///
/// Locations belong to the world model, which lives outside the battle core;
/// committing this action changes nothing here. The host applies the move
/// only when the dispatch comes back allowed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveLocationAction {
    pub mover: CombatantId,
    pub from: Option<String>,
    pub to: String,
}

impl MoveLocationAction {
    pub fn new(mover: CombatantId, from: Option<String>, to: impl Into<String>) -> Self {
        Self {
            mover,
            from,
            to: to.into(),
        }
    }

    /// Wraps the move in an action that reports a veto back to the mover.
    pub fn into_action(self) -> Action {
        let mover = self.mover;
        Action::new(self).with_initiator(mover).notify_on_veto()
    }
}
