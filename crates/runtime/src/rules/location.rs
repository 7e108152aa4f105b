use std::collections::BTreeMap;

use battle_core::{
    Action, ActionKind, ActionManager, Battle, BattleId, CombatantId, RuleError,
};
use tracing::debug;

pub(crate) const STAY_AND_FIGHT: &str = "you can't leave, you've got to stay and fight";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Engagement {
    battle: BattleId,
    started: bool,
}

/// Vetoes location changes of combatants engaged in a battle.
///
/// Engagement is tracked from the lifecycle actions alone. A combatant is
/// registered on `BattleCreated`, engaged on `BattleStart` and released on
/// `BattleEnd`. In strict mode registration already locks the combatant.
#[derive(Debug, Default)]
pub struct LocationLock {
    strict: bool,
    engaged: BTreeMap<CombatantId, Engagement>,
}

impl LocationLock {
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            engaged: BTreeMap::new(),
        }
    }

    /// Returns the battle currently holding `combatant` in place, if any.
    pub fn locked_by(&self, combatant: CombatantId) -> Option<BattleId> {
        self.engaged
            .get(&combatant)
            .filter(|engagement| engagement.started || self.strict)
            .map(|engagement| engagement.battle)
    }

    fn engage(&mut self, battle: BattleId, combatants: &[CombatantId], started: bool) {
        for &combatant in combatants {
            self.engaged.insert(combatant, Engagement { battle, started });
        }
    }

    fn release(&mut self, battle: BattleId) {
        self.engaged
            .retain(|_, engagement| engagement.battle != battle);
    }
}

impl ActionManager for LocationLock {
    fn name(&self) -> &'static str {
        "location_lock"
    }

    fn on_action(
        &mut self,
        action: &mut Action,
        battle: Option<&mut Battle>,
    ) -> Result<(), RuleError> {
        match action.kind() {
            ActionKind::BattleCreated(created) => {
                // A restored battle may already be running.
                let started = battle.is_some_and(|battle| battle.is_started());
                self.engage(created.battle, &created.combatants, started);
            }
            ActionKind::BattleStart(start) => {
                self.engage(start.battle, &start.combatants, true);
            }
            ActionKind::BattleEnd(end) => self.release(end.battle),
            ActionKind::MoveLocation(movement) => {
                if let Some(battle) = self.locked_by(movement.mover) {
                    debug!(
                        target: "battle_runtime::rules",
                        mover = %movement.mover,
                        %battle,
                        to = %movement.to,
                        "location change refused"
                    );
                    action.veto(STAY_AND_FIGHT);
                }
            }
            _ => {}
        }
        Ok(())
    }
}
