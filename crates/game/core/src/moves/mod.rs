//! Move options and the moves they produce.
//!
//! A [`MoveOption`] is a reusable template, usually exposed by a weapon. Given
//! a user and a validated target list it produces a [`Move`]: an immutable
//! record of who does what to whom this turn, at which priority.

pub mod targeting;
pub mod weapon;

pub use targeting::{Recommendation, TargetCategory, TargetingOption};
pub use weapon::WeaponMove;

use std::fmt;
use std::sync::Arc;

use crate::action::{Action, ActionBus, Dispatched, Verdict};
use crate::engine::Battle;
use crate::error::{DispatchError, MoveError, SelectionError};
use crate::outcome::OutcomePart;
use crate::state::{Combatant, CombatantId};

/// Template describing a move a combatant is capable of performing.
pub trait MoveOption: fmt::Debug {
    fn name(&self) -> &str;

    /// Lower values resolve first.
    fn priority(&self) -> i32 {
        0
    }

    /// Descriptive tags (e.g. `"slash"`) that damage modifiers can match on.
    fn tags(&self) -> &[String] {
        &[]
    }

    /// Whether `user` is in a state to use this option at all.
    fn can_use(&self, _user: &Combatant) -> Verdict {
        Verdict::Allow
    }

    fn targeting_option(&self, user: &Combatant) -> TargetingOption;

    /// Validates an explicit target set for `user`.
    fn can_choose_targets(
        &self,
        battle: &Battle,
        user: &Combatant,
        targets: &[CombatantId],
    ) -> Result<(), SelectionError> {
        self.targeting_option(user)
            .validate(battle, user.id(), targets)
    }

    /// Executes the move, dispatching its actions through `ctx`.
    ///
    /// The `UseMove` part is emitted by the turn; implementations record the
    /// parts their own actions produced in `performance` as they go. Parts
    /// recorded before an error are kept in the outcome.
    fn perform(
        &self,
        mv: &Move,
        ctx: &mut MoveContext<'_>,
        performance: &mut MovePerformance,
    ) -> Result<(), MoveError>;
}

/// What a move strategy reports back to the turn, filled in while it runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MovePerformance {
    pub parts: Vec<OutcomePart>,
    pub goal_reached: bool,
}

/// A concrete move chosen for this turn.
#[derive(Clone)]
pub struct Move {
    option: Arc<dyn MoveOption>,
    priority: i32,
    user: CombatantId,
    targets: Vec<CombatantId>,
}

impl Move {
    /// Creates a move from an option. Target validation is the caller's job;
    /// only the non-empty rule is enforced here.
    pub fn new(
        option: Arc<dyn MoveOption>,
        user: CombatantId,
        targets: Vec<CombatantId>,
    ) -> Result<Self, SelectionError> {
        if targets.is_empty() {
            return Err(SelectionError::NoTargets);
        }
        Ok(Self {
            priority: option.priority(),
            option,
            user,
            targets,
        })
    }

    pub fn option(&self) -> &Arc<dyn MoveOption> {
        &self.option
    }

    pub fn name(&self) -> &str {
        self.option.name()
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn user(&self) -> CombatantId {
        self.user
    }

    pub fn targets(&self) -> &[CombatantId] {
        &self.targets
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Move")
            .field("option", &self.option.name())
            .field("priority", &self.priority)
            .field("user", &self.user)
            .field("targets", &self.targets)
            .finish()
    }
}

/// Access a move strategy gets while it runs.
pub struct MoveContext<'a> {
    pub battle: &'a mut Battle,
    pub bus: &'a mut ActionBus,
}

impl<'a> MoveContext<'a> {
    pub fn new(battle: &'a mut Battle, bus: &'a mut ActionBus) -> Self {
        Self { battle, bus }
    }

    /// Dispatches an action belonging to this battle.
    pub fn dispatch(&mut self, action: Action) -> Result<Dispatched, DispatchError> {
        self.bus.dispatch(action, Some(&mut *self.battle))
    }
}
