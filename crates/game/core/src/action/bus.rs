//! Action bus: delivers each action to the registered managers, then commits.

use std::fmt;

use tracing::{debug, trace};

use super::{Action, DamageRule, Verdict};
use crate::config::BattleConfig;
use crate::engine::Battle;
use crate::error::{DispatchError, RuleError};
use crate::outcome::OutcomePart;
use crate::state::CombatantId;

/// A rule that observes every dispatched action before it commits.
///
/// Managers may veto the action, amend its payload, append outcome parts or
/// queue distinct follow-up actions. They never dispatch re-entrantly.
pub trait ActionManager {
    /// Stable name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Inspects (and possibly amends) an action before commit.
    ///
    /// `battle` is the battle the action belongs to, if any. Returning an error
    /// aborts the dispatch and leaves the action uncommitted.
    fn on_action(&mut self, action: &mut Action, battle: Option<&mut Battle>)
    -> Result<(), RuleError>;
}

/// Adapts a closure into an [`ActionManager`].
pub struct FnManager<F> {
    name: &'static str,
    f: F,
}

impl<F> FnManager<F>
where
    F: FnMut(&mut Action, Option<&mut Battle>) -> Result<(), RuleError>,
{
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F> ActionManager for FnManager<F>
where
    F: FnMut(&mut Action, Option<&mut Battle>) -> Result<(), RuleError>,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn on_action(
        &mut self,
        action: &mut Action,
        battle: Option<&mut Battle>,
    ) -> Result<(), RuleError> {
        (self.f)(action, battle)
    }
}

/// A veto reason addressed to the combatant that initiated the action.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Notice {
    pub recipient: CombatantId,
    pub text: String,
}

/// Result of a completed dispatch.
#[derive(Clone, Debug, PartialEq)]
pub struct Dispatched {
    /// Final verdict of the dispatched action (follow-ups excluded).
    pub verdict: Verdict,
    /// Parts produced by the action, followed by those of its follow-ups.
    pub parts: Vec<OutcomePart>,
}

impl Dispatched {
    pub fn committed(&self) -> bool {
        self.verdict.is_allowed()
    }
}

/// Ordered set of managers plus the notices produced by vetoed actions.
pub struct ActionBus {
    managers: Vec<Box<dyn ActionManager>>,
    notices: Vec<Notice>,
    max_depth: usize,
}

impl ActionBus {
    /// Creates a bus without any managers.
    pub fn new(max_depth: usize) -> Self {
        Self {
            managers: Vec::new(),
            notices: Vec::new(),
            max_depth,
        }
    }

    /// Creates a bus with the rules every battle relies on ([`DamageRule`]).
    pub fn with_core_rules(config: &BattleConfig) -> Self {
        let mut bus = Self::new(config.max_action_depth);
        bus.register(DamageRule);
        bus
    }

    /// Appends a manager. Registration order is delivery order.
    pub fn register(&mut self, manager: impl ActionManager + 'static) {
        debug!(
            target: "battle_core::bus",
            manager = manager.name(),
            position = self.managers.len(),
            "registered action manager"
        );
        self.managers.push(Box::new(manager));
    }

    /// Registers a closure as a manager.
    pub fn register_fn<F>(&mut self, name: &'static str, f: F)
    where
        F: FnMut(&mut Action, Option<&mut Battle>) -> Result<(), RuleError> + 'static,
    {
        self.register(FnManager::new(name, f));
    }

    /// Returns manager names in delivery order.
    pub fn managers(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.managers.iter().map(|m| m.name())
    }

    /// Drains notices recorded since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Dispatches an action: every manager sees it once, in order, then it is
    /// committed if no manager vetoed it. Queued follow-ups are dispatched after a
    /// successful commit; their parts are appended after the parent's.
    ///
    /// A vetoed action is not committed and yields a [`OutcomePart::Vetoed`] part.
    pub fn dispatch(
        &mut self,
        action: Action,
        battle: Option<&mut Battle>,
    ) -> Result<Dispatched, DispatchError> {
        self.dispatch_at(action, battle, 0)
    }

    fn dispatch_at(
        &mut self,
        mut action: Action,
        mut battle: Option<&mut Battle>,
        depth: usize,
    ) -> Result<Dispatched, DispatchError> {
        let name = action.name();
        if depth > self.max_depth {
            return Err(DispatchError::ChainTooDeep {
                action: name,
                depth,
            });
        }

        for manager in self.managers.iter_mut() {
            manager
                .on_action(&mut action, battle.as_deref_mut())
                .map_err(|source| DispatchError::ManagerFailed {
                    manager: manager.name(),
                    action: name,
                    source,
                })?;
        }

        if let Verdict::Veto(reason) = action.verdict().clone() {
            debug!(
                target: "battle_core::bus",
                action = name,
                initiator = ?action.initiator(),
                reason = %reason,
                "action vetoed"
            );
            if action.sends_on_can_not()
                && let Some(recipient) = action.initiator()
            {
                self.notices.push(Notice {
                    recipient,
                    text: reason.clone(),
                });
            }
            action.push_part(OutcomePart::Vetoed { reason });
            return Ok(Dispatched {
                verdict: action.verdict().clone(),
                parts: action.into_parts(),
            });
        }

        action.commit(battle.as_deref_mut())?;
        trace!(target: "battle_core::bus", action = name, depth, "action committed");

        let follow_ups = action.take_follow_ups();
        let verdict = action.verdict().clone();
        let mut parts = action.into_parts();
        for follow_up in follow_ups {
            let dispatched = self.dispatch_at(follow_up, battle.as_deref_mut(), depth + 1)?;
            parts.extend(dispatched.parts);
        }

        Ok(Dispatched { verdict, parts })
    }
}

impl fmt::Debug for ActionBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionBus")
            .field("managers", &self.managers().collect::<Vec<_>>())
            .field("pending_notices", &self.notices.len())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}
