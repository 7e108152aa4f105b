//! Action domain - every state mutation travels as an [`Action`].
//!
//! An action is a mutable event. It is handed to each registered
//! [`ActionManager`] exactly once, in registration order, and only then
//! committed. Managers may veto it (with a reason), amend its payload (for
//! example push a damage multiplier), append outcome parts, or queue distinct
//! follow-up actions that the bus dispatches after the commit.
//!
//! # Module Structure
//!
//! - `bus`: [`ActionBus`], the [`ActionManager`] trait and dispatch
//! - `damage`: HP damage / effect infliction and the rule that routes it to effects
//! - `effect`: installing and removing effects on combatants
//! - `lifecycle`: battle created / start / end notifications
//! - `location`: world-level location changes (vetoed during battles)

pub mod bus;
pub mod damage;
pub mod effect;
pub mod lifecycle;
pub mod location;

pub use bus::{ActionBus, ActionManager, Dispatched, FnManager, Notice};
pub use damage::{Damage, DamageAction, DamageCause, DamageRule, DamageSource, HpDamage};
pub use effect::{EffectAddedAction, EffectRemovedAction};
pub use lifecycle::{BattleEndAction, BattleLifecycleAction, BattleResult};
pub use location::MoveLocationAction;

use crate::effect::Effect;
use crate::engine::Battle;
use crate::error::{CommitError, DispatchError};
use crate::outcome::OutcomePart;
use crate::state::CombatantId;

// ============================================================================
// Verdict
// ============================================================================

/// Whether an action (or a move, or a selection) may go ahead.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Verdict {
    #[default]
    Allow,
    /// Refused, with a human-readable reason.
    Veto(String),
}

impl Verdict {
    pub fn veto(reason: impl Into<String>) -> Self {
        Self::Veto(reason.into())
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Allow => None,
            Self::Veto(reason) => Some(reason),
        }
    }

    /// Combines two votes. The first veto wins; later vetoes are ignored.
    #[must_use]
    pub fn and(self, other: Verdict) -> Verdict {
        match self {
            Self::Allow => other,
            veto => veto,
        }
    }
}

// ============================================================================
// Action
// ============================================================================

/// Payload variants carried by an [`Action`].
#[derive(Debug, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    Damage(DamageAction),
    EffectAdded(EffectAddedAction),
    EffectRemoved(EffectRemovedAction),
    BattleCreated(BattleLifecycleAction),
    BattleStart(BattleLifecycleAction),
    BattleEnd(BattleEndAction),
    MoveLocation(MoveLocationAction),
}

/// A mutable event routed through the [`ActionBus`].
#[derive(Debug)]
pub struct Action {
    kind: ActionKind,
    verdict: Verdict,
    parts: Vec<OutcomePart>,
    initiator: Option<CombatantId>,
    send_on_can_not: bool,
    follow_ups: Vec<Action>,
}

impl Action {
    pub fn new(kind: impl Into<ActionKind>) -> Self {
        Self {
            kind: kind.into(),
            verdict: Verdict::Allow,
            parts: Vec::new(),
            initiator: None,
            send_on_can_not: false,
            follow_ups: Vec::new(),
        }
    }

    /// Installs `effect` on `target` once committed.
    pub fn effect_added(target: CombatantId, effect: Box<dyn Effect>) -> Self {
        Self::new(EffectAddedAction::new(target, effect))
    }

    /// Records the combatant on whose behalf the action runs (builder pattern).
    #[must_use]
    pub fn with_initiator(mut self, initiator: CombatantId) -> Self {
        self.initiator = Some(initiator);
        self
    }

    /// Forwards the veto reason to the initiator if the action is refused.
    #[must_use]
    pub fn notify_on_veto(mut self) -> Self {
        self.send_on_can_not = true;
        self
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut ActionKind {
        &mut self.kind
    }

    /// Returns the snake_case name of the payload variant.
    pub fn name(&self) -> &'static str {
        (&self.kind).into()
    }

    pub fn verdict(&self) -> &Verdict {
        &self.verdict
    }

    pub fn can_do(&self) -> bool {
        self.verdict.is_allowed()
    }

    pub fn initiator(&self) -> Option<CombatantId> {
        self.initiator
    }

    pub fn sends_on_can_not(&self) -> bool {
        self.send_on_can_not
    }

    /// Refuses the action. Only the first reason is kept.
    pub fn veto(&mut self, reason: impl Into<String>) {
        if self.verdict.is_allowed() {
            self.verdict = Verdict::Veto(reason.into());
        }
    }

    pub fn push_part(&mut self, part: OutcomePart) {
        self.parts.push(part);
    }

    pub fn parts(&self) -> &[OutcomePart] {
        &self.parts
    }

    /// Queues a distinct action to be dispatched right after this one commits.
    pub fn queue(&mut self, follow_up: Action) {
        self.follow_ups.push(follow_up);
    }

    pub(crate) fn take_follow_ups(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.follow_ups)
    }

    pub(crate) fn into_parts(self) -> Vec<OutcomePart> {
        self.parts
    }

    /// Performs the action's own effect. Only called while the verdict allows it.
    pub(crate) fn commit(&mut self, battle: Option<&mut Battle>) -> Result<(), DispatchError> {
        let action = self.name();
        let wrap = |source: CommitError| DispatchError::Commit { action, source };

        match &mut self.kind {
            ActionKind::Damage(damage) => {
                let battle = battle.ok_or(CommitError::NoBattle { action }).map_err(wrap)?;
                let part = damage.commit(battle).map_err(wrap)?;
                self.parts.push(part);
            }
            ActionKind::EffectAdded(added) => {
                let battle = battle.ok_or(CommitError::NoBattle { action }).map_err(wrap)?;
                let part = added.commit(battle).map_err(wrap)?;
                self.parts.push(part);
            }
            ActionKind::EffectRemoved(removed) => {
                let battle = battle.ok_or(CommitError::NoBattle { action }).map_err(wrap)?;
                if let Some(part) = removed.commit(battle).map_err(wrap)? {
                    self.parts.push(part);
                }
            }
            // Lifecycle and world actions carry no state of their own: the
            // battle (or the host) applies them once the verdict is known.
            ActionKind::BattleCreated(_)
            | ActionKind::BattleStart(_)
            | ActionKind::BattleEnd(_)
            | ActionKind::MoveLocation(_) => {}
        }

        Ok(())
    }
}

impl From<DamageAction> for ActionKind {
    fn from(action: DamageAction) -> Self {
        Self::Damage(action)
    }
}

impl From<EffectAddedAction> for ActionKind {
    fn from(action: EffectAddedAction) -> Self {
        Self::EffectAdded(action)
    }
}

impl From<EffectRemovedAction> for ActionKind {
    fn from(action: EffectRemovedAction) -> Self {
        Self::EffectRemoved(action)
    }
}

impl From<BattleEndAction> for ActionKind {
    fn from(action: BattleEndAction) -> Self {
        Self::BattleEnd(action)
    }
}

impl From<MoveLocationAction> for ActionKind {
    fn from(action: MoveLocationAction) -> Self {
        Self::MoveLocation(action)
    }
}
