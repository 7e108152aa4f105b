//! Move choosers: per-combatant strategies that yield the move for a turn.
//!
//! Choosers are pull-based. The turn polls every chooser each tick and a
//! chooser that has nothing yet returns `None`; the turn keeps polling.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::action::Verdict;
use crate::engine::Battle;
use crate::error::SelectionError;
use crate::moves::{Move, MoveOption};
use crate::rng::Pcg32;
use crate::state::CombatantId;

/// Chooser variants, as recorded in battle snapshots.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ChooserKind {
    /// Host-driven (player UI).
    Set,
    /// Uniform random choice among valid options.
    Random,
    /// Bound to an input queue drained by the engine thread.
    Queue,
}

/// What a chooser sees while it is polled.
#[derive(Clone, Copy)]
pub struct ChoiceView<'a> {
    pub battle: &'a Battle,
    pub user: CombatantId,
}

/// Per-combatant move strategy.
pub trait MoveChooser: fmt::Debug {
    fn kind(&self) -> ChooserKind;

    /// Returns the move for this turn, or `None` while undecided.
    fn get_move(&mut self, view: &ChoiceView<'_>) -> Option<Move>;

    /// Clears per-turn state at the end of a turn.
    fn reset(&mut self) {}

    /// Host-driven choosers expose themselves so the battle can route
    /// selections to them.
    fn as_set_mut(&mut self) -> Option<&mut SetChooser> {
        None
    }
}

/// Runs the full selection check for `user`: `can_use`, target validation, then
/// every effect on the user in installation order.
pub fn validate_selection(
    battle: &Battle,
    user: CombatantId,
    option: &dyn MoveOption,
    targets: &[CombatantId],
) -> Result<(), SelectionError> {
    let combatant = battle
        .combatant(user)
        .ok_or(SelectionError::UnknownCombatant(user))?;

    if let Verdict::Veto(reason) = option.can_use(combatant) {
        return Err(SelectionError::CannotUse(reason));
    }
    option.can_choose_targets(battle, combatant, targets)?;

    let verdict = battle
        .effects(user)
        .unwrap_or_default()
        .iter()
        .fold(Verdict::Allow, |verdict, attached| {
            verdict.and(attached.effect.can_choose(combatant, option, targets))
        });
    match verdict {
        Verdict::Allow => Ok(()),
        Verdict::Veto(reason) => Err(SelectionError::Vetoed(reason)),
    }
}

// ============================================================================
// Set
// ============================================================================

/// Holds the move a host selected for the current turn.
#[derive(Debug, Default)]
pub struct SetChooser {
    pending: Option<Move>,
}

impl SetChooser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and stores a selection, replacing any earlier one.
    pub fn set(
        &mut self,
        battle: &Battle,
        user: CombatantId,
        option: Arc<dyn MoveOption>,
        targets: Vec<CombatantId>,
    ) -> Result<(), SelectionError> {
        validate_selection(battle, user, option.as_ref(), &targets)?;
        self.pending = Some(Move::new(option, user, targets)?);
        Ok(())
    }

    pub fn pending(&self) -> Option<&Move> {
        self.pending.as_ref()
    }
}

impl MoveChooser for SetChooser {
    fn kind(&self) -> ChooserKind {
        ChooserKind::Set
    }

    fn get_move(&mut self, _view: &ChoiceView<'_>) -> Option<Move> {
        self.pending.clone()
    }

    fn reset(&mut self) {
        self.pending = None;
    }

    fn as_set_mut(&mut self) -> Option<&mut SetChooser> {
        Some(self)
    }
}

// ============================================================================
// Random
// ============================================================================

/// Picks a random valid option with its recommended targets.
///
/// Options are tried in a shuffled order; the first one passing every check
/// wins. When none does, the battle's fallback move is returned with its
/// recommended targets and without further checks, so the chooser always
/// produces a move.
#[derive(Clone, Debug)]
pub struct RandomChooser {
    rng: Pcg32,
}

impl RandomChooser {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Pcg32::seeded(seed),
        }
    }
}

impl MoveChooser for RandomChooser {
    fn kind(&self) -> ChooserKind {
        ChooserKind::Random
    }

    fn get_move(&mut self, view: &ChoiceView<'_>) -> Option<Move> {
        let battle = view.battle;
        let user = battle.combatant(view.user)?;

        let mut options = battle.move_options(view.user);
        self.rng.shuffle(&mut options);

        for option in options {
            let targets = option
                .targeting_option(user)
                .get_recommended_targets(battle, view.user);
            match validate_selection(battle, view.user, option.as_ref(), &targets) {
                Ok(()) => return Move::new(option, view.user, targets).ok(),
                Err(reason) => trace!(
                    target: "battle_core::chooser",
                    combatant = %view.user,
                    option = option.name(),
                    %reason,
                    "random choice rejected"
                ),
            }
        }

        let fallback = battle.struggle();
        let targets = fallback
            .targeting_option(user)
            .get_recommended_targets(battle, view.user);
        Move::new(fallback, view.user, targets).ok()
    }
}
