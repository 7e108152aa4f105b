//! One round of simultaneous selection followed by ordered resolution.
//!
//! ```text
//! created --start--> polling --all chosen--> resolving --> done
//! ```
//!
//! Polling and resolution happen in the same tick once every active target
//! has a move. Resolution is atomic: nothing outside the engine observes a
//! half-resolved turn.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{Battle, BattleEvent};
use crate::action::{Action, ActionBus, EffectRemovedAction, Verdict};
use crate::chooser::{ChoiceView, ChooserKind, MoveChooser};
use crate::effect::{Effect, EffectContext, EffectId};
use crate::moves::{Move, MoveContext, MovePerformance};
use crate::outcome::{CombatantRef, MoveOutcome, OutcomePart, TurnReport};
use crate::state::{Combatant, CombatantId, TeamId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TurnPhase {
    Created,
    Polling,
    Resolving,
    Done,
}

/// An effect installed on a target, with its battle-wide identity.
#[derive(Debug)]
pub struct AttachedEffect {
    pub id: EffectId,
    pub effect: Box<dyn Effect>,
}

/// Per-turn view over one combatant.
///
/// Rebuilt every turn; effects and the chooser move forward into the next
/// turn's target, everything else starts fresh.
#[derive(Debug)]
pub struct Target {
    pub(crate) combatant: CombatantId,
    pub(crate) team: TeamId,
    /// False when the combatant was fainted as the turn began; such targets
    /// are not polled and do not act.
    pub(crate) active: bool,
    pub(crate) effects: Vec<AttachedEffect>,
    pub(crate) chooser: Option<Box<dyn MoveChooser>>,
    pub(crate) chosen: Option<Move>,
    pub(crate) hits: BTreeMap<CombatantId, bool>,
    pub(crate) moves_left: u32,
}

impl Target {
    pub(crate) fn new(combatant: &Combatant, team: TeamId, chooser: Box<dyn MoveChooser>) -> Self {
        Self {
            combatant: combatant.id(),
            team,
            active: !combatant.is_fainted(),
            effects: Vec::new(),
            chooser: Some(chooser),
            chosen: None,
            hits: BTreeMap::new(),
            moves_left: 1,
        }
    }

    /// Builds the next turn's target, carrying effects and the (reset) chooser.
    pub(crate) fn carry_over(mut self, active: bool) -> Self {
        if let Some(chooser) = self.chooser.as_mut() {
            chooser.reset();
        }
        Self {
            combatant: self.combatant,
            team: self.team,
            active,
            effects: self.effects,
            chooser: self.chooser,
            chosen: None,
            hits: BTreeMap::new(),
            moves_left: 1,
        }
    }

    pub fn combatant(&self) -> CombatantId {
        self.combatant
    }

    pub fn team(&self) -> TeamId {
        self.team
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn effects(&self) -> &[AttachedEffect] {
        &self.effects
    }

    pub fn has_effect(&self, name: &str) -> bool {
        self.effects.iter().any(|a| a.effect.name() == name)
    }

    pub fn chooser_kind(&self) -> Option<ChooserKind> {
        self.chooser.as_ref().map(|c| c.kind())
    }

    pub fn chosen(&self) -> Option<&Move> {
        self.chosen.as_ref()
    }

    /// `Some(true)` if `attacker`'s damage landed this turn, `Some(false)` if
    /// it was vetoed, `None` if `attacker` never aimed at this target.
    pub fn was_hit_by(&self, attacker: CombatantId) -> Option<bool> {
        self.hits.get(&attacker).copied()
    }

    pub fn moves_left(&self) -> u32 {
        self.moves_left
    }
}

/// One round of a battle.
#[derive(Debug)]
pub struct Turn {
    pub(crate) number: u32,
    pub(crate) phase: TurnPhase,
    pub(crate) targets: Vec<Target>,
    pub(crate) outcomes: Vec<MoveOutcome>,
    pub(crate) leading: Vec<OutcomePart>,
    pub(crate) trailing: Vec<OutcomePart>,
}

impl Turn {
    pub(crate) fn new(number: u32, targets: Vec<Target>) -> Self {
        Self {
            number,
            phase: TurnPhase::Created,
            targets,
            outcomes: Vec::new(),
            leading: Vec::new(),
            trailing: Vec::new(),
        }
    }

    pub(crate) fn start(&mut self) {
        if self.phase == TurnPhase::Created {
            self.phase = TurnPhase::Polling;
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == TurnPhase::Done
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn target(&self, combatant: CombatantId) -> Option<&Target> {
        self.targets.iter().find(|t| t.combatant == combatant)
    }

    pub(crate) fn target_mut(&mut self, combatant: CombatantId) -> Option<&mut Target> {
        self.targets.iter_mut().find(|t| t.combatant == combatant)
    }

    pub(crate) fn target_index(&self, combatant: CombatantId) -> Option<usize> {
        self.targets.iter().position(|t| t.combatant == combatant)
    }

    /// Outcomes in resolution order.
    pub fn outcomes(&self) -> &[MoveOutcome] {
        &self.outcomes
    }

    pub fn leading(&self) -> &[OutcomePart] {
        &self.leading
    }

    pub fn trailing(&self) -> &[OutcomePart] {
        &self.trailing
    }

    /// True once every active target has a move.
    pub fn all_chosen(&self) -> bool {
        self.targets.iter().all(|t| !t.active || t.chosen.is_some())
    }

    pub fn report(&self) -> TurnReport {
        TurnReport {
            number: self.number,
            leading: self.leading.clone(),
            outcomes: self.outcomes.clone(),
            trailing: self.trailing.clone(),
        }
    }
}

#[derive(Clone, Copy)]
enum Hook<'m> {
    BeforeTurn(&'m Move),
    AfterMove(&'m Move, &'m MoveOutcome),
    AfterTurn(&'m Move),
}

impl Hook<'_> {
    fn name(&self) -> &'static str {
        match self {
            Self::BeforeTurn(_) => "before_turn",
            Self::AfterMove(..) => "after_move",
            Self::AfterTurn(_) => "after_turn",
        }
    }
}

impl Battle {
    pub(crate) fn target_at(&self, index: usize) -> Option<&Target> {
        self.turn.as_ref()?.targets.get(index)
    }

    pub(crate) fn target_at_mut(&mut self, index: usize) -> Option<&mut Target> {
        self.turn.as_mut()?.targets.get_mut(index)
    }

    /// Advances the current turn by one tick.
    pub(crate) fn tick_turn(&mut self, bus: &mut ActionBus) {
        let polling = self
            .turn
            .as_ref()
            .is_some_and(|t| t.phase == TurnPhase::Polling);
        if !polling {
            return;
        }

        self.poll_choosers();
        if self.turn.as_ref().is_some_and(Turn::all_chosen) {
            self.resolve(bus);
        }
    }

    fn poll_choosers(&mut self) {
        let count = self.turn.as_ref().map_or(0, |t| t.targets.len());

        for index in 0..count {
            let Some(target) = self.target_at_mut(index) else {
                break;
            };
            if !target.active || target.chosen.is_some() {
                continue;
            }
            let user = target.combatant;
            let Some(mut chooser) = target.chooser.take() else {
                continue;
            };

            let chosen = chooser.get_move(&ChoiceView { battle: self, user });

            if let Some(target) = self.target_at_mut(index) {
                target.chooser = Some(chooser);
                if let Some(mv) = &chosen {
                    debug!(
                        target: "battle_core::turn",
                        combatant = %user,
                        option = mv.name(),
                        priority = mv.priority(),
                        "move chosen"
                    );
                }
                target.chosen = chosen;
            }
        }
    }

    fn resolve(&mut self, bus: &mut ActionBus) {
        let Some(turn) = self.turn.as_mut() else {
            return;
        };
        turn.phase = TurnPhase::Resolving;
        let number = turn.number;

        let mut moves: Vec<(usize, Move)> = turn
            .targets
            .iter()
            .enumerate()
            .filter_map(|(index, t)| t.chosen.clone().map(|mv| (index, mv)))
            .collect();
        moves.sort_by_key(|(index, mv)| (mv.priority(), *index));

        debug!(
            target: "battle_core::turn",
            battle = %self.id,
            turn = number,
            moves = moves.len(),
            "resolving turn"
        );

        let mut leading = Vec::new();
        for (index, mv) in &moves {
            leading.extend(self.run_effect_hooks(bus, *index, Hook::BeforeTurn(mv)));
        }

        for (index, mv) in &moves {
            let mut outcome = self.resolve_move(bus, *index, mv);
            let after = self.run_effect_hooks(bus, *index, Hook::AfterMove(mv, &outcome));
            outcome.parts.extend(after);

            self.events.push(BattleEvent::Outcome(outcome.clone()));
            if let Some(turn) = self.turn.as_mut() {
                turn.outcomes.push(outcome);
            }
        }

        let mut trailing = Vec::new();
        for (index, mv) in &moves {
            trailing.extend(self.run_effect_hooks(bus, *index, Hook::AfterTurn(mv)));
        }
        trailing.extend(self.decay_effects(bus, number));

        if let Some(turn) = self.turn.as_mut() {
            turn.leading.extend(leading);
            turn.trailing.extend(trailing);
            turn.phase = TurnPhase::Done;
            self.events.push(BattleEvent::TurnEnded(turn.report()));
        }
    }

    fn resolve_move(&mut self, bus: &mut ActionBus, index: usize, mv: &Move) -> MoveOutcome {
        let user = self
            .combatant(mv.user())
            .map(CombatantRef::from)
            .unwrap_or_else(|| CombatantRef {
                id: mv.user(),
                name: mv.user().to_string(),
            });
        let mut outcome = MoveOutcome {
            user: user.clone(),
            move_name: mv.name().to_owned(),
            executed: false,
            goal_reached: false,
            parts: Vec::new(),
        };

        let moves_left = self.target_at(index).map_or(0, |t| t.moves_left);
        let verdict = if moves_left == 0 {
            Verdict::veto(format!("{user} has no moves left"))
        } else {
            self.can_move_votes(index, mv)
        };
        if let Verdict::Veto(reason) = verdict {
            debug!(
                target: "battle_core::turn",
                combatant = %mv.user(),
                option = mv.name(),
                %reason,
                "move vetoed"
            );
            outcome.parts.push(OutcomePart::MoveFailed { user, reason });
            return outcome;
        }

        if let Some(target) = self.target_at_mut(index) {
            target.moves_left -= 1;
        }

        let targets = mv
            .targets()
            .iter()
            .filter_map(|id| self.combatant(*id))
            .map(CombatantRef::from)
            .collect();
        outcome.parts.push(OutcomePart::UseMove {
            user: user.clone(),
            move_name: mv.name().to_owned(),
            targets,
        });

        let option = Arc::clone(mv.option());
        let mut performance = MovePerformance::default();
        let mut ctx = MoveContext::new(self, bus);
        let result = option.perform(mv, &mut ctx, &mut performance);
        outcome.parts.extend(performance.parts);
        match result {
            Ok(()) => {
                outcome.executed = true;
                outcome.goal_reached = performance.goal_reached;
            }
            Err(error) => {
                warn!(
                    target: "battle_core::turn",
                    combatant = %mv.user(),
                    option = mv.name(),
                    %error,
                    "move failed while executing"
                );
                outcome.parts.push(OutcomePart::MoveFailed {
                    user,
                    reason: error.to_string(),
                });
            }
        }

        outcome
    }

    /// Every effect on the user votes; the first veto's reason is kept.
    fn can_move_votes(&self, index: usize, mv: &Move) -> Verdict {
        let (Some(owner), Some(target)) = (self.combatant(mv.user()), self.target_at(index)) else {
            return Verdict::Allow;
        };
        target
            .effects
            .iter()
            .fold(Verdict::Allow, |verdict, attached| {
                verdict.and(attached.effect.can_move(owner, mv))
            })
    }

    /// Runs one lifecycle hook on every effect of the target at `index`.
    ///
    /// Each effect is taken out of its list while it runs so it can reach the
    /// battle mutably, then put back at its old position. Effects installed
    /// while the hooks run are not visited until the next hook.
    fn run_effect_hooks(
        &mut self,
        bus: &mut ActionBus,
        index: usize,
        hook: Hook<'_>,
    ) -> Vec<OutcomePart> {
        let Some(target) = self.target_at(index) else {
            return Vec::new();
        };
        let owner = target.combatant;
        let ids: Vec<EffectId> = target.effects.iter().map(|a| a.id).collect();
        let turn = self.turn.as_ref().map_or(0, |t| t.number);

        let mut parts = Vec::new();
        for id in ids {
            let Some(target) = self.target_at_mut(index) else {
                break;
            };
            let Some(position) = target.effects.iter().position(|a| a.id == id) else {
                continue;
            };
            let mut attached = target.effects.remove(position);

            let result = {
                let mut ctx = EffectContext {
                    owner,
                    turn,
                    battle: &mut *self,
                    bus: &mut *bus,
                };
                match hook {
                    Hook::BeforeTurn(mv) => attached.effect.before_turn(&mut ctx, mv),
                    Hook::AfterMove(mv, outcome) => {
                        attached.effect.after_move(&mut ctx, mv, outcome)
                    }
                    Hook::AfterTurn(mv) => attached.effect.after_turn(&mut ctx, mv),
                }
            };

            match result {
                Ok(emitted) => parts.extend(emitted),
                Err(error) => {
                    warn!(
                        target: "battle_core::turn",
                        combatant = %owner,
                        effect = attached.effect.name(),
                        hook = hook.name(),
                        %error,
                        "effect hook failed"
                    );
                    parts.push(OutcomePart::engine_error(&error));
                }
            }

            if let Some(target) = self.target_at_mut(index) {
                let position = position.min(target.effects.len());
                target.effects.insert(position, attached);
            }
        }

        parts
    }

    /// Asks every effect whether it stays; removals go through the bus.
    fn decay_effects(&mut self, bus: &mut ActionBus, number: u32) -> Vec<OutcomePart> {
        let mut expired = Vec::new();
        if let Some(turn) = self.turn.as_mut() {
            for target in &mut turn.targets {
                for attached in &mut target.effects {
                    if !attached.effect.should_stay(number) {
                        expired.push(EffectRemovedAction::new(
                            target.combatant,
                            attached.id,
                            attached.effect.name(),
                        ));
                    }
                }
            }
        }

        let mut parts = Vec::new();
        for removal in expired {
            match bus.dispatch(Action::new(removal), Some(&mut *self)) {
                Ok(dispatched) => parts.extend(dispatched.parts),
                Err(error) => {
                    warn!(target: "battle_core::turn", %error, "effect removal failed");
                    parts.push(OutcomePart::engine_error(&error));
                }
            }
        }
        parts
    }
}
