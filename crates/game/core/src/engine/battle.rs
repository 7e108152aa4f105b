use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::turn::{AttachedEffect, Target, Turn, TurnPhase};
use crate::action::{
    Action, ActionBus, BattleEndAction, BattleLifecycleAction, BattleResult, Dispatched,
};
use crate::chooser::{ChooserKind, MoveChooser, RandomChooser};
use crate::config::BattleConfig;
use crate::effect::{Effect, EffectId};
use crate::error::{BattleError, CommitError, SelectionError};
use crate::moves::{MoveOption, TargetCategory, WeaponMove};
use crate::outcome::{MoveOutcome, TurnReport};
use crate::rng::derive_seed;
use crate::state::{Combatant, CombatantId, Team, TeamId};

/// Identifier of a battle within its manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleId(pub u64);

impl fmt::Display for BattleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "battle-{}", self.0)
    }
}

/// Observable output of a battle, drained by the host after each tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BattleEvent {
    /// A move resolved.
    Outcome(MoveOutcome),
    /// A turn finished; carries the full report.
    TurnEnded(TurnReport),
    /// Free-form battle message (start, team eliminated, end).
    Broadcast(String),
}

/// A bounded fight between teams, resolved in turns.
#[derive(Debug)]
pub struct Battle {
    pub(crate) id: BattleId,
    pub(crate) config: BattleConfig,
    pub(crate) teams: Vec<Team>,
    pub(crate) turn: Option<Turn>,
    pub(crate) started: bool,
    pub(crate) ended: bool,
    pub(crate) result: Option<BattleResult>,
    /// Teams already announced as defeated.
    pub(crate) eliminated: Vec<bool>,
    /// Choosers configured before the battle starts.
    pub(crate) choosers: BTreeMap<CombatantId, Box<dyn MoveChooser>>,
    pub(crate) next_effect_id: u64,
    pub(crate) events: Vec<BattleEvent>,
    pub(crate) struggle: Arc<dyn MoveOption>,
}

impl Battle {
    /// Creates a battle. Needs at least two non-empty teams and unique ids.
    pub fn new(id: BattleId, teams: Vec<Team>, config: BattleConfig) -> Result<Self, BattleError> {
        if teams.len() < 2 {
            return Err(BattleError::NotEnoughTeams(teams.len()));
        }
        let mut seen = BTreeSet::new();
        for team in &teams {
            if team.members().is_empty() {
                return Err(BattleError::EmptyTeam(team.name().to_owned()));
            }
            for member in team.members() {
                if !seen.insert(member.id()) {
                    return Err(BattleError::DuplicateCombatant(member.id()));
                }
            }
        }

        let struggle: Arc<dyn MoveOption> = Arc::new(WeaponMove::struggle(&config.struggle_name));
        Ok(Self {
            id,
            eliminated: vec![false; teams.len()],
            config,
            teams,
            turn: None,
            started: false,
            ended: false,
            result: None,
            choosers: BTreeMap::new(),
            next_effect_id: 0,
            events: Vec::new(),
            struggle,
        })
    }

    // ===== accessors =====

    pub fn id(&self) -> BattleId {
        self.id
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.get(id.0)
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn result(&self) -> Option<&BattleResult> {
        self.result.as_ref()
    }

    pub fn turn(&self) -> Option<&Turn> {
        self.turn.as_ref()
    }

    /// Combatants in battle order (team order, then member order).
    pub fn combatants(&self) -> impl Iterator<Item = &Combatant> + '_ {
        self.teams.iter().flat_map(|team| team.members().iter())
    }

    pub fn combatant_ids(&self) -> Vec<CombatantId> {
        self.combatants().map(Combatant::id).collect()
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.teams.iter().find_map(|team| team.member(id))
    }

    pub(crate) fn combatant_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.teams.iter_mut().find_map(|team| team.member_mut(id))
    }

    pub fn contains(&self, id: CombatantId) -> bool {
        self.combatant(id).is_some()
    }

    pub fn team_of(&self, id: CombatantId) -> Option<TeamId> {
        self.teams
            .iter()
            .position(|team| team.contains(id))
            .map(TeamId)
    }

    /// How `target` relates to `user`. `None` if either is not in this battle.
    pub fn category_of(&self, user: CombatantId, target: CombatantId) -> Option<TargetCategory> {
        let user_team = self.team_of(user)?;
        let target_team = self.team_of(target)?;
        Some(if user == target {
            TargetCategory::User
        } else if user_team == target_team {
            TargetCategory::Teammate
        } else {
            TargetCategory::Enemy
        })
    }

    /// Teams with at least one standing member.
    pub fn alive_teams(&self) -> Vec<TeamId> {
        self.teams
            .iter()
            .enumerate()
            .filter(|(_, team)| !team.is_dead())
            .map(|(index, _)| TeamId(index))
            .collect()
    }

    /// Move options of a combatant, or the fallback move when it has none.
    pub fn move_options(&self, id: CombatantId) -> Vec<Arc<dyn MoveOption>> {
        let options = self
            .combatant(id)
            .map(Combatant::move_options)
            .unwrap_or_default();
        if options.is_empty() {
            vec![Arc::clone(&self.struggle)]
        } else {
            options
        }
    }

    /// The zero-damage fallback move.
    pub fn struggle(&self) -> Arc<dyn MoveOption> {
        Arc::clone(&self.struggle)
    }

    /// Effects currently installed on a combatant, in installation order.
    pub fn effects(&self, id: CombatantId) -> Option<&[AttachedEffect]> {
        self.turn
            .as_ref()?
            .target(id)
            .map(|target| target.effects.as_slice())
    }

    pub(crate) fn effects_mut(&mut self, id: CombatantId) -> Option<&mut Vec<AttachedEffect>> {
        self.turn
            .as_mut()?
            .target_mut(id)
            .map(|target| &mut target.effects)
    }

    pub fn chooser_kind(&self, id: CombatantId) -> Option<ChooserKind> {
        if let Some(turn) = &self.turn {
            return turn.target(id).and_then(Target::chooser_kind);
        }
        if !self.contains(id) {
            return None;
        }
        Some(self.choosers.get(&id).map_or(ChooserKind::Random, |c| c.kind()))
    }

    /// Drains events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.events)
    }

    // ===== setup =====

    /// Binds a chooser to a combatant. Combatants without one get a seeded
    /// random chooser when the battle starts.
    pub fn set_chooser(
        &mut self,
        id: CombatantId,
        chooser: Box<dyn MoveChooser>,
    ) -> Result<(), BattleError> {
        if !self.contains(id) {
            return Err(BattleError::UnknownCombatant(id));
        }
        match self.turn.as_mut().and_then(|turn| turn.target_mut(id)) {
            Some(target) => target.chooser = Some(chooser),
            None => {
                self.choosers.insert(id, chooser);
            }
        }
        Ok(())
    }

    /// Builds turn 0, then dispatches `BattleStart` so rules can prepare the
    /// battle (e.g. install property effects).
    pub fn start(&mut self, bus: &mut ActionBus) -> Result<(), BattleError> {
        if self.ended {
            return Err(BattleError::AlreadyEnded);
        }
        if self.started {
            return Err(BattleError::AlreadyStarted);
        }

        let mut targets = Vec::new();
        for (index, team) in self.teams.iter().enumerate() {
            for member in team.members() {
                let chooser = self.choosers.remove(&member.id()).unwrap_or_else(|| {
                    Box::new(RandomChooser::seeded(derive_seed(
                        self.config.seed,
                        member.id(),
                        0,
                    )))
                });
                targets.push(Target::new(member, TeamId(index), chooser));
            }
        }

        let mut turn = Turn::new(0, targets);
        turn.start();
        self.turn = Some(turn);
        self.started = true;

        info!(
            target: "battle_core::battle",
            battle = %self.id,
            teams = self.teams.len(),
            combatants = self.combatants().count(),
            "battle started"
        );

        let action = BattleLifecycleAction::new(self.id, self.combatant_ids()).start();
        let dispatched = bus.dispatch(action, Some(&mut *self))?;
        if let Some(reason) = dispatched.verdict.reason() {
            warn!(
                target: "battle_core::battle",
                battle = %self.id,
                %reason,
                "battle start vetoed; starting anyway"
            );
        }
        if let Some(turn) = self.turn.as_mut() {
            turn.leading.extend(dispatched.parts);
        }

        let names: Vec<_> = self.teams.iter().map(Team::name).collect();
        self.broadcast(format!("A battle begins: {}!", names.join(" vs ")));
        Ok(())
    }

    // ===== driving =====

    /// Advances the battle by one tick.
    ///
    /// Polls choosers (and resolves the turn once all moves are in). A tick
    /// that finds the current turn done either ends the battle, when at most
    /// one team is standing, or builds the next turn and polls it.
    pub fn update(&mut self, bus: &mut ActionBus) -> Result<(), BattleError> {
        if self.ended {
            return Err(BattleError::AlreadyEnded);
        }
        let Some(turn) = self.turn.as_ref() else {
            return Err(BattleError::NotStarted);
        };

        if turn.phase == TurnPhase::Done {
            self.announce_eliminations();
            match self.alive_teams().as_slice() {
                [] => return self.finish(bus, BattleResult::Draw),
                [winner] => return self.finish(bus, BattleResult::Victory(*winner)),
                _ => self.advance_turn()?,
            }
        }

        self.tick_turn(bus);
        Ok(())
    }

    /// Ends the battle without a winner. No-op on an ended battle.
    pub fn force_end(&mut self, bus: &mut ActionBus) -> Result<(), BattleError> {
        if self.ended {
            return Ok(());
        }
        self.finish(bus, BattleResult::Aborted)
    }

    /// Installs an effect through the bus.
    pub fn install_effect(
        &mut self,
        bus: &mut ActionBus,
        combatant: CombatantId,
        effect: Box<dyn Effect>,
    ) -> Result<Dispatched, BattleError> {
        if self.ended {
            return Err(BattleError::AlreadyEnded);
        }
        if !self.started {
            return Err(BattleError::NotStarted);
        }
        if !self.contains(combatant) {
            return Err(BattleError::UnknownCombatant(combatant));
        }
        Ok(bus.dispatch(Action::effect_added(combatant, effect), Some(self))?)
    }

    /// Routes a host selection to the combatant's set chooser.
    ///
    /// Choosing again before the turn resolves replaces the earlier choice.
    pub fn choose_move(
        &mut self,
        combatant: CombatantId,
        option_name: &str,
        targets: Vec<CombatantId>,
    ) -> Result<(), SelectionError> {
        let user = self
            .combatant(combatant)
            .ok_or(SelectionError::UnknownCombatant(combatant))?;
        if user.is_fainted() {
            return Err(SelectionError::Fainted(combatant));
        }
        let Some(turn) = self.turn.as_ref().filter(|t| t.phase == TurnPhase::Polling) else {
            return Err(SelectionError::TurnNotPolling);
        };
        let index = turn
            .target_index(combatant)
            .ok_or(SelectionError::UnknownCombatant(combatant))?;
        let option = self
            .move_options(combatant)
            .into_iter()
            .find(|o| o.name() == option_name)
            .ok_or_else(|| SelectionError::UnknownOption {
                combatant,
                option: option_name.to_owned(),
            })?;

        let mut chooser = self
            .target_at_mut(index)
            .and_then(|target| target.chooser.take())
            .ok_or(SelectionError::NotSetChooser(combatant))?;
        let result = match chooser.as_set_mut() {
            Some(set) => set.set(self, combatant, option, targets),
            None => Err(SelectionError::NotSetChooser(combatant)),
        };

        if let Some(target) = self.target_at_mut(index) {
            target.chooser = Some(chooser);
            if result.is_ok() {
                target.chosen = None;
            }
        }
        if let Err(reason) = &result {
            debug!(
                target: "battle_core::battle",
                battle = %self.id,
                %combatant,
                %reason,
                "selection rejected"
            );
        }
        result
    }

    // ===== internals =====

    pub(crate) fn attach_effect(
        &mut self,
        target: CombatantId,
        effect: Box<dyn Effect>,
    ) -> Result<EffectId, CommitError> {
        let id = EffectId(self.next_effect_id);
        let turn = self.turn.as_mut().ok_or(CommitError::NoTurn)?;
        let target = turn
            .target_mut(target)
            .ok_or(CommitError::UnknownCombatant(target))?;
        target.effects.push(AttachedEffect { id, effect });
        self.next_effect_id += 1;
        Ok(id)
    }

    pub(crate) fn detach_effect(
        &mut self,
        target: CombatantId,
        effect: EffectId,
    ) -> Result<Option<Box<dyn Effect>>, CommitError> {
        let turn = self.turn.as_mut().ok_or(CommitError::NoTurn)?;
        let target = turn
            .target_mut(target)
            .ok_or(CommitError::UnknownCombatant(target))?;
        Ok(target
            .effects
            .iter()
            .position(|a| a.id == effect)
            .map(|position| target.effects.remove(position).effect))
    }

    pub(crate) fn record_hit(&mut self, target: CombatantId, attacker: CombatantId, hit: bool) {
        if let Some(target) = self.turn.as_mut().and_then(|t| t.target_mut(target)) {
            target.hits.insert(attacker, hit);
        }
    }

    fn broadcast(&mut self, text: String) {
        info!(target: "battle_core::battle", battle = %self.id, "{text}");
        self.events.push(BattleEvent::Broadcast(text));
    }

    fn announce_eliminations(&mut self) {
        let fallen: Vec<usize> = self
            .teams
            .iter()
            .enumerate()
            .filter(|(index, team)| !self.eliminated[*index] && team.is_dead())
            .map(|(index, _)| index)
            .collect();

        for index in fallen {
            self.eliminated[index] = true;
            let text = format!("{} has been defeated!", self.teams[index].name());
            self.broadcast(text);
        }
    }

    fn advance_turn(&mut self) -> Result<(), BattleError> {
        let previous = self.turn.take().ok_or(BattleError::NotStarted)?;
        let number = previous.number + 1;
        let expected = self.combatants().count();

        let targets: Vec<Target> = previous
            .targets
            .into_iter()
            .map(|target| {
                let standing = self
                    .combatant(target.combatant)
                    .is_some_and(|c| !c.is_fainted());
                target.carry_over(standing)
            })
            .collect();
        if targets.len() != expected {
            return Err(BattleError::TargetCountMismatch {
                turn: number,
                expected,
                actual: targets.len(),
            });
        }

        let mut turn = Turn::new(number, targets);
        turn.start();
        self.turn = Some(turn);
        debug!(target: "battle_core::battle", battle = %self.id, turn = number, "turn started");
        Ok(())
    }

    /// Marks the battle ended and dispatches `BattleEnd` exactly once.
    fn finish(&mut self, bus: &mut ActionBus, result: BattleResult) -> Result<(), BattleError> {
        if self.ended {
            return Ok(());
        }
        self.ended = true;
        self.result = Some(result.clone());

        let action = Action::new(BattleEndAction::new(
            self.id,
            result.clone(),
            self.combatant_ids(),
        ));
        let dispatched = bus.dispatch(action, Some(&mut *self))?;
        if !dispatched.committed() {
            warn!(
                target: "battle_core::battle",
                battle = %self.id,
                "battle end vetoed; ending anyway"
            );
        }

        let text = match &result {
            BattleResult::Victory(team) => format!(
                "{} wins the battle!",
                self.team(*team).map_or("Nobody", Team::name)
            ),
            BattleResult::Draw => "The battle ends in a draw.".to_owned(),
            BattleResult::Aborted => "The battle was called off.".to_owned(),
        };
        info!(target: "battle_core::battle", battle = %self.id, %result, "battle ended");
        self.broadcast(text);
        Ok(())
    }
}
