//! Battle manager: owns the action bus and every live battle.
//!
//! The manager is the single place the engine is driven from. Hosts register
//! rules, create battles and call [`BattleManager::tick`]; everything the
//! battles produce is forwarded to the registered [`BattleObserver`]. Battles
//! are dropped from the manager in the tick that ends them.

use std::collections::BTreeMap;

use battle_core::{
    Action, ActionBus, ActionManager, Battle, BattleError, BattleEvent, BattleId,
    BattleLifecycleAction, BattleResult, BattleSnapshot, Catalog, ChooserKind, CombatantId,
    Dispatched, Effect, GameError, MoveChooser, RuleError, Target, Team, TurnPhase,
};
use tracing::{debug, error, info, warn};

use crate::config::RuntimeConfig;
use crate::errors::{Result, RuntimeError};
use crate::observer::{BattleObserver, NullObserver};
use crate::rules::{LocationLock, PropertyEffects, PropertySource};

/// A battle that ended and was removed from the manager.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Finished {
    pub battle: BattleId,
    pub result: BattleResult,
}

pub struct BattleManager {
    config: RuntimeConfig,
    bus: ActionBus,
    battles: BTreeMap<BattleId, Battle>,
    next_id: u64,
    observer: Box<dyn BattleObserver>,
}

impl BattleManager {
    /// Creates a manager whose bus carries the core damage rule followed by
    /// the location lock.
    pub fn new(config: RuntimeConfig) -> Self {
        let mut bus = ActionBus::with_core_rules(&config.battle);
        bus.register(LocationLock::new(config.battle.strict_location_lock));
        Self {
            config,
            bus,
            battles: BTreeMap::new(),
            next_id: 1,
            observer: Box::new(NullObserver),
        }
    }

    /// Sets the observer (builder pattern).
    #[must_use]
    pub fn with_observer(mut self, observer: impl BattleObserver + 'static) -> Self {
        self.set_observer(observer);
        self
    }

    pub fn set_observer(&mut self, observer: impl BattleObserver + 'static) {
        self.observer = Box::new(observer);
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    // ===== rules =====

    /// Appends a rule to the bus. Registration order is delivery order.
    pub fn register_manager(&mut self, manager: impl ActionManager + 'static) {
        self.bus.register(manager);
    }

    /// Registers a closure as a rule.
    pub fn register_fn<F>(&mut self, name: &'static str, f: F)
    where
        F: FnMut(&mut Action, Option<&mut Battle>) -> std::result::Result<(), RuleError> + 'static,
    {
        self.bus.register_fn(name, f);
    }

    /// Installs property effects from `source` whenever a battle starts.
    pub fn install_properties(&mut self, source: impl PropertySource + 'static) {
        self.bus.register(PropertyEffects::new(source));
    }

    /// Returns rule names in delivery order.
    pub fn rules(&self) -> Vec<&'static str> {
        self.bus.managers().collect()
    }

    // ===== battles =====

    pub fn battle(&self, id: BattleId) -> Option<&Battle> {
        self.battles.get(&id)
    }

    pub fn battle_ids(&self) -> Vec<BattleId> {
        self.battles.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.battles.len()
    }

    /// True when no battle is registered.
    pub fn is_idle(&self) -> bool {
        self.battles.is_empty()
    }

    /// Registers a new battle without starting it.
    ///
    /// Combatants without a chooser get a seeded random one when the battle
    /// starts; use [`Self::set_chooser`] before that.
    pub fn create_battle(&mut self, teams: Vec<Team>) -> Result<BattleId> {
        let id = self.allocate_id();
        let battle = Battle::new(id, teams, self.config.battle.clone())?;
        self.register(battle)
    }

    /// Creates and immediately starts a battle.
    pub fn battle_start(&mut self, teams: Vec<Team>) -> Result<BattleId> {
        let id = self.create_battle(teams)?;
        self.start_battle(id)?;
        Ok(id)
    }

    pub fn start_battle(&mut self, id: BattleId) -> Result<()> {
        let battle = self.battles.get_mut(&id).ok_or(RuntimeError::UnknownBattle(id))?;
        battle.start(&mut self.bus)?;
        self.flush(id);
        Ok(())
    }

    pub fn set_chooser(
        &mut self,
        id: BattleId,
        combatant: CombatantId,
        chooser: Box<dyn MoveChooser>,
    ) -> Result<()> {
        self.battle_mut(id)?.set_chooser(combatant, chooser)?;
        Ok(())
    }

    /// Routes a host selection to a combatant driven by a set chooser.
    pub fn choose_move(
        &mut self,
        id: BattleId,
        combatant: CombatantId,
        option: &str,
        targets: Vec<CombatantId>,
    ) -> Result<()> {
        self.battle_mut(id)?.choose_move(combatant, option, targets)?;
        Ok(())
    }

    /// Installs an effect on a combatant of a running battle.
    pub fn install_effect(
        &mut self,
        id: BattleId,
        combatant: CombatantId,
        effect: Box<dyn Effect>,
    ) -> Result<Dispatched> {
        let battle = self.battles.get_mut(&id).ok_or(RuntimeError::UnknownBattle(id))?;
        let dispatched = battle.install_effect(&mut self.bus, combatant, effect)?;
        self.forward_notices();
        Ok(dispatched)
    }

    /// Dispatches an action that belongs to no battle, such as a location
    /// change. The host applies it only if the result is committed.
    pub fn dispatch(&mut self, action: Action) -> Result<Dispatched> {
        let dispatched = self.bus.dispatch(action, None)?;
        self.forward_notices();
        Ok(dispatched)
    }

    /// Ends a battle without a winner and removes it.
    pub fn force_end(&mut self, id: BattleId) -> Result<Finished> {
        let battle = self.battles.get_mut(&id).ok_or(RuntimeError::UnknownBattle(id))?;
        battle.force_end(&mut self.bus)?;
        self.flush(id);
        self.reap(id).ok_or(RuntimeError::UnknownBattle(id))
    }

    // ===== driving =====

    /// Advances every started battle by one tick.
    ///
    /// Host-driven combatants still missing a move are asked for one first.
    /// A battle whose update fails with an internal or fatal error is
    /// aborted; recoverable failures are logged and the battle is kept. Returns the
    /// battles that ended during this tick.
    pub fn tick(&mut self) -> Vec<Finished> {
        let mut finished = Vec::new();

        for id in self.battle_ids() {
            self.request_moves(id);

            let Some(battle) = self.battles.get_mut(&id) else {
                continue;
            };
            if battle.is_started() && !battle.is_ended() {
                if let Err(err) = battle.update(&mut self.bus) {
                    if aborts_battle(&err) {
                        error!(
                            target: "battle_runtime::manager",
                            battle = %id,
                            error = %err,
                            code = err.error_code(),
                            "battle update failed; aborting"
                        );
                        if let Err(err) = battle.force_end(&mut self.bus) {
                            error!(
                                target: "battle_runtime::manager",
                                battle = %id,
                                error = %err,
                                "failed to abort battle"
                            );
                        }
                    } else {
                        warn!(
                            target: "battle_runtime::manager",
                            battle = %id,
                            error = %err,
                            severity = err.severity().as_str(),
                            "battle update failed; battle kept"
                        );
                    }
                }
            }

            self.flush(id);
            finished.extend(self.reap(id));
        }

        finished
    }

    // ===== persistence =====

    pub fn snapshot(&self, id: BattleId) -> Result<BattleSnapshot> {
        self.battles
            .get(&id)
            .map(Battle::snapshot)
            .ok_or(RuntimeError::UnknownBattle(id))
    }

    /// Encodes a battle snapshot as pretty-printed JSON.
    pub fn export_json(&self, id: BattleId) -> Result<String> {
        let snapshot = self.snapshot(id)?;
        serde_json::to_string_pretty(&snapshot).map_err(RuntimeError::Json)
    }

    /// Rebuilds a battle from a snapshot and registers it under its saved id.
    pub fn restore(&mut self, snapshot: &BattleSnapshot, catalog: &dyn Catalog) -> Result<BattleId> {
        let battle = Battle::restore(snapshot, catalog, self.config.battle.clone())?;
        self.next_id = self.next_id.max(snapshot.id.0.saturating_add(1));
        self.register(battle)
    }

    pub fn restore_json(&mut self, json: &str, catalog: &dyn Catalog) -> Result<BattleId> {
        let snapshot: BattleSnapshot = serde_json::from_str(json).map_err(RuntimeError::Json)?;
        self.restore(&snapshot, catalog)
    }

    // ===== internals =====

    fn allocate_id(&mut self) -> BattleId {
        while self.battles.contains_key(&BattleId(self.next_id)) {
            self.next_id += 1;
        }
        let id = BattleId(self.next_id);
        self.next_id += 1;
        id
    }

    fn battle_mut(&mut self, id: BattleId) -> Result<&mut Battle> {
        self.battles.get_mut(&id).ok_or(RuntimeError::UnknownBattle(id))
    }

    fn register(&mut self, mut battle: Battle) -> Result<BattleId> {
        let id = battle.id();
        if self.battles.contains_key(&id) {
            return Err(RuntimeError::DuplicateBattle(id));
        }

        let created = BattleLifecycleAction::new(id, battle.combatant_ids()).created();
        let dispatched = self.bus.dispatch(created, Some(&mut battle))?;
        if let Some(reason) = dispatched.verdict.reason() {
            warn!(
                target: "battle_runtime::manager",
                battle = %id,
                %reason,
                "battle creation vetoed; registering anyway"
            );
        }

        info!(
            target: "battle_runtime::manager",
            battle = %id,
            teams = battle.teams().len(),
            started = battle.is_started(),
            "battle registered"
        );
        self.battles.insert(id, battle);
        self.forward_notices();
        Ok(id)
    }

    /// Asks the observer for moves of host-driven combatants still undecided.
    fn request_moves(&mut self, id: BattleId) {
        let Some(battle) = self.battles.get_mut(&id) else {
            return;
        };
        let waiting: Vec<CombatantId> = match battle.turn() {
            Some(turn) if turn.phase() == TurnPhase::Polling => turn
                .targets()
                .iter()
                .filter(|target| {
                    target.is_active()
                        && target.chosen().is_none()
                        && target.chooser_kind() == Some(ChooserKind::Set)
                })
                .map(Target::combatant)
                .collect(),
            _ => return,
        };

        for combatant in waiting {
            let selection = match self.observer.on_request_move(battle, combatant) {
                Ok(Some(selection)) => selection,
                Ok(None) => continue,
                Err(err) => {
                    warn!(
                        target: "battle_runtime::manager",
                        battle = %id,
                        %combatant,
                        error = %err,
                        "move request failed"
                    );
                    continue;
                }
            };
            if let Err(reason) = battle.choose_move(combatant, &selection.option, selection.targets)
            {
                warn!(
                    target: "battle_runtime::manager",
                    battle = %id,
                    %combatant,
                    option = %selection.option,
                    %reason,
                    "host selection rejected"
                );
            }
        }
    }

    /// Forwards drained battle events and bus notices to the observer.
    fn flush(&mut self, id: BattleId) {
        if let Some(battle) = self.battles.get_mut(&id) {
            for event in battle.drain_events() {
                let delivered = match &event {
                    BattleEvent::Outcome(outcome) => self.observer.on_outcome(id, outcome),
                    BattleEvent::TurnEnded(report) => self.observer.on_turn_end(id, report),
                    BattleEvent::Broadcast(text) => self.observer.on_broadcast(id, text),
                };
                if let Err(err) = delivered {
                    warn!(
                        target: "battle_runtime::manager",
                        battle = %id,
                        error = %err,
                        "observer callback failed"
                    );
                }
            }
        }
        self.forward_notices();
    }

    fn forward_notices(&mut self) {
        for notice in self.bus.take_notices() {
            debug!(
                target: "battle_runtime::manager",
                recipient = %notice.recipient,
                text = %notice.text,
                "veto notice"
            );
            if let Err(err) = self.observer.on_notice(&notice) {
                warn!(
                    target: "battle_runtime::manager",
                    error = %err,
                    "observer callback failed"
                );
            }
        }
    }

    /// Removes `id` if it has ended.
    fn reap(&mut self, id: BattleId) -> Option<Finished> {
        if !self.battles.get(&id).is_some_and(Battle::is_ended) {
            return None;
        }
        let battle = self.battles.remove(&id)?;
        let result = battle.result().cloned().unwrap_or(BattleResult::Aborted);

        if let Err(err) = self.observer.on_battle_end(id, &result) {
            warn!(
                target: "battle_runtime::manager",
                battle = %id,
                error = %err,
                "observer callback failed"
            );
        }
        info!(
            target: "battle_runtime::manager",
            battle = %id,
            %result,
            turns = battle.turn().map_or(0, |turn| turn.number() + 1),
            "battle finished"
        );

        Some(Finished { battle: id, result })
    }
}

impl Default for BattleManager {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

/// Internal and fatal update errors leave the battle in an unknown state.
fn aborts_battle(error: &BattleError) -> bool {
    error.severity().is_internal()
}
