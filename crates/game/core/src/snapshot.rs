//! Battle persistence surface.
//!
//! A snapshot holds what survives between turns: teams, HP, inventories by
//! item name, the turn number, per-combatant effect specs and chooser kinds.
//! Moves in flight are not captured, so battles should be saved while no turn
//! is resolving. Item and custom-effect resolution is delegated to a
//! [`Catalog`] supplied by the content layer.

use std::collections::BTreeMap;

use crate::action::BattleResult;
use crate::chooser::{ChooserKind, MoveChooser, RandomChooser, SetChooser};
use crate::config::BattleConfig;
use crate::effect::{Effect, EffectId, EffectSpec};
use crate::engine::{AttachedEffect, Battle, BattleId, Target, Turn, TurnPhase};
use crate::error::BattleError;
use crate::rng::derive_seed;
use crate::state::{Combatant, CombatantId, Item, Team, TeamId};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleSnapshot {
    pub id: BattleId,
    pub started: bool,
    pub ended: bool,
    pub result: Option<BattleResult>,
    /// `None` until the battle has started.
    pub turn: Option<TurnSnapshot>,
    pub teams: Vec<TeamSnapshot>,
    /// Per team, whether its defeat has been announced. A team that fell in
    /// a resolved but unchecked turn is dead here without being eliminated.
    #[cfg_attr(feature = "serde", serde(default))]
    pub eliminated: Vec<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnSnapshot {
    pub number: u32,
    /// Whether the turn had already resolved.
    pub done: bool,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TeamSnapshot {
    pub name: String,
    pub members: Vec<CombatantSnapshot>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantSnapshot {
    pub id: CombatantId,
    pub name: String,
    pub hp: u32,
    pub max_hp: u32,
    pub tags: Vec<String>,
    pub items: Vec<String>,
    pub chooser: ChooserKind,
    pub effects: Vec<EffectSpec>,
}

/// Resolves names stored in snapshots back into live objects.
pub trait Catalog {
    /// Looks an item up by name.
    fn item(&self, name: &str) -> Option<Item>;

    /// Builds a host-defined effect. Built-in specs never reach this.
    fn custom_effect(&self, _spec: &EffectSpec) -> Option<Box<dyn Effect>> {
        None
    }

    /// Builds the chooser for a restored combatant.
    ///
    /// Queue choosers are bound to live input channels and cannot be rebuilt
    /// from a snapshot by default.
    fn chooser(
        &self,
        kind: ChooserKind,
        _combatant: CombatantId,
        seed: u64,
    ) -> Option<Box<dyn MoveChooser>> {
        match kind {
            ChooserKind::Set => Some(Box::new(SetChooser::new())),
            ChooserKind::Random => Some(Box::new(RandomChooser::seeded(seed))),
            ChooserKind::Queue => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SnapshotError {
    #[error("unknown item '{0}'")]
    UnknownItem(String),

    #[error("cannot rebuild effect '{0}'")]
    UnknownEffect(String),

    #[error("cannot rebuild a {kind} chooser for {combatant}")]
    UnsupportedChooser {
        combatant: CombatantId,
        kind: ChooserKind,
    },

    #[error(transparent)]
    Battle(#[from] BattleError),
}

impl Battle {
    /// Captures the persistent state of the battle.
    pub fn snapshot(&self) -> BattleSnapshot {
        let teams = self
            .teams
            .iter()
            .map(|team| TeamSnapshot {
                name: team.name().to_owned(),
                members: team
                    .members()
                    .iter()
                    .map(|member| self.snapshot_combatant(member))
                    .collect(),
            })
            .collect();

        BattleSnapshot {
            id: self.id,
            started: self.started,
            ended: self.ended,
            result: self.result.clone(),
            turn: self.turn.as_ref().map(|turn| TurnSnapshot {
                number: turn.number(),
                done: turn.is_done(),
            }),
            teams,
            eliminated: self.eliminated.clone(),
        }
    }

    fn snapshot_combatant(&self, member: &Combatant) -> CombatantSnapshot {
        CombatantSnapshot {
            id: member.id(),
            name: member.name().to_owned(),
            hp: member.hp(),
            max_hp: member.max_hp(),
            tags: member.tags().to_vec(),
            items: member.items().iter().map(|i| i.name().to_owned()).collect(),
            chooser: self
                .chooser_kind(member.id())
                .unwrap_or(ChooserKind::Random),
            effects: self
                .effects(member.id())
                .unwrap_or_default()
                .iter()
                .map(|a| a.effect.spec())
                .collect(),
        }
    }

    /// Rebuilds a battle from a snapshot.
    ///
    /// A resolved turn is restored as resolved, so the next `update` runs the
    /// end-of-turn checks exactly as it would have before saving.
    pub fn restore(
        snapshot: &BattleSnapshot,
        catalog: &dyn Catalog,
        config: BattleConfig,
    ) -> Result<Battle, SnapshotError> {
        let mut teams = Vec::with_capacity(snapshot.teams.len());
        for team in &snapshot.teams {
            let mut members = Vec::with_capacity(team.members.len());
            for member in &team.members {
                let mut combatant =
                    Combatant::new(member.id, member.name.clone(), member.max_hp).with_hp(member.hp);
                for tag in &member.tags {
                    combatant = combatant.with_tag(tag.clone());
                }
                for name in &member.items {
                    let item = catalog
                        .item(name)
                        .ok_or_else(|| SnapshotError::UnknownItem(name.clone()))?;
                    combatant = combatant.with_item(item);
                }
                members.push(combatant);
            }
            teams.push(Team::new(team.name.clone(), members));
        }

        let seed = config.seed;
        let mut battle = Battle::new(snapshot.id, teams, config)?;
        let turn_number = snapshot.turn.map_or(0, |t| t.number);

        let mut targets = Vec::new();
        for (index, team) in snapshot.teams.iter().enumerate() {
            for member in &team.members {
                let chooser = catalog
                    .chooser(
                        member.chooser,
                        member.id,
                        derive_seed(seed, member.id, turn_number),
                    )
                    .ok_or(SnapshotError::UnsupportedChooser {
                        combatant: member.id,
                        kind: member.chooser,
                    })?;

                let Some(combatant) = battle.combatant(member.id) else {
                    return Err(BattleError::UnknownCombatant(member.id).into());
                };
                let mut target = Target::new(combatant, TeamId(index), chooser);
                for spec in &member.effects {
                    let effect = spec
                        .build()
                        .or_else(|| catalog.custom_effect(spec))
                        .ok_or_else(|| SnapshotError::UnknownEffect(spec.name().to_owned()))?;
                    target.effects.push(AttachedEffect {
                        id: EffectId(battle.next_effect_id),
                        effect,
                    });
                    battle.next_effect_id += 1;
                }
                targets.push(target);
            }
        }

        battle.started = snapshot.started;
        battle.ended = snapshot.ended;
        battle.result = snapshot.result.clone();
        battle.eliminated = if snapshot.eliminated.len() == battle.teams.len() {
            snapshot.eliminated.clone()
        } else {
            battle.teams.iter().map(Team::is_dead).collect()
        };

        if let Some(saved) = snapshot.turn {
            let mut turn = Turn::new(saved.number, targets);
            turn.start();
            if saved.done {
                turn.phase = TurnPhase::Done;
            }
            battle.turn = Some(turn);
        } else {
            let choosers: BTreeMap<_, _> = targets
                .into_iter()
                .filter_map(|mut t| t.chooser.take().map(|c| (t.combatant, c)))
                .collect();
            battle.choosers = choosers;
        }

        Ok(battle)
    }
}
