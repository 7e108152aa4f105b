//! Battle rules: selection checks, damage, effects and persistence.

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use battle_core::{
    ActionBus, ActionKind, Battle, BattleConfig, BattleEvent, BattleId, Catalog, ChooserKind,
    CombatantId, Effect, EffectContext, EffectError, EffectSpec, Item, Move, MoveOption,
    OutcomePart, Poisoned, RuleError, Sealed, SelectionError, SnapshotError, Stunned, Team,
    TargetingOption, WeaponMove,
};
use common::*;

type Pick<'a> = (CombatantId, &'a str, Vec<CombatantId>);

fn play_turn(battle: &mut Battle, bus: &mut ActionBus, picks: &[Pick<'_>]) {
    for (user, option, targets) in picks {
        battle.choose_move(*user, option, targets.clone()).unwrap();
    }
    battle.update(bus).unwrap();
}

// ============================================================================
// Damage
// ============================================================================

#[test]
fn healing_is_clamped_to_max_hp() {
    let mend = WeaponMove::new("Mend", 10).with_targeting(TargetingOption::self_only());
    let (mut battle, mut bus) = battle(
        vec![fighter(UA, "Ua", 20, vec![mend]).with_hp(15)],
        vec![fighter(UB, "Ub", 10, vec![])],
    );
    host_driven(&mut battle);
    battle.start(&mut bus).unwrap();

    play_turn(
        &mut battle,
        &mut bus,
        &[(UA, "Mend", vec![UA]), (UB, "Struggle", vec![UA])],
    );

    assert_eq!(hp(&battle, UA), 20);
    let outcome = &battle.turn().unwrap().outcomes()[0];
    assert_eq!(
        outcome.health_changes_of(UA).next(),
        Some(&OutcomePart::HealthChange {
            target: who(&battle, UA),
            before: 15,
            after: 20,
            max: 20,
        })
    );
}

#[test]
fn hitting_a_fainted_target_still_reports_health() {
    let (mut battle, mut bus) = battle(
        vec![
            fighter(UA, "Ua", 10, vec![strike(-5)]),
            fighter(UC, "Uc", 10, vec![strike(-5)]),
        ],
        vec![fighter(UB, "Ub", 3, vec![])],
    );
    host_driven(&mut battle);
    battle.start(&mut bus).unwrap();

    play_turn(
        &mut battle,
        &mut bus,
        &[
            (UA, "Strike", vec![UB]),
            (UC, "Strike", vec![UB]),
            (UB, "Struggle", vec![UA]),
        ],
    );

    let outcomes = battle.turn().unwrap().outcomes();
    assert_eq!(outcomes[1].user.id, UC);
    assert!(outcomes[1].executed);
    assert_eq!(
        outcomes[1].health_changes_of(UB).next(),
        Some(&OutcomePart::HealthChange {
            target: who(&battle, UB),
            before: 0,
            after: 0,
            max: 3,
        })
    );
    // Knocked out this turn, but the move still resolves.
    assert_eq!(outcomes[2].user.id, UB);
    assert!(outcomes[2].executed);
}

#[test]
fn vetoed_damage_leaves_hp_untouched() {
    let (mut battle, mut bus) = battle(
        vec![fighter(UA, "Ua", 10, vec![strike(-5)])],
        vec![fighter(UB, "Ub", 10, vec![])],
    );
    bus.register_fn("parry", |action, _| {
        if let ActionKind::Damage(damage) = action.kind()
            && damage.cause.target == UB
        {
            action.veto("Ub parried the blow");
        }
        Ok(())
    });
    host_driven(&mut battle);
    battle.start(&mut bus).unwrap();

    play_turn(
        &mut battle,
        &mut bus,
        &[(UA, "Strike", vec![UB]), (UB, "Struggle", vec![UA])],
    );

    assert_eq!(hp(&battle, UB), 10);
    let turn = battle.turn().unwrap();
    let outcome = &turn.outcomes()[0];
    assert!(outcome.executed);
    assert!(!outcome.goal_reached);
    assert!(outcome.parts.contains(&OutcomePart::Vetoed {
        reason: "Ub parried the blow".into(),
    }));
    assert_eq!(turn.target(UB).unwrap().was_hit_by(UA), Some(false));
    assert_eq!(turn.target(UA).unwrap().was_hit_by(UB), Some(true));
    assert_eq!(turn.target(UA).unwrap().was_hit_by(UC), None);
}

// ============================================================================
// Turns
// ============================================================================

#[test]
fn fainted_combatants_sit_out_later_turns() {
    let (mut battle, mut bus) = battle(
        vec![
            fighter(UA, "Ua", 10, vec![strike(-10)]),
            fighter(UC, "Uc", 10, vec![]),
        ],
        vec![fighter(UB, "Ub", 30, vec![strike(-10)])],
    );
    host_driven(&mut battle);
    battle.start(&mut bus).unwrap();
    assert_eq!(battle.turn().unwrap().targets().len(), 3);

    play_turn(
        &mut battle,
        &mut bus,
        &[
            (UA, "Strike", vec![UB]),
            (UC, "Struggle", vec![UB]),
            (UB, "Strike", vec![UC]),
        ],
    );
    assert_eq!(hp(&battle, UC), 0);

    battle.update(&mut bus).unwrap();
    let turn = battle.turn().unwrap();
    assert_eq!(turn.number(), 1);
    assert_eq!(turn.targets().len(), 3);
    assert!(!turn.target(UC).unwrap().is_active());
    assert_eq!(
        battle.choose_move(UC, "Struggle", vec![UB]),
        Err(SelectionError::Fainted(UC))
    );

    play_turn(
        &mut battle,
        &mut bus,
        &[(UA, "Strike", vec![UB]), (UB, "Strike", vec![UA])],
    );
    let turn = battle.turn().unwrap();
    assert!(turn.is_done());
    assert_eq!(turn.outcomes().len(), 2);
}

#[test]
fn choosing_again_replaces_the_earlier_choice() {
    let (mut battle, mut bus) = battle(
        vec![fighter(
            UA,
            "Ua",
            10,
            vec![strike(-1), WeaponMove::new("Feint", 0)],
        )],
        vec![fighter(UB, "Ub", 10, vec![])],
    );
    host_driven(&mut battle);
    battle.start(&mut bus).unwrap();

    battle.choose_move(UA, "Strike", vec![UB]).unwrap();
    battle.choose_move(UA, "Strike", vec![UB]).unwrap();
    battle.choose_move(UA, "Feint", vec![UB]).unwrap();
    battle.choose_move(UB, "Struggle", vec![UA]).unwrap();
    battle.update(&mut bus).unwrap();

    let outcomes = battle.turn().unwrap().outcomes();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].move_name, "Feint");
    assert_eq!(hp(&battle, UB), 10);
}

#[test]
fn turn_waits_until_every_choice_is_in() {
    let (mut battle, mut bus) = battle(
        vec![fighter(UA, "Ua", 10, vec![strike(-1)])],
        vec![fighter(UB, "Ub", 10, vec![])],
    );
    host_driven(&mut battle);
    battle.start(&mut bus).unwrap();

    battle.choose_move(UA, "Strike", vec![UB]).unwrap();
    battle.update(&mut bus).unwrap();
    battle.update(&mut bus).unwrap();
    let turn = battle.turn().unwrap();
    assert!(!turn.is_done());
    assert!(turn.target(UA).unwrap().chosen().is_some());

    battle.choose_move(UB, "Struggle", vec![UA]).unwrap();
    battle.update(&mut bus).unwrap();
    assert!(battle.turn().unwrap().is_done());
    assert_eq!(hp(&battle, UB), 9);
}

#[test]
fn seeded_random_battles_replay_identically() {
    let run = || {
        let (mut battle, mut bus) = battle(
            vec![fighter(
                UA,
                "Ua",
                12,
                vec![strike(-3), WeaponMove::new("Jab", -2)],
            )],
            vec![fighter(UB, "Ub", 12, vec![strike(-4)])],
        );
        battle.start(&mut bus).unwrap();
        for _ in 0..64 {
            if battle.is_ended() {
                break;
            }
            battle.update(&mut bus).unwrap();
        }
        assert!(battle.is_ended());
        battle.drain_events()
    };

    assert_eq!(run(), run());
}

// ============================================================================
// Selection
// ============================================================================

#[test]
fn selection_errors() {
    let (mut battle, mut bus) = battle(
        vec![fighter(
            UA,
            "Ua",
            10,
            vec![strike(-1), WeaponMove::new("Slash", -3)],
        )],
        vec![
            fighter(UB, "Ub", 10, vec![]),
            fighter(UC, "Uc", 10, vec![]).with_hp(0),
        ],
    );
    host_driven(&mut battle);

    assert_eq!(
        battle.choose_move(UA, "Strike", vec![UB]),
        Err(SelectionError::TurnNotPolling)
    );
    battle.start(&mut bus).unwrap();

    assert_eq!(
        battle.choose_move(UA, "Fireball", vec![UB]),
        Err(SelectionError::UnknownOption {
            combatant: UA,
            option: "Fireball".into(),
        })
    );
    assert!(matches!(
        battle.choose_move(UA, "Strike", vec![UA]),
        Err(SelectionError::Disallowed { target, .. }) if target == UA
    ));
    assert_eq!(
        battle.choose_move(UA, "Strike", vec![UB, UC]),
        Err(SelectionError::TooManyTargets { max: 1, got: 2 })
    );
    assert_eq!(
        battle.choose_move(UA, "Strike", vec![]),
        Err(SelectionError::NoTargets)
    );
    assert_eq!(
        battle.choose_move(UC, "Struggle", vec![UA]),
        Err(SelectionError::Fainted(UC))
    );
    assert_eq!(
        battle.choose_move(CombatantId(99), "Strike", vec![UB]),
        Err(SelectionError::UnknownCombatant(CombatantId(99)))
    );

    battle
        .install_effect(&mut bus, UA, Box::new(Sealed::new("Slash", 1)))
        .unwrap();
    assert_eq!(
        battle.choose_move(UA, "Slash", vec![UB]),
        Err(SelectionError::Vetoed("Slash is sealed".into()))
    );
    assert_eq!(battle.choose_move(UA, "Strike", vec![UB]), Ok(()));
}

#[test]
fn random_choosers_reject_host_selections() {
    let (mut battle, mut bus) = battle(
        vec![fighter(UA, "Ua", 10, vec![strike(-1)])],
        vec![fighter(UB, "Ub", 10, vec![])],
    );
    battle.start(&mut bus).unwrap();

    assert_eq!(battle.chooser_kind(UA), Some(ChooserKind::Random));
    assert_eq!(
        battle.choose_move(UA, "Strike", vec![UB]),
        Err(SelectionError::NotSetChooser(UA))
    );
}

// ============================================================================
// Effects
// ============================================================================

#[test]
fn stunned_combatant_fails_to_move() {
    let (mut battle, mut bus) = battle(
        vec![fighter(UA, "Ua", 10, vec![strike(-4)])],
        vec![fighter(UB, "Ub", 10, vec![])],
    );
    host_driven(&mut battle);
    battle.start(&mut bus).unwrap();
    battle
        .install_effect(&mut bus, UA, Box::new(Stunned::new(1)))
        .unwrap();

    play_turn(
        &mut battle,
        &mut bus,
        &[(UA, "Strike", vec![UB]), (UB, "Struggle", vec![UA])],
    );

    assert_eq!(hp(&battle, UB), 10);
    let turn = battle.turn().unwrap();
    let stunned = &turn.outcomes()[0];
    assert!(!stunned.executed);
    assert_eq!(
        stunned.parts,
        vec![OutcomePart::MoveFailed {
            user: who(&battle, UA),
            reason: "Ua is stunned".into(),
        }]
    );
    assert!(!turn.target(UA).unwrap().has_effect(Stunned::NAME));
}

/// Property whose `after_turn` either fails or reports that it ran.
#[derive(Debug)]
struct Echo {
    name: &'static str,
    fails: bool,
}

impl Effect for Echo {
    fn name(&self) -> &str {
        self.name
    }

    fn after_turn(
        &mut self,
        _ctx: &mut EffectContext<'_>,
        _mv: &Move,
    ) -> Result<Vec<OutcomePart>, EffectError> {
        if self.fails {
            return Err(EffectError::new(self.name, "kaboom"));
        }
        Ok(vec![OutcomePart::message(format!("{} ran", self.name))])
    }

    fn spec(&self) -> EffectSpec {
        EffectSpec::Custom {
            tag: "echo".into(),
            name: self.name.into(),
            turns_remaining: None,
            params: BTreeMap::new(),
        }
    }
}

#[test]
fn failing_effect_hook_does_not_stop_the_next_one() {
    let (mut battle, mut bus) = battle(
        vec![fighter(UA, "Ua", 10, vec![strike(-1)])],
        vec![fighter(UB, "Ub", 10, vec![])],
    );
    host_driven(&mut battle);
    battle.start(&mut bus).unwrap();
    for (name, fails) in [("a", true), ("b", false)] {
        battle
            .install_effect(&mut bus, UA, Box::new(Echo { name, fails }))
            .unwrap();
    }

    play_turn(
        &mut battle,
        &mut bus,
        &[(UA, "Strike", vec![UB]), (UB, "Struggle", vec![UA])],
    );

    let turn = battle.turn().unwrap();
    assert_eq!(
        turn.trailing(),
        [
            OutcomePart::EngineError {
                message: "effect 'a' failed: kaboom".into(),
            },
            OutcomePart::message("b ran"),
        ]
    );
    assert_eq!(hp(&battle, UB), 9);
    assert!(turn.target(UA).unwrap().has_effect("a"));
}

#[test]
fn move_error_keeps_the_parts_already_committed() {
    let sweep = WeaponMove::new("Sweep", -4).with_targeting(TargetingOption::enemies(2));
    let (mut battle, mut bus) = battle(
        vec![fighter(UA, "Ua", 20, vec![sweep])],
        vec![fighter(UB, "Ub", 20, vec![]), fighter(UC, "Uc", 20, vec![])],
    );
    let mut damage_seen = 0;
    bus.register_fn("brittle", move |action, _| {
        if matches!(action.kind(), ActionKind::Damage(_)) {
            damage_seen += 1;
            if damage_seen == 2 {
                return Err(RuleError::new("rope snapped"));
            }
        }
        Ok(())
    });
    host_driven(&mut battle);
    battle.start(&mut bus).unwrap();

    play_turn(
        &mut battle,
        &mut bus,
        &[
            (UA, "Sweep", vec![UB, UC]),
            (UB, "Struggle", vec![UA]),
            (UC, "Struggle", vec![UA]),
        ],
    );

    assert_eq!(hp(&battle, UB), 16);
    assert_eq!(hp(&battle, UC), 20);

    let sweep = &battle.turn().unwrap().outcomes()[0];
    assert!(!sweep.executed);
    assert!(!sweep.goal_reached);
    assert!(matches!(sweep.parts[0], OutcomePart::UseMove { .. }));
    assert!(sweep.parts.contains(&OutcomePart::HealthChange {
        target: who(&battle, UB),
        before: 20,
        after: 16,
        max: 20,
    }));
    assert!(matches!(
        sweep.parts.last(),
        Some(OutcomePart::MoveFailed { reason, .. }) if reason.contains("rope snapped")
    ));
}

#[test]
fn thrown_poison_ticks_after_each_turn() {
    let throw = WeaponMove::new("Throw", -1).inflicting(EffectSpec::Poisoned {
        damage: 2,
        turns: 2,
    });
    let (mut battle, mut bus) = battle(
        vec![fighter(
            UA,
            "Ua",
            20,
            vec![throw, WeaponMove::new("Feint", 0)],
        )],
        vec![fighter(UB, "Ub", 20, vec![])],
    );
    host_driven(&mut battle);
    battle.start(&mut bus).unwrap();

    play_turn(
        &mut battle,
        &mut bus,
        &[(UA, "Throw", vec![UB]), (UB, "Struggle", vec![UA])],
    );

    let turn = battle.turn().unwrap();
    assert!(turn.outcomes()[0].parts.contains(&OutcomePart::EffectAdded {
        target: who(&battle, UB),
        effect: Poisoned::NAME.into(),
    }));
    assert!(turn.trailing().contains(&OutcomePart::HealthChange {
        target: who(&battle, UB),
        before: 19,
        after: 17,
        max: 20,
    }));
    assert!(turn.target(UB).unwrap().has_effect(Poisoned::NAME));

    battle.update(&mut bus).unwrap();
    play_turn(
        &mut battle,
        &mut bus,
        &[(UA, "Feint", vec![UB]), (UB, "Struggle", vec![UA])],
    );

    assert_eq!(hp(&battle, UB), 15);
    let turn = battle.turn().unwrap();
    assert!(turn.trailing().contains(&OutcomePart::EffectExpired {
        target: who(&battle, UB),
        effect: Poisoned::NAME.into(),
    }));
    assert!(!turn.target(UB).unwrap().has_effect(Poisoned::NAME));
}

// ============================================================================
// Persistence
// ============================================================================

struct Armory;

impl Catalog for Armory {
    fn item(&self, name: &str) -> Option<Item> {
        name.ends_with("'s blade").then(|| {
            let option: Arc<dyn MoveOption> = Arc::new(strike(-1));
            Item::weapon(name, vec![option])
        })
    }
}

fn saved_battle() -> (Battle, ActionBus) {
    let (mut battle, mut bus) = battle(
        vec![fighter(UA, "Ua", 10, vec![strike(-1)])],
        vec![fighter(UB, "Ub", 10, vec![])],
    );
    host_driven(&mut battle);
    battle.start(&mut bus).unwrap();
    play_turn(
        &mut battle,
        &mut bus,
        &[(UA, "Strike", vec![UB]), (UB, "Struggle", vec![UA])],
    );
    battle
        .install_effect(&mut bus, UA, Box::new(Sealed::new("Strike", 2)))
        .unwrap();
    (battle, bus)
}

#[test]
fn restored_battle_carries_on_where_it_stopped() {
    let (battle, mut bus) = saved_battle();
    let snapshot = battle.snapshot();
    assert_eq!(snapshot.turn.map(|t| (t.number, t.done)), Some((0, true)));
    assert_eq!(
        snapshot.teams[0].members[0].effects,
        vec![EffectSpec::Sealed {
            option: "Strike".into(),
            turns: 2,
        }]
    );

    let mut restored = Battle::restore(&snapshot, &Armory, BattleConfig::default()).unwrap();
    assert_eq!(restored.snapshot(), snapshot);
    assert_eq!(hp(&restored, UB), 9);

    restored.update(&mut bus).unwrap();
    assert_eq!(restored.turn().unwrap().number(), 1);
    assert_eq!(
        restored.choose_move(UA, "Strike", vec![UB]),
        Err(SelectionError::Vetoed("Strike is sealed".into()))
    );
}

#[test]
fn defeat_is_announced_after_restoring_a_knockout_turn() {
    let (mut battle, mut bus) = battle(
        vec![fighter(UA, "Ua", 10, vec![strike(-10)])],
        vec![fighter(UB, "Ub", 5, vec![])],
    );
    host_driven(&mut battle);
    battle.start(&mut bus).unwrap();
    play_turn(
        &mut battle,
        &mut bus,
        &[(UA, "Strike", vec![UB]), (UB, "Struggle", vec![UA])],
    );
    assert_eq!(hp(&battle, UB), 0);

    let snapshot = battle.snapshot();
    assert_eq!(snapshot.eliminated, vec![false, false]);

    let mut restored = Battle::restore(&snapshot, &Armory, BattleConfig::default()).unwrap();
    restored.update(&mut bus).unwrap();
    let broadcasts: Vec<_> = restored
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            BattleEvent::Broadcast(text) => Some(text),
            _ => None,
        })
        .collect();
    assert_eq!(
        broadcasts,
        vec![
            "Team B has been defeated!".to_owned(),
            "Team A wins the battle!".to_owned(),
        ]
    );
}

#[test]
fn restore_reports_what_it_cannot_rebuild() {
    let (battle, _) = saved_battle();

    let mut queued = battle.snapshot();
    queued.teams[0].members[0].chooser = ChooserKind::Queue;
    assert_eq!(
        Battle::restore(&queued, &Armory, BattleConfig::default()).unwrap_err(),
        SnapshotError::UnsupportedChooser {
            combatant: UA,
            kind: ChooserKind::Queue,
        }
    );

    let mut unknown = battle.snapshot();
    unknown.teams[0].members[0].items = vec!["Mystery box".into()];
    assert_eq!(
        Battle::restore(&unknown, &Armory, BattleConfig::default()).unwrap_err(),
        SnapshotError::UnknownItem("Mystery box".into())
    );
}

#[test]
fn battles_need_two_populated_teams() {
    let solo = Battle::new(
        BattleId(7),
        vec![Team::new("Alone", vec![fighter(UA, "Ua", 10, vec![])])],
        BattleConfig::default(),
    );
    assert_eq!(
        solo.unwrap_err(),
        battle_core::BattleError::NotEnoughTeams(1)
    );

    let twins = Battle::new(
        BattleId(8),
        vec![
            Team::new("A", vec![fighter(UA, "Ua", 10, vec![])]),
            Team::new("B", vec![fighter(UA, "Ua again", 10, vec![])]),
        ],
        BattleConfig::default(),
    );
    assert_eq!(
        twins.unwrap_err(),
        battle_core::BattleError::DuplicateCombatant(UA)
    );
}
