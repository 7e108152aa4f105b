mod common;

use std::time::Duration;

use battle_core::{
    ActionKind, BattleId, BattleResult, Combatant, MoveLocationAction, RuleError, SetChooser,
    TeamId,
};
use battle_runtime::{BattleManager, Finished, RuntimeConfig, RuntimeError, Selection, run_until_idle};
use common::{AIKO, KENJI, MASARU, Recorder, duel, fast_config, manager};
use ninja_content::{Armory, PropertyTable, Roster};

fn leave_village(manager: &mut BattleManager) -> bool {
    let walk = MoveLocationAction::new(KENJI, Some("Village".into()), "Bamboo Forest");
    manager.dispatch(walk.into_action()).unwrap().committed()
}

fn ninja_teams() -> Vec<battle_core::Team> {
    Roster::trail_of_ninjas()
        .build_teams(&["Wanderers", "Shadow Clan"], &Armory::trail_of_ninjas())
        .unwrap()
}

#[test]
fn fighters_cannot_walk_away_from_a_running_battle() {
    let (recorder, log) = Recorder::new();
    let mut manager = manager().with_observer(recorder);

    let id = manager.create_battle(ninja_teams()).unwrap();
    assert!(leave_village(&mut manager), "not engaged before the start");

    manager.start_battle(id).unwrap();
    assert!(!leave_village(&mut manager));
    {
        let log = log.borrow();
        assert_eq!(log.notices.len(), 1);
        assert_eq!(log.notices[0].recipient, KENJI);
        assert_eq!(
            log.notices[0].text,
            "you can't leave, you've got to stay and fight"
        );
    }

    let finished = manager.force_end(id).unwrap();
    assert_eq!(finished.result, BattleResult::Aborted);
    assert!(manager.is_idle());
    assert!(leave_village(&mut manager));
    assert_eq!(
        log.borrow().broadcasts.last().map(String::as_str),
        Some("The battle was called off.")
    );
}

#[test]
fn strict_lock_holds_from_registration() {
    let config = RuntimeConfig::new(battle_core::BattleConfig::default().strict());
    let mut manager = BattleManager::new(config);

    manager.create_battle(ninja_teams()).unwrap();
    assert!(!leave_village(&mut manager));
}

#[tokio::test]
async fn host_answers_move_requests_until_victory() {
    let (recorder, log) = Recorder::new();
    let recorder = recorder.pick(AIKO, Selection::new("Guard Break", vec![MASARU]));
    let mut manager = manager().with_observer(recorder);

    let id = manager.create_battle(duel()).unwrap();
    manager
        .set_chooser(id, AIKO, Box::new(SetChooser::new()))
        .unwrap();
    manager.start_battle(id).unwrap();

    let finished = tokio::time::timeout(Duration::from_secs(5), run_until_idle(&mut manager))
        .await
        .expect("battle should finish");

    let victory = BattleResult::Victory(TeamId(0));
    assert_eq!(
        finished,
        vec![Finished {
            battle: id,
            result: victory.clone()
        }]
    );

    let log = log.borrow();
    // 16 hp, 12 per Guard Break.
    assert_eq!(log.turns, vec![0, 1]);
    assert_eq!(log.requests, 2);
    assert_eq!(log.ended, vec![(id, victory)]);
    assert!(log.outcomes.iter().any(|name| name == "Guard Break"));
    assert_eq!(
        log.broadcasts,
        vec![
            "A battle begins: Wanderers vs Ronin!".to_owned(),
            "Ronin has been defeated!".to_owned(),
            "Wanderers wins the battle!".to_owned(),
        ]
    );
}

#[tokio::test]
async fn a_failing_end_rule_keeps_the_victory() {
    let (recorder, log) = Recorder::new();
    let recorder = recorder.pick(AIKO, Selection::new("Guard Break", vec![MASARU]));
    let mut manager = manager().with_observer(recorder);
    manager.register_fn("banner", |action, _| {
        if matches!(action.kind(), ActionKind::BattleEnd(_)) {
            return Err(RuleError::new("the banner tore"));
        }
        Ok(())
    });

    let id = manager.create_battle(duel()).unwrap();
    manager
        .set_chooser(id, AIKO, Box::new(SetChooser::new()))
        .unwrap();
    manager.start_battle(id).unwrap();

    let finished = tokio::time::timeout(Duration::from_secs(5), run_until_idle(&mut manager))
        .await
        .expect("battle should finish");

    let victory = BattleResult::Victory(TeamId(0));
    assert_eq!(
        finished,
        vec![Finished {
            battle: id,
            result: victory.clone()
        }]
    );
    assert_eq!(log.borrow().ended, vec![(id, victory)]);
}

#[test]
fn properties_are_installed_when_the_battle_starts() {
    let table = PropertyTable::trail_of_ninjas();
    let mut manager = manager();
    manager.install_properties(move |combatant: &Combatant| table.effects_for(combatant));
    assert_eq!(
        manager.rules(),
        vec!["damage", "location_lock", "property_effects"]
    );

    let id = manager.battle_start(ninja_teams()).unwrap();
    let battle = manager.battle(id).unwrap();

    assert!(battle.effects(AIKO).unwrap().is_empty());
    let effects = battle.effects(KENJI).unwrap();
    assert_eq!(effects.len(), 1);
    assert_eq!(effects[0].effect.name(), "Light Armor");
}

#[test]
fn failing_observers_do_not_stop_battles() {
    let mut manager = manager().with_observer(common::Grumpy);
    let id = manager.create_battle(duel()).unwrap();
    manager
        .set_chooser(id, AIKO, Box::new(SetChooser::new()))
        .unwrap();
    manager.start_battle(id).unwrap();

    for _ in 0..5 {
        assert!(manager.tick().is_empty());
    }
    // Still waiting on the host; the battle stays registered.
    let turn = manager.battle(id).unwrap().turn().unwrap();
    assert_eq!(turn.number(), 0);
    assert!(turn.target(AIKO).unwrap().chosen().is_none());
}

#[test]
fn unknown_battles_are_reported() {
    let mut manager = manager();
    let missing = BattleId(42);

    assert!(matches!(
        manager.choose_move(missing, AIKO, "Slash", vec![MASARU]),
        Err(RuntimeError::UnknownBattle(id)) if id == missing
    ));
    assert!(matches!(
        manager.force_end(missing),
        Err(RuntimeError::UnknownBattle(_))
    ));
    assert!(matches!(
        manager.export_json(missing),
        Err(RuntimeError::UnknownBattle(_))
    ));
}

#[test]
fn host_selections_are_checked_by_the_engine() {
    let mut manager = manager();
    let id = manager.create_battle(duel()).unwrap();
    manager
        .set_chooser(id, AIKO, Box::new(SetChooser::new()))
        .unwrap();
    manager.start_battle(id).unwrap();

    let error = manager
        .choose_move(id, AIKO, "Fireball", vec![MASARU])
        .unwrap_err();
    assert!(matches!(error, RuntimeError::Selection(_)), "{error}");
    manager
        .choose_move(id, AIKO, "Slash", vec![MASARU])
        .unwrap();

    manager.tick();
    assert_eq!(manager.battle(id).unwrap().combatant(MASARU).unwrap().hp(), 8);
}

#[test]
fn exported_battles_resume_in_another_manager() {
    let armory = Armory::trail_of_ninjas();
    let mut first = manager();
    let id = first.battle_start(ninja_teams()).unwrap();
    for _ in 0..3 {
        first.tick();
    }
    let saved = first.snapshot(id).unwrap();
    assert!(!saved.ended, "random ninjas should not finish in three ticks");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("battle.json");
    std::fs::write(&path, first.export_json(id).unwrap()).unwrap();

    let json = std::fs::read_to_string(&path).unwrap();
    let mut second = BattleManager::new(fast_config());
    let restored = second.restore_json(&json, &armory).unwrap();

    assert_eq!(restored, id);
    assert_eq!(second.snapshot(restored).unwrap(), saved);
    // The restored battle is already running, so its fighters stay put.
    assert!(!leave_village(&mut second));

    let fresh = second.create_battle(duel()).unwrap();
    assert_ne!(fresh, id);
}
