#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use battle_core::{
    ActionBus, ActionKind, Battle, BattleConfig, BattleId, Combatant, CombatantId, CombatantRef,
    Item, MoveOption, SetChooser, Team, WeaponMove,
};

pub const UA: CombatantId = CombatantId(1);
pub const UB: CombatantId = CombatantId(2);
pub const UC: CombatantId = CombatantId(3);

/// A combatant carrying one weapon with the given moves.
pub fn fighter(id: CombatantId, name: &str, hp: u32, moves: Vec<WeaponMove>) -> Combatant {
    let combatant = Combatant::new(id, name, hp);
    if moves.is_empty() {
        return combatant;
    }
    let options = moves
        .into_iter()
        .map(|m| Arc::new(m) as Arc<dyn MoveOption>)
        .collect();
    combatant.with_item(Item::weapon(format!("{name}'s blade"), options))
}

pub fn strike(hp_change: i32) -> WeaponMove {
    WeaponMove::new("Strike", hp_change)
}

/// Builds a battle between two teams with the core rules registered.
pub fn battle(team_a: Vec<Combatant>, team_b: Vec<Combatant>) -> (Battle, ActionBus) {
    let config = BattleConfig::default();
    let bus = ActionBus::with_core_rules(&config);
    let battle = Battle::new(
        BattleId(1),
        vec![Team::new("Team A", team_a), Team::new("Team B", team_b)],
        config,
    )
    .unwrap();
    (battle, bus)
}

/// Binds a set chooser to every combatant.
pub fn host_driven(battle: &mut Battle) {
    for id in battle.combatant_ids() {
        battle.set_chooser(id, Box::new(SetChooser::new())).unwrap();
    }
}

/// Counts dispatched `BattleEnd` actions.
pub fn count_battle_ends(bus: &mut ActionBus) -> Rc<Cell<usize>> {
    let count = Rc::new(Cell::new(0));
    let seen = Rc::clone(&count);
    bus.register_fn("end-counter", move |action, _| {
        if matches!(action.kind(), ActionKind::BattleEnd(_)) {
            seen.set(seen.get() + 1);
        }
        Ok(())
    });
    count
}

pub fn who(battle: &Battle, id: CombatantId) -> CombatantRef {
    CombatantRef::from(battle.combatant(id).unwrap())
}

pub fn hp(battle: &Battle, id: CombatantId) -> u32 {
    battle.combatant(id).unwrap().hp()
}
