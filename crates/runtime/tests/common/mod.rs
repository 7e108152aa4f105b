#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use battle_core::{
    Battle, BattleId, BattleResult, Combatant, CombatantId, MoveOutcome, Notice, Team, TurnReport,
};
use battle_runtime::{
    BattleManager, BattleObserver, ObserverError, ObserverResult, RuntimeConfig, Selection,
};
use ninja_content::Armory;

pub const AIKO: CombatantId = CombatantId(1);
pub const KENJI: CombatantId = CombatantId(2);
pub const MASARU: CombatantId = CombatantId(5);

/// Everything an observer saw, shared with the test body.
#[derive(Debug, Default)]
pub struct Log {
    pub broadcasts: Vec<String>,
    pub outcomes: Vec<String>,
    pub turns: Vec<u32>,
    pub notices: Vec<Notice>,
    pub ended: Vec<(BattleId, BattleResult)>,
    pub requests: usize,
}

/// Records callbacks and answers move requests from a fixed table.
#[derive(Default)]
pub struct Recorder {
    pub log: Rc<RefCell<Log>>,
    pub picks: BTreeMap<CombatantId, Selection>,
}

impl Recorder {
    pub fn new() -> (Self, Rc<RefCell<Log>>) {
        let recorder = Self::default();
        let log = Rc::clone(&recorder.log);
        (recorder, log)
    }

    pub fn pick(mut self, combatant: CombatantId, selection: Selection) -> Self {
        self.picks.insert(combatant, selection);
        self
    }
}

impl BattleObserver for Recorder {
    fn on_outcome(&mut self, _battle: BattleId, outcome: &MoveOutcome) -> ObserverResult {
        self.log.borrow_mut().outcomes.push(outcome.move_name.clone());
        Ok(())
    }

    fn on_turn_end(&mut self, _battle: BattleId, report: &TurnReport) -> ObserverResult {
        self.log.borrow_mut().turns.push(report.number);
        Ok(())
    }

    fn on_broadcast(&mut self, _battle: BattleId, text: &str) -> ObserverResult {
        self.log.borrow_mut().broadcasts.push(text.to_owned());
        Ok(())
    }

    fn on_notice(&mut self, notice: &Notice) -> ObserverResult {
        self.log.borrow_mut().notices.push(notice.clone());
        Ok(())
    }

    fn on_battle_end(&mut self, battle: BattleId, result: &BattleResult) -> ObserverResult {
        self.log.borrow_mut().ended.push((battle, result.clone()));
        Ok(())
    }

    fn on_request_move(
        &mut self,
        _battle: &Battle,
        combatant: CombatantId,
    ) -> ObserverResult<Option<Selection>> {
        self.log.borrow_mut().requests += 1;
        Ok(self.picks.get(&combatant).cloned())
    }
}

/// Fails every callback it can.
pub struct Grumpy;

impl BattleObserver for Grumpy {
    fn on_broadcast(&mut self, _battle: BattleId, _text: &str) -> ObserverResult {
        Err(ObserverError::new("no broadcasts, please"))
    }

    fn on_request_move(
        &mut self,
        _battle: &Battle,
        _combatant: CombatantId,
    ) -> ObserverResult<Option<Selection>> {
        Err(ObserverError::new("not now"))
    }
}

pub fn fast_config() -> RuntimeConfig {
    RuntimeConfig::default().with_tick_interval(Duration::from_millis(1))
}

pub fn manager() -> BattleManager {
    BattleManager::new(fast_config())
}

/// Aiko with a katana against Masaru, who carries nothing.
pub fn duel() -> Vec<Team> {
    let armory = Armory::trail_of_ninjas();
    let katana = armory.weapon("Katana").unwrap().to_item();
    vec![
        Team::new(
            "Wanderers",
            vec![Combatant::new(AIKO, "Aiko", 40).with_item(katana)],
        ),
        Team::new("Ronin", vec![Combatant::new(MASARU, "Masaru", 16)]),
    ]
}
