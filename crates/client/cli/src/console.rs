//! Prints battle output to stdout.

use std::collections::BTreeMap;

use battle_core::{BattleId, BattleResult, CombatantId, MoveOutcome, Notice, Team, TurnReport};
use battle_runtime::{BattleObserver, ObserverResult};

pub struct ConsoleObserver {
    names: BTreeMap<CombatantId, String>,
    /// Printed after each turn when someone plays from stdin.
    prompt: Option<String>,
}

impl ConsoleObserver {
    pub fn new(teams: &[Team], prompt: Option<String>) -> Self {
        let names = teams
            .iter()
            .flat_map(Team::members)
            .map(|member| (member.id(), member.name().to_owned()))
            .collect();
        Self { names, prompt }
    }

    fn name(&self, id: CombatantId) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}

impl BattleObserver for ConsoleObserver {
    fn on_outcome(&mut self, _battle: BattleId, outcome: &MoveOutcome) -> ObserverResult {
        for part in &outcome.parts {
            println!("  {part}");
        }
        Ok(())
    }

    fn on_turn_end(&mut self, _battle: BattleId, report: &TurnReport) -> ObserverResult {
        for part in report.leading.iter().chain(&report.trailing) {
            println!("  * {part}");
        }
        println!("-- end of turn {} --", report.number + 1);
        if let Some(prompt) = &self.prompt {
            println!("{prompt}");
        }
        Ok(())
    }

    fn on_broadcast(&mut self, _battle: BattleId, text: &str) -> ObserverResult {
        println!("== {text} ==");
        Ok(())
    }

    fn on_notice(&mut self, notice: &Notice) -> ObserverResult {
        println!("  ({}) {}", self.name(notice.recipient), notice.text);
        Ok(())
    }

    fn on_battle_end(&mut self, battle: BattleId, result: &BattleResult) -> ObserverResult {
        println!("{battle} finished: {result}");
        Ok(())
    }
}
