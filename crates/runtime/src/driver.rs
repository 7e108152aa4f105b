//! Async drive loop.

use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use crate::manager::{BattleManager, Finished};

/// Ticks `manager` on its configured interval until no battle is left.
///
/// Battles that were registered but never started keep the loop alive.
pub async fn run_until_idle(manager: &mut BattleManager) -> Vec<Finished> {
    let mut interval = time::interval(manager.config().tick_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut finished = Vec::new();
    let mut ticks: u64 = 0;
    while !manager.is_idle() {
        interval.tick().await;
        ticks += 1;
        finished.extend(manager.tick());
    }

    debug!(
        target: "battle_runtime::driver",
        ticks,
        finished = finished.len(),
        "manager idle"
    );
    finished
}
