//! Runtime configuration.

use std::time::Duration;

use battle_core::BattleConfig;

/// Settings shared by every battle a [`BattleManager`](crate::BattleManager)
/// hosts.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub battle: BattleConfig,
    /// Delay between ticks when driven by [`run_until_idle`](crate::run_until_idle).
    pub tick_interval_ms: u64,
}

impl RuntimeConfig {
    pub const DEFAULT_TICK_INTERVAL_MS: u64 = 50;

    pub fn new(battle: BattleConfig) -> Self {
        Self {
            battle,
            tick_interval_ms: Self::DEFAULT_TICK_INTERVAL_MS,
        }
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new(BattleConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_is_clamped() {
        let config = RuntimeConfig::default().with_tick_interval(Duration::ZERO);
        assert_eq!(config.tick_interval(), Duration::from_millis(1));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: RuntimeConfig =
            serde_json::from_str(r#"{ "battle": { "seed": 9 } }"#).unwrap();
        assert_eq!(config.battle.seed, 9);
        assert_eq!(config.tick_interval_ms, RuntimeConfig::DEFAULT_TICK_INTERVAL_MS);
    }
}
