/// Battle configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BattleConfig {
    /// When set, combatants may not change location as soon as their battle is
    /// registered, not only once it has started.
    pub strict_location_lock: bool,

    /// Display name of the zero-damage fallback move.
    pub struggle_name: String,

    /// Maximum nesting of follow-up actions queued by managers.
    pub max_action_depth: usize,

    /// Base seed for random move choosers.
    pub seed: u64,
}

impl BattleConfig {
    // ===== runtime-tunable defaults =====
    pub const DEFAULT_STRUGGLE_NAME: &'static str = "Struggle";
    pub const DEFAULT_MAX_ACTION_DEPTH: usize = 8;
    pub const DEFAULT_SEED: u64 = 0x5eed;

    pub fn new() -> Self {
        Self {
            strict_location_lock: false,
            struggle_name: Self::DEFAULT_STRUGGLE_NAME.to_owned(),
            max_action_depth: Self::DEFAULT_MAX_ACTION_DEPTH,
            seed: Self::DEFAULT_SEED,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn strict(mut self) -> Self {
        self.strict_location_lock = true;
        self
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}
