use battle_core::CombatantId;

/// Inconsistent content definitions.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    #[error("unknown weapon '{weapon}' carried by '{combatant}'")]
    UnknownWeapon { combatant: String, weapon: String },

    #[error("unknown team '{0}'")]
    UnknownTeam(String),

    #[error("{0} is defined more than once in the roster")]
    DuplicateCombatant(CombatantId),

    #[error("weapon '{0}' is defined more than once")]
    DuplicateWeapon(String),
}
