//! Common error infrastructure for battle-core.
//!
//! Errors are split by how the engine recovers from them:
//!
//! - **Rule vetoes** are not errors at all; they travel as [`Verdict::Veto`]
//!   on the action that was refused.
//! - [`SelectionError`]: a chooser or host proposed an impossible move. The
//!   caller gets the reason back and battle state is unchanged.
//! - [`EffectError`] / [`MoveError`]: an effect hook or a move strategy failed
//!   while a turn was resolving. The turn converts these into outcome parts and
//!   keeps going.
//! - [`DispatchError`]: a manager failed or a follow-up chain ran away. Aborts
//!   the dispatch; the action is left uncommitted.
//! - [`BattleError`]: an engine invariant was violated. Fatal for the battle.
//!
//! [`Verdict::Veto`]: crate::action::Verdict::Veto

use crate::state::CombatantId;

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the engine absorbs the failure and continues the turn
/// - **Validation**: invalid input that should be rejected without retry
/// - **Internal**: unexpected state inconsistencies that require investigation
/// - **Fatal**: the battle cannot continue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable | Self::Validation)
    }

    /// Returns true if this error indicates an engine bug or corrupted state.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all battle-core errors.
///
/// Provides a uniform classification so hosts can pick a recovery strategy
/// without matching on every concrete error type.
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Useful for metrics and assertions in tests.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

// ============================================================================
// Selection
// ============================================================================

/// Why a proposed move selection was refused.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("{combatant} has no move called '{option}'")]
    UnknownOption {
        combatant: CombatantId,
        option: String,
    },

    #[error("{0} is not part of this battle")]
    UnknownCombatant(CombatantId),

    #[error("a move needs at least one target")]
    NoTargets,

    #[error("too many targets: at most {max}, got {got}")]
    TooManyTargets { max: usize, got: usize },

    #[error("{0} was selected more than once")]
    DuplicateTarget(CombatantId),

    #[error("{target} cannot be targeted ({category})")]
    Disallowed { target: CombatantId, category: String },

    #[error("{0}")]
    CannotUse(String),

    #[error("{0}")]
    Vetoed(String),

    #[error("{0} does not take move selections from the host")]
    NotSetChooser(CombatantId),

    #[error("moves can only be chosen while the turn is polling")]
    TurnNotPolling,

    #[error("{0} has fainted and cannot act this turn")]
    Fainted(CombatantId),
}

impl SelectionError {
    /// Returns the user-facing reason (the `Display` form).
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

impl GameError for SelectionError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownOption { .. } => "selection.unknown_option",
            Self::UnknownCombatant(_) => "selection.unknown_combatant",
            Self::NoTargets => "selection.no_targets",
            Self::TooManyTargets { .. } => "selection.too_many_targets",
            Self::DuplicateTarget(_) => "selection.duplicate_target",
            Self::Disallowed { .. } => "selection.disallowed",
            Self::CannotUse(_) => "selection.cannot_use",
            Self::Vetoed(_) => "selection.vetoed",
            Self::NotSetChooser(_) => "selection.not_set_chooser",
            Self::TurnNotPolling => "selection.turn_not_polling",
            Self::Fainted(_) => "selection.fainted",
        }
    }
}

// ============================================================================
// Hooks and move strategies
// ============================================================================

/// Failure raised by an effect hook.
///
/// Effect failures never abort a turn; they become
/// [`OutcomePart::EngineError`](crate::outcome::OutcomePart::EngineError).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("effect '{effect}' failed: {message}")]
pub struct EffectError {
    pub effect: String,
    pub message: String,
}

impl EffectError {
    pub fn new(effect: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            effect: effect.into(),
            message: message.into(),
        }
    }
}

impl GameError for EffectError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }
}

/// Failure raised while a move strategy was executing.
///
/// Treated as a veto after the fact: the move outcome is marked as not
/// executed and carries a `MoveFailed` part.
#[derive(Clone, Debug, thiserror::Error)]
pub enum MoveError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("effect '{0}' cannot be built without a catalog")]
    UnbuildableEffect(String),

    #[error("{0}")]
    Other(String),
}

impl GameError for MoveError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Error returned by an [`ActionManager`](crate::action::ActionManager).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RuleError {
    pub message: String,
}

impl RuleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Inconsistent state found while committing an action.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommitError {
    #[error("'{action}' must be dispatched inside a battle")]
    NoBattle { action: &'static str },

    #[error("{0} is not part of this battle")]
    UnknownCombatant(CombatantId),

    #[error("the battle has no active turn")]
    NoTurn,

    #[error("effect payload was already consumed")]
    EffectConsumed,
}

/// Errors surfaced while dispatching an action through the bus.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("manager '{manager}' failed on '{action}': {source}")]
    ManagerFailed {
        manager: &'static str,
        action: &'static str,
        #[source]
        source: RuleError,
    },

    #[error("follow-up chain too deep: '{action}' reached depth {depth}")]
    ChainTooDeep { action: &'static str, depth: usize },

    #[error("commit of '{action}' failed: {source}")]
    Commit {
        action: &'static str,
        #[source]
        source: CommitError,
    },
}

impl GameError for DispatchError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ManagerFailed { .. } => ErrorSeverity::Recoverable,
            Self::ChainTooDeep { .. } => ErrorSeverity::Internal,
            Self::Commit { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ManagerFailed { .. } => "dispatch.manager_failed",
            Self::ChainTooDeep { .. } => "dispatch.chain_too_deep",
            Self::Commit { .. } => "dispatch.commit",
        }
    }
}

impl From<DispatchError> for EffectError {
    fn from(error: DispatchError) -> Self {
        Self::new("dispatch", error.to_string())
    }
}

// ============================================================================
// Battle invariants
// ============================================================================

/// Engine invariant violations. These abort the current battle.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BattleError {
    #[error("a battle needs at least two teams, got {0}")]
    NotEnoughTeams(usize),

    #[error("team '{0}' has no members")]
    EmptyTeam(String),

    #[error("{0} appears in more than one slot")]
    DuplicateCombatant(CombatantId),

    #[error("{0} is not part of this battle")]
    UnknownCombatant(CombatantId),

    #[error("battle has not started")]
    NotStarted,

    #[error("battle has already started")]
    AlreadyStarted,

    #[error("battle has already ended")]
    AlreadyEnded,

    #[error("turn {turn} has {actual} targets but the battle has {expected} combatants")]
    TargetCountMismatch {
        turn: u32,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl GameError for BattleError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotEnoughTeams(_)
            | Self::EmptyTeam(_)
            | Self::DuplicateCombatant(_)
            | Self::UnknownCombatant(_) => ErrorSeverity::Validation,
            Self::NotStarted | Self::AlreadyStarted | Self::AlreadyEnded => ErrorSeverity::Fatal,
            Self::TargetCountMismatch { .. } => ErrorSeverity::Internal,
            Self::Dispatch(inner) => inner.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotEnoughTeams(_) => "battle.not_enough_teams",
            Self::EmptyTeam(_) => "battle.empty_team",
            Self::DuplicateCombatant(_) => "battle.duplicate_combatant",
            Self::UnknownCombatant(_) => "battle.unknown_combatant",
            Self::NotStarted => "battle.not_started",
            Self::AlreadyStarted => "battle.already_started",
            Self::AlreadyEnded => "battle.already_ended",
            Self::TargetCountMismatch { .. } => "battle.target_count_mismatch",
            Self::Dispatch(inner) => inner.error_code(),
        }
    }
}
