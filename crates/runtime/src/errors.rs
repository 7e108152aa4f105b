//! Error types surfaced by the battle manager.
//!
//! Wraps engine failures so hosts can bubble them up with the battle they
//! belong to.
use battle_core::{BattleError, BattleId, DispatchError, SelectionError, SnapshotError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("no battle registered as {0}")]
    UnknownBattle(BattleId),

    #[error("{0} is already registered")]
    DuplicateBattle(BattleId),

    #[error(transparent)]
    Battle(#[from] BattleError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("failed to encode or decode a battle snapshot")]
    Json(#[source] serde_json::Error),
}

/// Failure reported by a host callback. Logged and otherwise ignored.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ObserverError(pub String);

impl ObserverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
