//! Deterministic turn-based battle core.
//!
//! `battle-core` coordinates combatants that select moves simultaneously,
//! resolves them in priority order and records what happened. Every state
//! mutation is an [`Action`] routed through an [`ActionBus`], so rules can
//! veto or amend it before it commits. Persistent [`Effect`]s attached to
//! combatants hook into fixed points of each [`Turn`].
//!
//! The crate has no I/O and no global state: hosts own the bus and the
//! battles and drive them with [`Battle::update`].
pub mod action;
pub mod chooser;
pub mod config;
pub mod effect;
pub mod engine;
pub mod error;
pub mod moves;
pub mod outcome;
pub mod rng;
pub mod snapshot;
pub mod state;

pub use action::{
    Action, ActionBus, ActionKind, ActionManager, BattleEndAction, BattleLifecycleAction,
    BattleResult, Damage, DamageAction, DamageCause, DamageRule, DamageSource, Dispatched,
    EffectAddedAction, EffectRemovedAction, HpDamage, MoveLocationAction, Notice, Verdict,
};
pub use chooser::{ChoiceView, ChooserKind, MoveChooser, RandomChooser, SetChooser};
pub use config::BattleConfig;
pub use effect::{
    DamageDirection, DamageModifier, Duration, Effect, EffectContext, EffectId, EffectSpec,
    Poisoned, Sealed, Stunned,
};
pub use engine::{AttachedEffect, Battle, BattleEvent, BattleId, Target, Turn, TurnPhase};
pub use error::{
    BattleError, CommitError, DispatchError, EffectError, ErrorSeverity, GameError, MoveError,
    RuleError, SelectionError,
};
pub use moves::{
    Move, MoveContext, MoveOption, MovePerformance, Recommendation, TargetCategory,
    TargetingOption, WeaponMove,
};
pub use outcome::{CombatantRef, MoveOutcome, OutcomePart, TurnReport};
pub use snapshot::{BattleSnapshot, Catalog, CombatantSnapshot, SnapshotError, TeamSnapshot};
pub use state::{Combatant, CombatantId, Item, Team, TeamId};
