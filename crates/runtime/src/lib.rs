//! Battle hosting on top of `battle-core`.
//!
//! [`BattleManager`] owns the action bus and the battles, drives them tick by
//! tick and reports their output to a [`BattleObserver`]. The crate also ships
//! the rules a world host needs around battles and a channel-fed chooser.
//!
//! Modules are organized by responsibility:
//! - [`manager`] hosts the battles and the bus
//! - [`observer`] defines the host callbacks
//! - [`rules`] provides the location lock and property effects
//! - [`queue`] feeds combatants from tokio channels
//! - [`driver`] runs the manager on a timer
pub mod config;
pub mod driver;
pub mod errors;
pub mod manager;
pub mod observer;
pub mod queue;
pub mod rules;

pub use config::RuntimeConfig;
pub use driver::run_until_idle;
pub use errors::{ObserverError, Result, RuntimeError};
pub use manager::{BattleManager, Finished};
pub use observer::{BattleObserver, NullObserver, ObserverResult, Selection};
pub use queue::{QueueChooser, QueueInput, Rejected};
pub use rules::{LocationLock, PropertyEffects, PropertySource};
