//! Channel-fed move chooser.
//!
//! A [`QueueChooser`] drains selections that other tasks push into a tokio
//! channel. It never blocks the engine: an empty queue just means the
//! combatant has not decided yet. Selections that fail validation are sent back
//! through the feedback channel and the next queued selection is tried.

use battle_core::{
    ChoiceView, ChooserKind, CombatantId, Move, MoveChooser, SelectionError,
    chooser::validate_selection,
};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::{debug, trace};

use crate::observer::Selection;

/// A selection the engine refused, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    pub combatant: CombatantId,
    pub selection: Selection,
    pub error: SelectionError,
}

/// Producer side of a [`QueueChooser`].
#[derive(Debug)]
pub struct QueueInput {
    pub selections: mpsc::Sender<Selection>,
    pub feedback: mpsc::UnboundedReceiver<Rejected>,
}

#[derive(Debug)]
pub struct QueueChooser {
    inbox: mpsc::Receiver<Selection>,
    feedback: mpsc::UnboundedSender<Rejected>,
    closed: bool,
}

impl QueueChooser {
    /// Creates a chooser and the channels that feed it.
    pub fn channel(capacity: usize) -> (Self, QueueInput) {
        let (selections, inbox) = mpsc::channel(capacity.max(1));
        let (feedback_tx, feedback) = mpsc::unbounded_channel();
        let chooser = Self {
            inbox,
            feedback: feedback_tx,
            closed: false,
        };
        (chooser, QueueInput { selections, feedback })
    }

    fn accept(&self, view: &ChoiceView<'_>, selection: &Selection) -> Result<Move, SelectionError> {
        let battle = view.battle;
        let option = battle
            .move_options(view.user)
            .into_iter()
            .find(|option| option.name() == selection.option)
            .ok_or_else(|| SelectionError::UnknownOption {
                combatant: view.user,
                option: selection.option.clone(),
            })?;
        validate_selection(battle, view.user, option.as_ref(), &selection.targets)?;
        Move::new(option, view.user, selection.targets.clone())
    }
}

impl MoveChooser for QueueChooser {
    fn kind(&self) -> ChooserKind {
        ChooserKind::Queue
    }

    fn get_move(&mut self, view: &ChoiceView<'_>) -> Option<Move> {
        if self.closed {
            return None;
        }
        loop {
            let selection = match self.inbox.try_recv() {
                Ok(selection) => selection,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    debug!(
                        target: "battle_runtime::queue",
                        combatant = %view.user,
                        "selection queue closed"
                    );
                    self.closed = true;
                    return None;
                }
            };

            match self.accept(view, &selection) {
                Ok(mv) => return Some(mv),
                Err(error) => {
                    trace!(
                        target: "battle_runtime::queue",
                        combatant = %view.user,
                        option = %selection.option,
                        %error,
                        "queued selection rejected"
                    );
                    // The producer may have gone away; nothing else to do then.
                    let _ = self.feedback.send(Rejected {
                        combatant: view.user,
                        selection,
                        error,
                    });
                }
            }
        }
    }
}
