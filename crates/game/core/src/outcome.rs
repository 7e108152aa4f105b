//! Outcome records: what each move did, ready for presentation.

use std::fmt;

use crate::state::{Combatant, CombatantId};

/// A combatant as it appears in an outcome record.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantRef {
    pub id: CombatantId,
    pub name: String,
}

impl From<&Combatant> for CombatantRef {
    fn from(combatant: &Combatant) -> Self {
        Self {
            id: combatant.id(),
            name: combatant.name().to_owned(),
        }
    }
}

impl fmt::Display for CombatantRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A single observable consequence of a move (or of a turn phase).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "part", rename_all = "snake_case"))]
pub enum OutcomePart {
    UseMove {
        user: CombatantRef,
        move_name: String,
        targets: Vec<CombatantRef>,
    },
    HealthChange {
        target: CombatantRef,
        before: u32,
        after: u32,
        max: u32,
    },
    EffectAdded {
        target: CombatantRef,
        effect: String,
    },
    EffectExpired {
        target: CombatantRef,
        effect: String,
    },
    MoveFailed {
        user: CombatantRef,
        reason: String,
    },
    /// An action was refused by a rule.
    Vetoed {
        reason: String,
    },
    Message {
        text: String,
    },
    /// A hook or strategy failed; the turn carried on without it.
    EngineError {
        message: String,
    },
}

impl OutcomePart {
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message { text: text.into() }
    }

    pub fn engine_error(error: &impl fmt::Display) -> Self {
        Self::EngineError {
            message: error.to_string(),
        }
    }

    /// Returns true for the part produced by a committed HP change.
    pub fn is_health_change(&self) -> bool {
        matches!(self, Self::HealthChange { .. })
    }
}

impl fmt::Display for OutcomePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UseMove {
                user,
                move_name,
                targets,
            } => {
                write!(f, "{user} used {move_name}")?;
                if let Some((first, rest)) = targets.split_first()
                    && first.id != user.id
                {
                    write!(f, " on {first}")?;
                    for target in rest {
                        write!(f, ", {target}")?;
                    }
                }
                f.write_str("!")
            }
            Self::HealthChange {
                target,
                before,
                after,
                max,
            } => match after.cmp(before) {
                std::cmp::Ordering::Less => write!(
                    f,
                    "{target} lost {} HP ({after}/{max})",
                    before - after
                ),
                std::cmp::Ordering::Greater => write!(
                    f,
                    "{target} recovered {} HP ({after}/{max})",
                    after - before
                ),
                std::cmp::Ordering::Equal => write!(f, "{target} was unaffected ({after}/{max})"),
            },
            Self::EffectAdded { target, effect } => write!(f, "{target} is now {effect}"),
            Self::EffectExpired { target, effect } => {
                write!(f, "{target} is no longer {effect}")
            }
            Self::MoveFailed { user, reason } => write!(f, "{user} couldn't move: {reason}"),
            Self::Vetoed { reason } => f.write_str(reason),
            Self::Message { text } => f.write_str(text),
            Self::EngineError { message } => write!(f, "[engine] {message}"),
        }
    }
}

/// Result of one move in a turn.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveOutcome {
    pub user: CombatantRef,
    pub move_name: String,
    /// Whether the move was allowed to execute.
    pub executed: bool,
    /// Free-form success flag reported by the move strategy.
    pub goal_reached: bool,
    /// Parts in emission order.
    pub parts: Vec<OutcomePart>,
}

impl MoveOutcome {
    /// Health changes recorded for `target`, in order.
    pub fn health_changes_of(&self, target: CombatantId) -> impl Iterator<Item = &OutcomePart> {
        self.parts.iter().filter(move |part| {
            matches!(part, OutcomePart::HealthChange { target: t, .. } if t.id == target)
        })
    }
}

/// Everything observable about one finished turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnReport {
    pub number: u32,
    /// Parts emitted by `before_turn` hooks.
    pub leading: Vec<OutcomePart>,
    /// One outcome per move, in resolution order.
    pub outcomes: Vec<MoveOutcome>,
    /// Parts emitted by `after_turn` hooks and effect expiry.
    pub trailing: Vec<OutcomePart>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aiko() -> CombatantRef {
        CombatantRef {
            id: CombatantId(1),
            name: "Aiko".into(),
        }
    }

    fn kenji() -> CombatantRef {
        CombatantRef {
            id: CombatantId(2),
            name: "Kenji".into(),
        }
    }

    #[test]
    fn renders_moves_and_health() {
        let used = OutcomePart::UseMove {
            user: aiko(),
            move_name: "Slash".into(),
            targets: vec![kenji()],
        };
        assert_eq!(used.to_string(), "Aiko used Slash on Kenji!");

        let hurt = OutcomePart::HealthChange {
            target: kenji(),
            before: 15,
            after: 5,
            max: 20,
        };
        assert_eq!(hurt.to_string(), "Kenji lost 10 HP (5/20)");

        let same = OutcomePart::HealthChange {
            target: kenji(),
            before: 0,
            after: 0,
            max: 20,
        };
        assert_eq!(same.to_string(), "Kenji was unaffected (0/20)");
    }

    #[test]
    fn self_targeted_moves_omit_target_list() {
        let guard = OutcomePart::UseMove {
            user: aiko(),
            move_name: "Guard".into(),
            targets: vec![aiko()],
        };
        assert_eq!(guard.to_string(), "Aiko used Guard!");
    }
}
