//! Installing and removing effects as actions, so rules can intercept them.

use crate::effect::{Effect, EffectId};
use crate::engine::Battle;
use crate::error::CommitError;
use crate::outcome::{CombatantRef, OutcomePart};
use crate::state::CombatantId;

/// Installs an effect on a combatant.
#[derive(Debug)]
pub struct EffectAddedAction {
    pub target: CombatantId,
    name: String,
    effect: Option<Box<dyn Effect>>,
}

impl EffectAddedAction {
    pub fn new(target: CombatantId, effect: Box<dyn Effect>) -> Self {
        Self {
            target,
            name: effect.name().to_owned(),
            effect: Some(effect),
        }
    }

    /// Name of the effect being installed.
    pub fn effect_name(&self) -> &str {
        &self.name
    }

    /// The pending effect; `None` once committed.
    pub fn effect(&self) -> Option<&dyn Effect> {
        self.effect.as_deref()
    }

    pub(crate) fn commit(&mut self, battle: &mut Battle) -> Result<OutcomePart, CommitError> {
        let effect = self.effect.take().ok_or(CommitError::EffectConsumed)?;
        battle.attach_effect(self.target, effect)?;
        let target = battle
            .combatant(self.target)
            .ok_or(CommitError::UnknownCombatant(self.target))?;

        Ok(OutcomePart::EffectAdded {
            target: CombatantRef::from(target),
            effect: self.name.clone(),
        })
    }
}

/// Removes an effect that decided not to stay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectRemovedAction {
    pub target: CombatantId,
    pub effect: EffectId,
    name: String,
}

impl EffectRemovedAction {
    pub fn new(target: CombatantId, effect: EffectId, name: impl Into<String>) -> Self {
        Self {
            target,
            effect,
            name: name.into(),
        }
    }

    pub fn effect_name(&self) -> &str {
        &self.name
    }

    /// Returns `None` when the effect is already gone.
    pub(crate) fn commit(
        &mut self,
        battle: &mut Battle,
    ) -> Result<Option<OutcomePart>, CommitError> {
        let Some(removed) = battle.detach_effect(self.target, self.effect)? else {
            return Ok(None);
        };
        let target = battle
            .combatant(self.target)
            .ok_or(CommitError::UnknownCombatant(self.target))?;

        Ok(Some(OutcomePart::EffectExpired {
            target: CombatantRef::from(target),
            effect: removed.name().to_owned(),
        }))
    }
}
