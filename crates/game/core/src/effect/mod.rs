//! Effects: rules attached to one combatant with turn lifecycle hooks.
//!
//! The turn calls the hooks at fixed points:
//!
//! | Hook | When |
//! |---|---|
//! | `can_choose` | while a selection is validated |
//! | `can_move` | right before the owner's move resolves |
//! | `before_turn` | before any move of the turn resolves |
//! | `on_damage` | a damage involves the owner as damager or target |
//! | `after_move` | right after the owner's move resolved |
//! | `after_turn` | after every move of the turn resolved |
//! | `should_stay` | once per turn, during decay |
//!
//! Effects are keyed by [`EffectId`] and live in the owner's per-turn
//! [`Target`](crate::engine::Target); surviving effects move to the next turn.

pub mod builtin;

pub use builtin::{DamageDirection, DamageModifier, Poisoned, Sealed, Stunned};

use std::collections::BTreeMap;
use std::fmt;

use crate::action::{Action, ActionBus, DamageAction, Dispatched, Verdict};
use crate::engine::Battle;
use crate::error::{DispatchError, EffectError};
use crate::moves::{Move, MoveOption};
use crate::outcome::{MoveOutcome, OutcomePart};
use crate::state::{Combatant, CombatantId};

/// Identity of an installed effect within its battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectId(pub u64);

/// Remaining-turns counter of a timed effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Duration {
    remaining: u32,
}

impl Duration {
    pub fn turns(remaining: u32) -> Self {
        Self { remaining }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Counts one turn down. Returns false once no turns are left.
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining > 0
    }
}

/// Parts emitted by a lifecycle hook.
pub type HookResult = Result<Vec<OutcomePart>, EffectError>;

/// A rule attached to one combatant.
///
/// Every hook has a neutral default, so an effect only implements what it
/// cares about. Effects without a [`Duration`] are properties and stay forever.
pub trait Effect: fmt::Debug {
    fn name(&self) -> &str;

    fn duration(&self) -> Option<&Duration> {
        None
    }

    fn duration_mut(&mut self) -> Option<&mut Duration> {
        None
    }

    fn turns_remaining(&self) -> Option<u32> {
        self.duration().map(Duration::remaining)
    }

    fn can_choose(
        &self,
        _owner: &Combatant,
        _option: &dyn MoveOption,
        _targets: &[CombatantId],
    ) -> Verdict {
        Verdict::Allow
    }

    fn can_move(&self, _owner: &Combatant, _mv: &Move) -> Verdict {
        Verdict::Allow
    }

    fn before_turn(&mut self, _ctx: &mut EffectContext<'_>, _mv: &Move) -> HookResult {
        Ok(Vec::new())
    }

    /// May amend the damage, e.g. push a multiplier.
    fn on_damage(&mut self, _owner: CombatantId, _damage: &mut DamageAction) -> HookResult {
        Ok(Vec::new())
    }

    fn after_move(
        &mut self,
        _ctx: &mut EffectContext<'_>,
        _mv: &Move,
        _outcome: &MoveOutcome,
    ) -> HookResult {
        Ok(Vec::new())
    }

    fn after_turn(&mut self, _ctx: &mut EffectContext<'_>, _mv: &Move) -> HookResult {
        Ok(Vec::new())
    }

    /// Called once at the end of `turn`; returning false removes the effect.
    fn should_stay(&mut self, _turn: u32) -> bool {
        self.duration_mut().is_none_or(Duration::tick)
    }

    /// Serialisable description of the current state.
    fn spec(&self) -> EffectSpec;
}

/// Access an effect hook gets while it runs.
pub struct EffectContext<'a> {
    pub owner: CombatantId,
    pub turn: u32,
    pub battle: &'a mut Battle,
    pub bus: &'a mut ActionBus,
}

impl EffectContext<'_> {
    pub fn owner(&self) -> Option<&Combatant> {
        self.battle.combatant(self.owner)
    }

    pub fn dispatch(&mut self, action: Action) -> Result<Dispatched, DispatchError> {
        self.bus.dispatch(action, Some(&mut *self.battle))
    }
}

// ============================================================================
// Specs
// ============================================================================

/// Serialisable description of an effect, tagged by variant.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum EffectSpec {
    DamageModifier {
        name: String,
        factor: f64,
        direction: DamageDirection,
        #[cfg_attr(feature = "serde", serde(default))]
        tag: Option<String>,
    },
    Poisoned {
        damage: u32,
        turns: u32,
    },
    Stunned {
        turns: u32,
    },
    Sealed {
        option: String,
        turns: u32,
    },
    /// Host-defined effect, resolved through a catalog.
    Custom {
        tag: String,
        name: String,
        #[cfg_attr(feature = "serde", serde(default))]
        turns_remaining: Option<u32>,
        #[cfg_attr(feature = "serde", serde(default))]
        params: BTreeMap<String, String>,
    },
}

impl EffectSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::DamageModifier { name, .. } | Self::Custom { name, .. } => name,
            Self::Poisoned { .. } => Poisoned::NAME,
            Self::Stunned { .. } => Stunned::NAME,
            Self::Sealed { .. } => Sealed::NAME,
        }
    }

    /// Builds a built-in effect. Returns `None` for [`EffectSpec::Custom`].
    pub fn build(&self) -> Option<Box<dyn Effect>> {
        let effect: Box<dyn Effect> = match self {
            Self::DamageModifier {
                name,
                factor,
                direction,
                tag,
            } => Box::new(DamageModifier::new(
                name.clone(),
                *factor,
                *direction,
                tag.clone(),
            )),
            Self::Poisoned { damage, turns } => Box::new(Poisoned::new(*damage, *turns)),
            Self::Stunned { turns } => Box::new(Stunned::new(*turns)),
            Self::Sealed { option, turns } => Box::new(Sealed::new(option.clone(), *turns)),
            Self::Custom { .. } => return None,
        };
        Some(effect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_counts_down_to_removal() {
        let mut duration = Duration::turns(2);
        assert!(duration.tick());
        assert!(!duration.tick());
        assert!(!duration.tick());
        assert_eq!(duration.remaining(), 0);
    }

    #[test]
    fn timed_effects_leave_after_their_turns() {
        let mut stun = Stunned::new(1);
        assert_eq!(stun.turns_remaining(), Some(1));
        assert!(!stun.should_stay(0));
    }

    #[test]
    fn properties_stay_forever() {
        let mut modifier =
            DamageModifier::new("Thick hide", 0.5, DamageDirection::Incoming, None);
        for turn in 0..10 {
            assert!(modifier.should_stay(turn));
        }
    }

    #[test]
    fn specs_rebuild_builtin_effects() {
        let spec = EffectSpec::Poisoned { damage: 2, turns: 3 };
        let effect = spec.build().unwrap();
        assert_eq!(effect.name(), "Poisoned");
        assert_eq!(effect.spec(), spec);

        let custom = EffectSpec::Custom {
            tag: "blessing".into(),
            name: "Blessed".into(),
            turns_remaining: None,
            params: BTreeMap::new(),
        };
        assert!(custom.build().is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn specs_are_tagged_by_kind() {
        let spec: EffectSpec = serde_json::from_str(
            r#"{ "kind": "damage_modifier", "name": "Light Armor", "factor": 1.2, "direction": "incoming" }"#,
        )
        .unwrap();
        assert_eq!(
            spec,
            EffectSpec::DamageModifier {
                name: "Light Armor".into(),
                factor: 1.2,
                direction: DamageDirection::Incoming,
                tag: None,
            }
        );

        let json = serde_json::to_value(EffectSpec::Stunned { turns: 1 }).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "stunned", "turns": 1 }));
    }
}
