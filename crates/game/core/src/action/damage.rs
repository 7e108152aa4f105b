//! Damage pipeline.
//!
//! Damage is dispatched as an action so rules and effects can amend it. HP
//! damage carries a signed `hp_change` (negative hurts, positive heals) and a
//! list of multipliers pushed by effects; the applied delta is
//! `trunc(hp_change * product(multipliers))`, truncated toward zero.

use tracing::warn;

use super::{Action, ActionKind, ActionManager};
use crate::effect::Effect;
use crate::engine::Battle;
use crate::error::{CommitError, RuleError};
use crate::outcome::{CombatantRef, OutcomePart};
use crate::state::CombatantId;

/// What produced a damage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DamageSource {
    /// A move, with the tags of its option (e.g. `"slash"`).
    Move { name: String, tags: Vec<String> },
    /// An effect ticking on its owner (poison).
    Effect { name: String },
}

impl DamageSource {
    pub fn name(&self) -> &str {
        match self {
            Self::Move { name, .. } | Self::Effect { name } => name,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        match self {
            Self::Move { tags, .. } => tags.iter().any(|t| t == tag),
            Self::Effect { .. } => false,
        }
    }
}

/// Who damages whom, and with what.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DamageCause {
    /// `None` for damage without an attacker (effect ticks).
    pub damager: Option<CombatantId>,
    pub target: CombatantId,
    pub source: DamageSource,
}

/// A signed HP change plus the multipliers collected while dispatching it.
#[derive(Clone, Debug, PartialEq)]
pub struct HpDamage {
    hp_change: i32,
    multipliers: Vec<f64>,
}

impl HpDamage {
    const SNAP_EPSILON: f64 = 1e-9;

    pub fn new(hp_change: i32) -> Self {
        Self {
            hp_change,
            multipliers: Vec::new(),
        }
    }

    pub fn hp_change(&self) -> i32 {
        self.hp_change
    }

    pub fn multipliers(&self) -> &[f64] {
        &self.multipliers
    }

    pub fn push_multiplier(&mut self, factor: f64) {
        self.multipliers.push(factor);
    }

    /// The delta applied on commit, truncated toward zero.
    ///
    /// Products within float noise of a whole number snap to it first, so
    /// `-90 x 0.7` applies `-63` rather than `-62`.
    pub fn final_delta(&self) -> i64 {
        let product: f64 = self.multipliers.iter().product();
        let exact = self.hp_change as f64 * product;
        let nearest = exact.round();
        if (exact - nearest).abs() <= Self::SNAP_EPSILON * nearest.abs().max(1.0) {
            nearest as i64
        } else {
            exact.trunc() as i64
        }
    }
}

/// Damage variants.
#[derive(Debug)]
pub enum Damage {
    /// HP change from a weapon move.
    WeaponHp(HpDamage),
    /// HP change from an effect.
    EffectHp(HpDamage),
    /// A weapon move inflicting an effect. The payload is consumed on commit.
    WeaponEffectAdd(Option<Box<dyn Effect>>),
}

impl Damage {
    pub fn hp(&self) -> Option<&HpDamage> {
        match self {
            Self::WeaponHp(hp) | Self::EffectHp(hp) => Some(hp),
            Self::WeaponEffectAdd(_) => None,
        }
    }

    pub fn hp_mut(&mut self) -> Option<&mut HpDamage> {
        match self {
            Self::WeaponHp(hp) | Self::EffectHp(hp) => Some(hp),
            Self::WeaponEffectAdd(_) => None,
        }
    }

    pub fn is_weapon(&self) -> bool {
        matches!(self, Self::WeaponHp(_) | Self::WeaponEffectAdd(_))
    }
}

/// A damage travelling through the bus.
#[derive(Debug)]
pub struct DamageAction {
    pub cause: DamageCause,
    pub damage: Damage,
}

impl DamageAction {
    pub fn new(cause: DamageCause, damage: Damage) -> Self {
        Self { cause, damage }
    }

    /// Weapon HP damage dealt by `damager` to `target`.
    pub fn weapon_hp(cause: DamageCause, hp_change: i32) -> Self {
        Self::new(cause, Damage::WeaponHp(HpDamage::new(hp_change)))
    }

    /// HP damage from an effect on its owner.
    pub fn effect_hp(target: CombatantId, effect: impl Into<String>, hp_change: i32) -> Self {
        let cause = DamageCause {
            damager: None,
            target,
            source: DamageSource::Effect {
                name: effect.into(),
            },
        };
        Self::new(cause, Damage::EffectHp(HpDamage::new(hp_change)))
    }

    /// Wraps the damage in an action initiated by the damager (if any).
    pub fn into_action(self) -> Action {
        let damager = self.cause.damager;
        let action = Action::new(self);
        match damager {
            Some(id) => action.with_initiator(id),
            None => action,
        }
    }

    pub(crate) fn commit(&mut self, battle: &mut Battle) -> Result<OutcomePart, CommitError> {
        let target = self.cause.target;
        match &mut self.damage {
            Damage::WeaponHp(hp) | Damage::EffectHp(hp) => {
                let delta = hp.final_delta();
                let combatant = battle
                    .combatant_mut(target)
                    .ok_or(CommitError::UnknownCombatant(target))?;
                let before = combatant.apply_hp_delta(delta);
                Ok(OutcomePart::HealthChange {
                    target: CombatantRef::from(&*combatant),
                    before,
                    after: combatant.hp(),
                    max: combatant.max_hp(),
                })
            }
            Damage::WeaponEffectAdd(effect) => {
                let effect = effect.take().ok_or(CommitError::EffectConsumed)?;
                let name = effect.name().to_owned();
                battle.attach_effect(target, effect)?;
                let target = battle
                    .combatant(target)
                    .ok_or(CommitError::UnknownCombatant(target))?;
                Ok(OutcomePart::EffectAdded {
                    target: target.into(),
                    effect: name,
                })
            }
        }
    }
}

/// Routes damage to the effects of the damager and of the target.
///
/// Effects on teammates are never consulted. The damager's effects run first,
/// each list in installation order; a combatant damaging itself is consulted
/// once. Hook failures become [`OutcomePart::EngineError`] parts on the action.
#[derive(Clone, Copy, Debug, Default)]
pub struct DamageRule;

impl ActionManager for DamageRule {
    fn name(&self) -> &'static str {
        "damage"
    }

    fn on_action(
        &mut self,
        action: &mut Action,
        battle: Option<&mut Battle>,
    ) -> Result<(), RuleError> {
        let Some(battle) = battle else {
            return Ok(());
        };
        let ActionKind::Damage(damage) = action.kind_mut() else {
            return Ok(());
        };

        let mut owners = Vec::with_capacity(2);
        owners.extend(damage.cause.damager);
        if !owners.contains(&damage.cause.target) {
            owners.push(damage.cause.target);
        }

        let mut parts = Vec::new();
        for owner in owners {
            let Some(effects) = battle.effects_mut(owner) else {
                continue;
            };
            for attached in effects.iter_mut() {
                match attached.effect.on_damage(owner, damage) {
                    Ok(emitted) => parts.extend(emitted),
                    Err(error) => {
                        warn!(
                            target: "battle_core::damage",
                            combatant = %owner,
                            effect = attached.effect.name(),
                            error = %error,
                            "on_damage hook failed"
                        );
                        parts.push(OutcomePart::engine_error(&error));
                    }
                }
            }
        }

        for part in parts {
            action.push_part(part);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_delta_truncates_toward_zero() {
        let mut hp = HpDamage::new(-10);
        hp.push_multiplier(1.2);
        hp.push_multiplier(0.5);
        assert_eq!(hp.final_delta(), -6);

        let mut hp = HpDamage::new(-7);
        hp.push_multiplier(0.5);
        assert_eq!(hp.final_delta(), -3);

        let mut heal = HpDamage::new(7);
        heal.push_multiplier(0.5);
        assert_eq!(heal.final_delta(), 3);
    }

    #[test]
    fn whole_products_are_not_shaved_by_float_error() {
        for (base, factor, expected) in [(-90, 0.7, -63), (-100, 0.29, -29), (-100, 1.15, -115)] {
            let mut hp = HpDamage::new(base);
            hp.push_multiplier(factor);
            assert_eq!(hp.final_delta(), expected, "{base} x {factor}");
        }

        let mut hp = HpDamage::new(-9);
        hp.push_multiplier(0.7);
        assert_eq!(hp.final_delta(), -6);
    }

    #[test]
    fn no_multipliers_keeps_base_change() {
        assert_eq!(HpDamage::new(-10).final_delta(), -10);
        assert_eq!(HpDamage::new(0).final_delta(), 0);
    }

    #[test]
    fn move_sources_expose_tags() {
        let source = DamageSource::Move {
            name: "Slash".into(),
            tags: vec!["slash".into(), "sword".into()],
        };
        assert!(source.has_tag("sword"));
        assert!(!source.has_tag("throw"));
        assert!(!DamageSource::Effect { name: "Poisoned".into() }.has_tag("slash"));
    }
}
