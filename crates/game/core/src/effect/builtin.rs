//! Built-in effects.

use super::{Duration, Effect, EffectContext, EffectSpec, HookResult};
use crate::action::{Damage, DamageAction, Verdict};
use crate::moves::{Move, MoveOption};
use crate::state::{Combatant, CombatantId};

/// Which side of a damage a [`DamageModifier`] applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DamageDirection {
    /// Weapon damage the owner receives.
    Incoming,
    /// Weapon damage the owner deals.
    Outgoing,
}

/// Property that multiplies matching weapon HP damage by `factor`.
///
/// With a `tag`, only moves carrying that tag are affected.
#[derive(Clone, Debug, PartialEq)]
pub struct DamageModifier {
    name: String,
    factor: f64,
    direction: DamageDirection,
    tag: Option<String>,
}

impl DamageModifier {
    pub fn new(
        name: impl Into<String>,
        factor: f64,
        direction: DamageDirection,
        tag: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            factor,
            direction,
            tag,
        }
    }

    fn applies_to(&self, owner: CombatantId, damage: &DamageAction) -> bool {
        let side = match self.direction {
            DamageDirection::Incoming => damage.cause.target == owner,
            DamageDirection::Outgoing => damage.cause.damager == Some(owner),
        };
        side && self
            .tag
            .as_deref()
            .is_none_or(|tag| damage.cause.source.has_tag(tag))
    }
}

impl Effect for DamageModifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_damage(&mut self, owner: CombatantId, damage: &mut DamageAction) -> HookResult {
        if !self.applies_to(owner, damage) {
            return Ok(Vec::new());
        }
        if let Damage::WeaponHp(hp) = &mut damage.damage {
            hp.push_multiplier(self.factor);
        }
        Ok(Vec::new())
    }

    fn spec(&self) -> EffectSpec {
        EffectSpec::DamageModifier {
            name: self.name.clone(),
            factor: self.factor,
            direction: self.direction,
            tag: self.tag.clone(),
        }
    }
}

/// Loses `damage` HP after every turn while it lasts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Poisoned {
    damage: u32,
    duration: Duration,
}

impl Poisoned {
    pub const NAME: &'static str = "Poisoned";

    pub fn new(damage: u32, turns: u32) -> Self {
        Self {
            damage,
            duration: Duration::turns(turns),
        }
    }
}

impl Effect for Poisoned {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn duration(&self) -> Option<&Duration> {
        Some(&self.duration)
    }

    fn duration_mut(&mut self) -> Option<&mut Duration> {
        Some(&mut self.duration)
    }

    fn after_turn(&mut self, ctx: &mut EffectContext<'_>, _mv: &Move) -> HookResult {
        if ctx.owner().is_none_or(Combatant::is_fainted) {
            return Ok(Vec::new());
        }
        let hp_change = -i32::try_from(self.damage).unwrap_or(i32::MAX);
        let damage = DamageAction::effect_hp(ctx.owner, Self::NAME, hp_change);
        Ok(ctx.dispatch(damage.into_action())?.parts)
    }

    fn spec(&self) -> EffectSpec {
        EffectSpec::Poisoned {
            damage: self.damage,
            turns: self.duration.remaining(),
        }
    }
}

/// Keeps the owner from moving while it lasts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stunned {
    duration: Duration,
}

impl Stunned {
    pub const NAME: &'static str = "Stunned";

    pub fn new(turns: u32) -> Self {
        Self {
            duration: Duration::turns(turns),
        }
    }
}

impl Effect for Stunned {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn duration(&self) -> Option<&Duration> {
        Some(&self.duration)
    }

    fn duration_mut(&mut self) -> Option<&mut Duration> {
        Some(&mut self.duration)
    }

    fn can_move(&self, owner: &Combatant, _mv: &Move) -> Verdict {
        Verdict::veto(format!("{owner} is stunned"))
    }

    fn spec(&self) -> EffectSpec {
        EffectSpec::Stunned {
            turns: self.duration.remaining(),
        }
    }
}

/// Forbids choosing one named move option while it lasts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sealed {
    option: String,
    duration: Duration,
}

impl Sealed {
    pub const NAME: &'static str = "Sealed";

    pub fn new(option: impl Into<String>, turns: u32) -> Self {
        Self {
            option: option.into(),
            duration: Duration::turns(turns),
        }
    }
}

impl Effect for Sealed {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn duration(&self) -> Option<&Duration> {
        Some(&self.duration)
    }

    fn duration_mut(&mut self) -> Option<&mut Duration> {
        Some(&mut self.duration)
    }

    fn can_choose(
        &self,
        _owner: &Combatant,
        option: &dyn MoveOption,
        _targets: &[CombatantId],
    ) -> Verdict {
        if option.name() == self.option {
            Verdict::veto(format!("{} is sealed", self.option))
        } else {
            Verdict::Allow
        }
    }

    fn spec(&self) -> EffectSpec {
        EffectSpec::Sealed {
            option: self.option.clone(),
            turns: self.duration.remaining(),
        }
    }
}
