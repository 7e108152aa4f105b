use super::{Move, MoveContext, MoveOption, MovePerformance, TargetingOption};
use crate::action::{Damage, DamageAction, DamageCause, DamageSource};
use crate::effect::EffectSpec;
use crate::error::MoveError;
use crate::state::{Combatant, CombatantId};

/// Data-driven move: HP damage to every target, then optional effects.
///
/// A zero `hp_change` with inflicted effects skips the HP step entirely; a
/// zero `hp_change` without effects still hits (and reports an unchanged HP).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeaponMove {
    name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    priority: i32,
    hp_change: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    tags: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    targeting: TargetingOption,
    #[cfg_attr(feature = "serde", serde(default))]
    inflicts: Vec<EffectSpec>,
}

impl WeaponMove {
    /// A single-enemy move changing HP by `hp_change` (negative hurts).
    pub fn new(name: impl Into<String>, hp_change: i32) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            hp_change,
            tags: Vec::new(),
            targeting: TargetingOption::single_enemy(),
            inflicts: Vec::new(),
        }
    }

    /// The zero-damage fallback used when a combatant has no move options.
    pub fn struggle(name: impl Into<String>) -> Self {
        Self::new(name, 0).with_tag("struggle")
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn with_targeting(mut self, targeting: TargetingOption) -> Self {
        self.targeting = targeting;
        self
    }

    #[must_use]
    pub fn inflicting(mut self, spec: EffectSpec) -> Self {
        self.inflicts.push(spec);
        self
    }

    pub fn hp_change(&self) -> i32 {
        self.hp_change
    }

    pub fn inflicts(&self) -> &[EffectSpec] {
        &self.inflicts
    }

    fn cause(&self, mv: &Move, target: CombatantId) -> DamageCause {
        DamageCause {
            damager: Some(mv.user()),
            target,
            source: DamageSource::Move {
                name: self.name.clone(),
                tags: self.tags.clone(),
            },
        }
    }
}

impl MoveOption for WeaponMove {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn targeting_option(&self, _user: &Combatant) -> TargetingOption {
        self.targeting.clone()
    }

    fn perform(
        &self,
        mv: &Move,
        ctx: &mut MoveContext<'_>,
        performance: &mut MovePerformance,
    ) -> Result<(), MoveError> {
        let hits_hp = self.hp_change != 0 || self.inflicts.is_empty();

        for &target in mv.targets() {
            let mut landed = true;

            if hits_hp {
                let damage = DamageAction::weapon_hp(self.cause(mv, target), self.hp_change);
                let dispatched = ctx.dispatch(damage.into_action())?;
                landed = dispatched.committed();
                performance.parts.extend(dispatched.parts);
            }

            if landed {
                for spec in &self.inflicts {
                    let effect = spec
                        .build()
                        .ok_or_else(|| MoveError::UnbuildableEffect(spec.name().to_owned()))?;
                    let action = DamageAction::new(
                        self.cause(mv, target),
                        Damage::WeaponEffectAdd(Some(effect)),
                    )
                    .into_action();
                    let dispatched = ctx.dispatch(action)?;
                    landed &= dispatched.committed();
                    performance.parts.extend(dispatched.parts);
                }
            }

            ctx.battle.record_hit(target, mv.user(), landed);
            performance.goal_reached |= landed;
        }

        Ok(())
    }
}
