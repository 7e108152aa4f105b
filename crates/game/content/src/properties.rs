//! Permanent per-combatant properties, installed when a battle starts.

use battle_core::{Combatant, DamageDirection, Effect, EffectSpec};
use tracing::warn;

/// Every combatant carrying `tag` gets `effect` for the whole battle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyRule {
    pub tag: String,
    pub effect: EffectSpec,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyTable {
    #[cfg_attr(feature = "serde", serde(default))]
    pub rules: Vec<PropertyRule>,
}

impl PropertyTable {
    /// Sword slashes hit ninjas 1.2 times as hard.
    pub fn trail_of_ninjas() -> Self {
        Self {
            rules: vec![PropertyRule {
                tag: "ninja".into(),
                effect: EffectSpec::DamageModifier {
                    name: "Light Armor".into(),
                    factor: 1.2,
                    direction: DamageDirection::Incoming,
                    tag: Some("sword".into()),
                },
            }],
        }
    }

    /// Effects to install on `combatant`, in rule order.
    ///
    /// Custom specs cannot be built here and are skipped.
    pub fn effects_for(&self, combatant: &Combatant) -> Vec<Box<dyn Effect>> {
        self.rules
            .iter()
            .filter(|rule| combatant.has_tag(&rule.tag))
            .filter_map(|rule| {
                let effect = rule.effect.build();
                if effect.is_none() {
                    warn!(
                        target: "ninja_content::properties",
                        combatant = %combatant.id(),
                        effect = rule.effect.name(),
                        "property effect cannot be built; skipped"
                    );
                }
                effect
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use battle_core::CombatantId;

    use super::*;

    #[test]
    fn only_tagged_combatants_get_properties() {
        let table = PropertyTable::trail_of_ninjas();
        let ninja = Combatant::new(CombatantId(2), "Kenji", 20).with_tag("ninja");
        let wanderer = Combatant::new(CombatantId(1), "Aiko", 20).with_tag("player");

        let effects = table.effects_for(&ninja);
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].name(), "Light Armor");
        assert!(effects[0].turns_remaining().is_none());
        assert!(table.effects_for(&wanderer).is_empty());
    }

    #[test]
    fn custom_specs_are_skipped() {
        let table = PropertyTable {
            rules: vec![PropertyRule {
                tag: "ninja".into(),
                effect: EffectSpec::Custom {
                    tag: "shadow_step".into(),
                    name: "Shadow Step".into(),
                    turns_remaining: None,
                    params: BTreeMap::new(),
                },
            }],
        };
        let ninja = Combatant::new(CombatantId(2), "Kenji", 20).with_tag("ninja");
        assert!(table.effects_for(&ninja).is_empty());
    }
}
