use battle_core::{Action, ActionKind, ActionManager, Battle, Combatant, Effect, RuleError};
use tracing::{debug, warn};

/// Yields the effects a combatant carries by virtue of its properties.
pub trait PropertySource {
    fn effects_for(&self, combatant: &Combatant) -> Vec<Box<dyn Effect>>;
}

impl<F> PropertySource for F
where
    F: Fn(&Combatant) -> Vec<Box<dyn Effect>>,
{
    fn effects_for(&self, combatant: &Combatant) -> Vec<Box<dyn Effect>> {
        self(combatant)
    }
}

/// Installs property effects on every combatant when its battle starts.
///
/// Each effect becomes an `EffectAdded` follow-up of the `BattleStart` action,
/// so other rules can still refuse it.
pub struct PropertyEffects<S> {
    source: S,
}

impl<S: PropertySource> PropertyEffects<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S: PropertySource> ActionManager for PropertyEffects<S> {
    fn name(&self) -> &'static str {
        "property_effects"
    }

    fn on_action(
        &mut self,
        action: &mut Action,
        battle: Option<&mut Battle>,
    ) -> Result<(), RuleError> {
        let ActionKind::BattleStart(start) = action.kind() else {
            return Ok(());
        };
        let Some(battle) = battle else {
            warn!(
                target: "battle_runtime::rules",
                battle = %start.battle,
                "battle start dispatched without its battle; no properties installed"
            );
            return Ok(());
        };

        let mut follow_ups = Vec::new();
        for &id in &start.combatants {
            let Some(combatant) = battle.combatant(id) else {
                continue;
            };
            for effect in self.source.effects_for(combatant) {
                debug!(
                    target: "battle_runtime::rules",
                    combatant = %id,
                    effect = effect.name(),
                    "queueing property effect"
                );
                follow_ups.push(Action::effect_added(id, effect));
            }
        }
        for follow_up in follow_ups {
            action.queue(follow_up);
        }
        Ok(())
    }
}
