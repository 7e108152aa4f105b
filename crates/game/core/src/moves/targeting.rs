//! Targeting rules for move options.
//!
//! Every candidate target falls in one category relative to the user:
//! - User: the user itself
//! - Teammate: same team, not the user
//! - Enemy: any other team
//!
//! A [`TargetingOption`] assigns each category a [`Recommendation`] and caps
//! the number of targets a move may hit.

use std::collections::BTreeSet;

use crate::engine::Battle;
use crate::error::SelectionError;
use crate::state::CombatantId;

// ============================================================================
// Categories
// ============================================================================

/// Relationship between a move's user and one candidate target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum TargetCategory {
    User,
    Teammate,
    Enemy,
}

/// How a move option feels about a target category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Recommendation {
    /// Picked automatically by random choosers.
    Recommended,
    /// Allowed when chosen explicitly.
    NotRecommended,
    /// Never allowed.
    #[default]
    Disallowed,
}

// ============================================================================
// Targeting Option
// ============================================================================

/// Which targets a move may hit, and how many.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetingOption {
    pub user: Recommendation,
    pub teammates: Recommendation,
    pub enemies: Recommendation,
    pub total_number: usize,
}

impl TargetingOption {
    pub const fn new(
        user: Recommendation,
        teammates: Recommendation,
        enemies: Recommendation,
        total_number: usize,
    ) -> Self {
        Self {
            user,
            teammates,
            enemies,
            total_number,
        }
    }

    /// One enemy; teammates only when chosen explicitly.
    pub const fn single_enemy() -> Self {
        Self::new(
            Recommendation::Disallowed,
            Recommendation::NotRecommended,
            Recommendation::Recommended,
            1,
        )
    }

    /// Up to `count` enemies.
    pub const fn enemies(count: usize) -> Self {
        Self::new(
            Recommendation::Disallowed,
            Recommendation::Disallowed,
            Recommendation::Recommended,
            count,
        )
    }

    /// The user only.
    pub const fn self_only() -> Self {
        Self::new(
            Recommendation::Recommended,
            Recommendation::Disallowed,
            Recommendation::Disallowed,
            1,
        )
    }

    /// One teammate, or the user when chosen explicitly.
    pub const fn single_ally() -> Self {
        Self::new(
            Recommendation::NotRecommended,
            Recommendation::Recommended,
            Recommendation::Disallowed,
            1,
        )
    }

    pub fn recommendation(&self, category: TargetCategory) -> Recommendation {
        match category {
            TargetCategory::User => self.user,
            TargetCategory::Teammate => self.teammates,
            TargetCategory::Enemy => self.enemies,
        }
    }

    /// Checks an explicit target set against this option.
    pub fn validate(
        &self,
        battle: &Battle,
        user: CombatantId,
        targets: &[CombatantId],
    ) -> Result<(), SelectionError> {
        if targets.is_empty() {
            return Err(SelectionError::NoTargets);
        }
        if targets.len() > self.total_number {
            return Err(SelectionError::TooManyTargets {
                max: self.total_number,
                got: targets.len(),
            });
        }

        let mut seen = BTreeSet::new();
        for &target in targets {
            if !seen.insert(target) {
                return Err(SelectionError::DuplicateTarget(target));
            }
            let category = battle
                .category_of(user, target)
                .ok_or(SelectionError::UnknownCombatant(target))?;
            if self.recommendation(category) == Recommendation::Disallowed {
                return Err(SelectionError::Disallowed {
                    target,
                    category: category.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Targets in a recommended category, in battle order, capped at
    /// `total_number`.
    ///
    /// Standing combatants are preferred; fainted ones are only returned when
    /// nobody in a recommended category is left standing.
    pub fn get_recommended_targets(&self, battle: &Battle, user: CombatantId) -> Vec<CombatantId> {
        let recommended: Vec<_> = battle
            .combatants()
            .filter(|c| {
                battle
                    .category_of(user, c.id())
                    .is_some_and(|cat| self.recommendation(cat) == Recommendation::Recommended)
            })
            .collect();

        let standing: Vec<_> = recommended
            .iter()
            .filter(|c| !c.is_fainted())
            .map(|c| c.id())
            .collect();

        let mut targets = if standing.is_empty() {
            recommended.iter().map(|c| c.id()).collect()
        } else {
            standing
        };
        targets.truncate(self.total_number);
        targets
    }
}

impl Default for TargetingOption {
    fn default() -> Self {
        Self::single_enemy()
    }
}
