use std::fmt;
use std::sync::Arc;

use crate::moves::MoveOption;

/// Stable identifier of a combatant across turns (and across battles).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantId(pub u32);

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something a combatant carries. Weapons are items that expose move options.
#[derive(Clone, Debug)]
pub struct Item {
    name: String,
    moves: Vec<Arc<dyn MoveOption>>,
}

impl Item {
    /// An item without any move options.
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            moves: Vec::new(),
        }
    }

    /// A weapon exposing the given move options.
    pub fn weapon(name: impl Into<String>, moves: Vec<Arc<dyn MoveOption>>) -> Self {
        Self {
            name: name.into(),
            moves,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_weapon(&self) -> bool {
        !self.moves.is_empty()
    }

    pub fn move_options(&self) -> &[Arc<dyn MoveOption>] {
        &self.moves
    }
}

/// A participant in a battle.
///
/// Invariant: `0 <= hp <= max_hp`. A combatant with `hp == 0` is fainted.
#[derive(Clone, Debug)]
pub struct Combatant {
    id: CombatantId,
    name: String,
    hp: u32,
    max_hp: u32,
    items: Vec<Item>,
    tags: Vec<String>,
}

impl Combatant {
    /// Creates a combatant at full health.
    pub fn new(id: CombatantId, name: impl Into<String>, max_hp: u32) -> Self {
        Self {
            id,
            name: name.into(),
            hp: max_hp,
            max_hp,
            items: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Sets current HP, clamped to `max_hp` (builder pattern).
    #[must_use]
    pub fn with_hp(mut self, hp: u32) -> Self {
        self.hp = hp.min(self.max_hp);
        self
    }

    /// Adds an item to the inventory (builder pattern).
    #[must_use]
    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    /// Adds a descriptive tag such as `"ninja"` (builder pattern).
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn id(&self) -> CombatantId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hp(&self) -> u32 {
        self.hp
    }

    pub fn max_hp(&self) -> u32 {
        self.max_hp
    }

    pub fn is_fainted(&self) -> bool {
        self.hp == 0
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Union of the move options of every weapon carried, in inventory order.
    ///
    /// May be empty; the battle substitutes its fallback move in that case.
    pub fn move_options(&self) -> Vec<Arc<dyn MoveOption>> {
        self.items
            .iter()
            .flat_map(|item| item.move_options().iter().cloned())
            .collect()
    }

    /// Applies a signed HP delta, clamping into `0..=max_hp`.
    ///
    /// Returns the HP before the change.
    pub(crate) fn apply_hp_delta(&mut self, delta: i64) -> u32 {
        let before = self.hp;
        let after = (before as i64 + delta).clamp(0, self.max_hp as i64);
        self.hp = after as u32;
        before
    }
}

impl fmt::Display for Combatant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
