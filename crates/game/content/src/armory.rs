//! Weapon definitions and the item catalog built from them.

use std::collections::BTreeMap;
use std::sync::Arc;

use battle_core::{Catalog, EffectSpec, Item, MoveOption, WeaponMove};

use crate::error::ContentError;

/// A weapon and the moves it grants.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeaponDef {
    pub name: String,
    pub moves: Vec<WeaponMove>,
}

impl WeaponDef {
    pub fn new(name: impl Into<String>, moves: Vec<WeaponMove>) -> Self {
        Self {
            name: name.into(),
            moves,
        }
    }

    /// Builds the inventory item for this weapon.
    pub fn to_item(&self) -> Item {
        let moves = self
            .moves
            .iter()
            .map(|m| Arc::new(m.clone()) as Arc<dyn MoveOption>)
            .collect();
        Item::weapon(self.name.clone(), moves)
    }
}

/// Every weapon known to the game, by name.
///
/// Doubles as the [`Catalog`] used to restore saved battles.
#[derive(Clone, Debug, Default)]
pub struct Armory {
    weapons: BTreeMap<String, WeaponDef>,
}

impl Armory {
    pub fn new(defs: Vec<WeaponDef>) -> Result<Self, ContentError> {
        let mut weapons = BTreeMap::new();
        for def in defs {
            if weapons.contains_key(&def.name) {
                return Err(ContentError::DuplicateWeapon(def.name));
            }
            weapons.insert(def.name.clone(), def);
        }
        Ok(Self { weapons })
    }

    /// The built-in "Trail of Ninjas" arsenal.
    pub fn trail_of_ninjas() -> Self {
        let defs = [
            WeaponDef::new(
                "Katana",
                vec![
                    WeaponMove::new("Slash", -8)
                        .with_tag("sword")
                        .with_tag("slash"),
                    WeaponMove::new("Guard Break", -12)
                        .with_priority(1)
                        .with_tag("sword"),
                ],
            ),
            WeaponDef::new(
                "Shuriken",
                vec![
                    WeaponMove::new("Throw", -3)
                        .with_tag("thrown")
                        .inflicting(EffectSpec::Poisoned {
                            damage: 2,
                            turns: 3,
                        }),
                ],
            ),
            WeaponDef::new(
                "Smoke Bomb",
                vec![
                    WeaponMove::new("Vanish", 0)
                        .with_priority(-1)
                        .inflicting(EffectSpec::Stunned { turns: 1 }),
                ],
            ),
        ];
        let weapons = defs
            .into_iter()
            .map(|def| (def.name.clone(), def))
            .collect();
        Self { weapons }
    }

    pub fn weapon(&self, name: &str) -> Option<&WeaponDef> {
        self.weapons.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.weapons.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }
}

impl Catalog for Armory {
    fn item(&self, name: &str) -> Option<Item> {
        self.weapon(name).map(WeaponDef::to_item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_arsenal_has_the_three_weapons() {
        let armory = Armory::trail_of_ninjas();
        assert_eq!(
            armory.names().collect::<Vec<_>>(),
            vec!["Katana", "Shuriken", "Smoke Bomb"]
        );

        let katana = armory.item("Katana").unwrap();
        let names: Vec<_> = katana.move_options().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["Slash", "Guard Break"]);
    }

    #[test]
    fn vanish_goes_before_everything_else() {
        let armory = Armory::trail_of_ninjas();
        let bomb = armory.item("Smoke Bomb").unwrap();
        assert_eq!(bomb.move_options()[0].priority(), -1);
    }

    #[test]
    fn duplicate_weapons_are_rejected() {
        let defs = vec![
            WeaponDef::new("Bo", vec![WeaponMove::new("Sweep", -4)]),
            WeaponDef::new("Bo", vec![WeaponMove::new("Thrust", -5)]),
        ];
        assert_eq!(
            Armory::new(defs).unwrap_err(),
            ContentError::DuplicateWeapon("Bo".into())
        );
    }

    #[test]
    fn unknown_items_are_not_in_the_catalog() {
        assert!(Armory::trail_of_ninjas().item("Bazooka").is_none());
    }
}
