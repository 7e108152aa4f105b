//! Named teams of combatants, resolved against an [`Armory`].

use std::collections::BTreeSet;

use battle_core::{Combatant, CombatantId, Team};

use crate::armory::Armory;
use crate::error::ContentError;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantDef {
    pub id: u32,
    pub name: String,
    pub hp: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: Vec<String>,
    /// Weapon names, resolved through the armory.
    #[cfg_attr(feature = "serde", serde(default))]
    pub weapons: Vec<String>,
}

impl CombatantDef {
    pub fn build(&self, armory: &Armory) -> Result<Combatant, ContentError> {
        let mut combatant = Combatant::new(CombatantId(self.id), self.name.clone(), self.hp);
        for tag in &self.tags {
            combatant = combatant.with_tag(tag.clone());
        }
        for weapon in &self.weapons {
            let def = armory
                .weapon(weapon)
                .ok_or_else(|| ContentError::UnknownWeapon {
                    combatant: self.name.clone(),
                    weapon: weapon.clone(),
                })?;
            combatant = combatant.with_item(def.to_item());
        }
        Ok(combatant)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TeamDef {
    pub name: String,
    pub members: Vec<CombatantDef>,
}

/// Every team that can be sent into battle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Roster {
    pub teams: Vec<TeamDef>,
}

impl Roster {
    /// The player against a pair of Shadow Clan ninjas.
    pub fn trail_of_ninjas() -> Self {
        let member = |id, name: &str, hp, tags: &[&str], weapons: &[&str]| CombatantDef {
            id,
            name: name.to_owned(),
            hp,
            tags: tags.iter().map(|t| (*t).to_owned()).collect(),
            weapons: weapons.iter().map(|w| (*w).to_owned()).collect(),
        };
        Self {
            teams: vec![
                TeamDef {
                    name: "Wanderers".into(),
                    members: vec![member(
                        1,
                        "Aiko",
                        40,
                        &["player"],
                        &["Katana", "Smoke Bomb"],
                    )],
                },
                TeamDef {
                    name: "Shadow Clan".into(),
                    members: vec![
                        member(2, "Kenji", 24, &["ninja"], &["Shuriken"]),
                        member(3, "Ren", 20, &["ninja"], &["Katana"]),
                    ],
                },
            ],
        }
    }

    pub fn team(&self, name: &str) -> Option<&TeamDef> {
        self.teams.iter().find(|t| t.name == name)
    }

    /// Builds the named teams, in order.
    ///
    /// Combatant ids must be unique across the whole roster.
    pub fn build_teams(&self, names: &[&str], armory: &Armory) -> Result<Vec<Team>, ContentError> {
        self.check_unique_ids()?;

        names
            .iter()
            .map(|name| {
                let def = self
                    .team(name)
                    .ok_or_else(|| ContentError::UnknownTeam((*name).to_owned()))?;
                let members = def
                    .members
                    .iter()
                    .map(|m| m.build(armory))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Team::new(def.name.clone(), members))
            })
            .collect()
    }

    fn check_unique_ids(&self) -> Result<(), ContentError> {
        let mut seen = BTreeSet::new();
        for member in self.teams.iter().flat_map(|t| &t.members) {
            if !seen.insert(member.id) {
                return Err(ContentError::DuplicateCombatant(CombatantId(member.id)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_teams_in_requested_order() {
        let roster = Roster::trail_of_ninjas();
        let teams = roster
            .build_teams(&["Shadow Clan", "Wanderers"], &Armory::trail_of_ninjas())
            .unwrap();

        assert_eq!(teams[0].name(), "Shadow Clan");
        assert_eq!(teams[0].members().len(), 2);
        assert!(teams[0].members()[0].has_tag("ninja"));
        assert_eq!(teams[1].members()[0].items().len(), 2);
    }

    #[test]
    fn unknown_weapon_names_the_carrier() {
        let mut roster = Roster::trail_of_ninjas();
        roster.teams[0].members[0].weapons.push("Nunchaku".into());

        let error = roster
            .build_teams(&["Wanderers"], &Armory::trail_of_ninjas())
            .unwrap_err();
        assert_eq!(
            error,
            ContentError::UnknownWeapon {
                combatant: "Aiko".into(),
                weapon: "Nunchaku".into(),
            }
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut roster = Roster::trail_of_ninjas();
        roster.teams[1].members[1].id = 1;

        assert_eq!(
            roster
                .build_teams(&["Wanderers"], &Armory::trail_of_ninjas())
                .unwrap_err(),
            ContentError::DuplicateCombatant(CombatantId(1))
        );
    }

    #[test]
    fn unknown_team() {
        assert_eq!(
            Roster::default()
                .build_teams(&["Ronin"], &Armory::default())
                .unwrap_err(),
            ContentError::UnknownTeam("Ronin".into())
        );
    }
}
