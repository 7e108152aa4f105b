use std::fmt;

use super::{Combatant, CombatantId};

/// Position of a team in its battle's team list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TeamId(pub usize);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team {}", self.0)
    }
}

/// An ordered group of allied combatants.
///
/// Membership is fixed for the lifetime of a battle.
#[derive(Clone, Debug)]
pub struct Team {
    name: String,
    members: Vec<Combatant>,
}

impl Team {
    pub fn new(name: impl Into<String>, members: Vec<Combatant>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[Combatant] {
        &self.members
    }

    pub fn contains(&self, id: CombatantId) -> bool {
        self.members.iter().any(|m| m.id() == id)
    }

    pub fn member(&self, id: CombatantId) -> Option<&Combatant> {
        self.members.iter().find(|m| m.id() == id)
    }

    pub(crate) fn member_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.members.iter_mut().find(|m| m.id() == id)
    }

    /// A team is dead once every member has fainted.
    pub fn is_dead(&self) -> bool {
        self.members.iter().all(Combatant::is_fainted)
    }

    pub fn alive_count(&self) -> usize {
        self.members.iter().filter(|m| !m.is_fainted()).count()
    }
}
