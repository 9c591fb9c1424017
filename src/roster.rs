use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::combatant::{Combatant, CombatantSnapshot};
use crate::errors::RosterError;

pub const DEFAULT_ROSTER_CAPACITY: usize = 6;

/// The player's party, in send-out order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    members: Vec<Combatant>,
    capacity: usize,
}

impl Default for Roster {
    fn default() -> Self {
        Self::new(DEFAULT_ROSTER_CAPACITY)
    }
}

impl Roster {
    pub fn new(capacity: usize) -> Self {
        Self {
            members: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Appends a member, returning its index.
    pub fn add(&mut self, member: Combatant) -> Result<usize, RosterError> {
        if self.is_full() {
            return Err(RosterError::Full {
                capacity: self.capacity,
            });
        }
        self.members.push(member);
        Ok(self.members.len() - 1)
    }

    /// Releases a member. The last one cannot be released.
    pub fn remove(&mut self, index: usize) -> Result<Combatant, RosterError> {
        if index >= self.members.len() {
            return Err(RosterError::InvalidIndex {
                index,
                len: self.members.len(),
            });
        }
        if self.members.len() == 1 {
            return Err(RosterError::LastMember);
        }
        Ok(self.members.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&Combatant> {
        self.members.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Combatant> {
        self.members.get_mut(index)
    }

    pub fn members(&self) -> &[Combatant] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    /// Index of the first member that can still fight.
    pub fn first_alive(&self) -> Option<usize> {
        self.members.iter().position(|member| !member.is_fainted())
    }

    /// True when no member can fight, including when the roster is empty.
    pub fn all_fainted(&self) -> bool {
        self.first_alive().is_none()
    }

    pub fn revitalize_all(&mut self) {
        self.members.iter_mut().for_each(Combatant::revitalize);
    }

    /// Revitalizes the first fainted member and returns its name.
    pub fn revive_first_fainted(&mut self) -> Option<String> {
        let member = self.members.iter_mut().find(|member| member.is_fainted())?;
        member.revitalize();
        Some(member.name().to_string())
    }

    pub fn snapshot(&self) -> Vec<CombatantSnapshot> {
        self.members.iter().map(Combatant::snapshot).collect()
    }
}

impl Index<usize> for Roster {
    type Output = Combatant;

    fn index(&self, index: usize) -> &Self::Output {
        &self.members[index]
    }
}

impl IndexMut<usize> for Roster {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.members[index]
    }
}
