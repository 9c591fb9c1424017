use schema::TrainerAbility;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::combatant::Decision;
use crate::data::DataProvider;
use crate::errors::GameResult;
use crate::inventory::{Inventory, DEFAULT_INVENTORY_CAPACITY};
use crate::roster::{Roster, DEFAULT_ROSTER_CAPACITY};

/// Coins granted on top of the purse when a trainer starts out rich.
pub const RICH_STARTING_COINS: u32 = 1000;

/// The player's persistent profile: party, bag and trainer perks.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Player {
    pub name: String,
    pub roster: Roster,
    pub inventory: Inventory,
    pub abilities: Vec<TrainerAbility>,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_capacities(name, DEFAULT_ROSTER_CAPACITY, DEFAULT_INVENTORY_CAPACITY)
    }

    pub fn with_capacities(name: impl Into<String>, roster: usize, inventory: usize) -> Self {
        Self {
            name: name.into(),
            roster: Roster::new(roster),
            inventory: Inventory::new(inventory),
            abilities: Vec::new(),
        }
    }

    pub fn has_ability(&self, ability: TrainerAbility) -> bool {
        self.abilities.contains(&ability)
    }

    /// Learns a perk. `Rich` pays out its coins once, on first learning.
    pub fn add_ability(&mut self, ability: TrainerAbility) {
        if self.has_ability(ability) {
            return;
        }
        self.abilities.push(ability);
        if ability == TrainerAbility::Rich {
            self.inventory.add_coins(RICH_STARTING_COINS);
        }
    }

    /// Adds the starting creature and the trainer perk chosen with it.
    pub fn add_starter(
        &mut self,
        data: &DataProvider,
        creature: &str,
        perk: TrainerAbility,
    ) -> GameResult<()> {
        let starter = data.spawn_creature(creature, Decision::Controlled)?;
        self.roster.add(starter)?;
        self.add_ability(perk);
        info!(player = %self.name, %creature, %perk, "starter chosen");
        Ok(())
    }
}
