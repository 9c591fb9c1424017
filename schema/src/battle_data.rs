use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumIter, EnumString};

/// Published on the battle-state channel. `Start` opens a battle, the other
/// three are conclusions.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum BattlePhase {
    Start,
    Victory,
    Defeat,
    Draw,
}

impl BattlePhase {
    pub fn is_conclusion(self) -> bool {
        !matches!(self, BattlePhase::Start)
    }
}

/// Which half of the battlefield a per-side notification refers to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Player,
    Opponent,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Player => Side::Opponent,
            Side::Opponent => Side::Player,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Side::Player => "player",
            Side::Opponent => "opponent",
        };
        write!(f, "{}", label)
    }
}

/// Decision strategies available to autonomous combatants.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum PolicyKind {
    /// Any affordable move, uniformly.
    Random,
    /// The move with the highest expected damage.
    Reckless,
    /// Heal when hurt, otherwise the cheapest reliable damage.
    Attrition,
}

/// Perks a trainer can unlock on the overworld.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum TrainerAbility {
    Climber,
    Swimmer,
    Rich,
}
