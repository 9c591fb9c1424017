use std::fmt;

use serde::{Deserialize, Serialize};

/// The move name a controlled combatant sends to flee.
pub const RUN_COMMAND: &str = "Run";

/// One combatant's choice for its turn.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum ActionToken {
    Attack { move_id: String },
    // Index into the player's inventory.
    UseItem { index: usize },
    // Index into the player's roster.
    Switch { roster_index: usize },
    Flee,
}

impl ActionToken {
    /// Builds the token a move selection stands for. Selecting the run
    /// command flees instead of attacking.
    pub fn from_move(move_id: impl Into<String>) -> Self {
        let move_id = move_id.into();
        if move_id == RUN_COMMAND {
            ActionToken::Flee
        } else {
            ActionToken::Attack { move_id }
        }
    }

    /// Only the player's side may do anything other than attack.
    pub fn is_player_only(&self) -> bool {
        !matches!(self, ActionToken::Attack { .. })
    }
}

impl fmt::Display for ActionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionToken::Attack { move_id } => write!(f, "attack with {}", move_id),
            ActionToken::UseItem { index } => write!(f, "use item #{}", index),
            ActionToken::Switch { roster_index } => write!(f, "switch to #{}", roster_index),
            ActionToken::Flee => write!(f, "flee"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_run_command_means_flee() {
        assert_eq!(ActionToken::from_move("Run"), ActionToken::Flee);
        assert_eq!(
            ActionToken::from_move("Tackle"),
            ActionToken::Attack {
                move_id: "Tackle".to_string()
            }
        );
        assert!(ActionToken::Flee.is_player_only());
        assert!(!ActionToken::from_move("Tackle").is_player_only());
    }
}
