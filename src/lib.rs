// In: src/lib.rs

//! Creature Arena Battle Engine
//!
//! A turn-based battle system between a player's party and a wild creature.
//! Creatures, moves and items come from editable RON tables; the engine runs
//! each battle on its own task and reports every state change on typed
//! notification channels, so any front end can render it.

// --- MODULE DECLARATIONS ---
pub mod ability;
pub mod battle;
pub mod combatant;
pub mod config;
pub mod data;
pub mod errors;
pub mod game;
pub mod inventory;
pub mod item;
pub mod player;
pub mod roster;
pub mod save;
pub mod stats;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
// Shared enums used by the tables and on the notification channels.
pub use schema::{
    BattlePhase, ItemEffectKind, MoveCategory, MoveTarget, PolicyKind, Side, StatKind,
    TrainerAbility,
};

// --- From this crate's modules (`src/`) ---

// The battle engine and its surfaces.
pub use battle::action::{ActionToken, RUN_COMMAND};
pub use battle::engine::{BattleEngine, BattleReport, FinishedBattle};
pub use battle::events::{Channel, Listener, ListenerId, Notification, NotificationBus, NotificationLog};
pub use battle::input::PlayerInput;
pub use battle::narration::Narration;
pub use battle::state::TurnRng;

// Runtime types for a battle.
pub use ability::{Ability, AbilityBook, MoveOutcome};
pub use combatant::{Combatant, CombatantSnapshot, Decision, StatSnapshot};
pub use inventory::{Inventory, InventorySnapshot};
pub use item::{Item, ItemOutcome};
pub use player::Player;
pub use roster::Roster;
pub use stats::{Attributes, StatBlock};

// Data access, configuration and the game layer.
pub use config::{BattleConfig, GameConfig};
pub use data::{DataProvider, Record};
pub use game::{BattleHandle, GameSession};
pub use save::SaveStore;

// Crate-specific error and result types.
pub use errors::{
    BattleError, BattleResult, DataError, DataResult, GameError, GameResult, InventoryError,
    RosterError, SaveError,
};
