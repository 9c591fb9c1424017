use thiserror::Error;

/// Errors raised while loading or querying the static data tables.
///
/// These indicate inconsistent data files. The surrounding game cannot
/// reasonably continue with them, so callers treat them as fatal.
#[derive(Debug, Error)]
pub enum DataError {
    /// The specified creature was not found in the table
    #[error("creature not found: {0}")]
    UnknownCreature(String),
    /// The specified move was not found in the table
    #[error("move not found: {0}")]
    UnknownMove(String),
    /// The specified item was not found in the table
    #[error("item not found: {0}")]
    UnknownItem(String),
    /// A row lacks a column every row of its table needs
    #[error("{table} row '{row}' is missing field '{field}'")]
    MissingField {
        table: &'static str,
        row: String,
        field: &'static str,
    },
    /// A column holds a value that cannot be interpreted
    #[error("{table} row '{row}' has malformed field '{field}': {value}")]
    MalformedField {
        table: &'static str,
        row: String,
        field: &'static str,
        value: String,
    },
    #[error("failed to parse {file}")]
    Parse {
        file: String,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("failed to read {file}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to the player's bag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("inventory is full ({capacity} items)")]
    Full { capacity: usize },
    #[error("no item at index {index} (inventory holds {len})")]
    InvalidIndex { index: usize, len: usize },
}

/// Errors related to the player's party.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("roster is full ({capacity} members)")]
    Full { capacity: usize },
    #[error("no roster member at index {index} (roster holds {len})")]
    InvalidIndex { index: usize, len: usize },
    #[error("cannot remove the last roster member")]
    LastMember,
}

/// Errors that halt a battle.
///
/// None of these are player-facing outcomes: running out of MP or missing an
/// attack are narrated, not raised. Everything here is a programmer or data
/// error surfaced to the developer.
#[derive(Debug, Error)]
pub enum BattleError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("the player has no conscious roster member to send out")]
    NoConsciousMember,

    #[error("{actor} does not know the move '{move_id}'")]
    MoveNotKnown { actor: String, move_id: String },

    #[error("invalid item index {index} (inventory holds {len})")]
    InvalidItemIndex { index: usize, len: usize },

    #[error("invalid switch target {index}: {reason}")]
    InvalidSwitchTarget { index: usize, reason: &'static str },

    #[error("{actor} chose an action only the player may take: {action}")]
    ActionNotAllowed { actor: String, action: String },

    #[error("player input channel closed while awaiting an action")]
    InputClosed,

    #[error(transparent)]
    Roster(#[from] RosterError),
}

/// Errors raised by the save store.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save file i/o failed for {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("save data could not be encoded or decoded")]
    Codec(#[from] postcard::Error),
}

/// Errors surfaced by the game-state layer around battles.
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error(transparent)]
    Battle(#[from] BattleError),

    #[error("no game in progress; start a new game or continue a saved one")]
    NoActiveGame,

    #[error("a battle is already in progress")]
    BattleInProgress,

    #[error("battle task failed")]
    TaskFailed(#[from] tokio::task::JoinError),
}

/// Type alias for Results using BattleError
pub type BattleResult<T> = Result<T, BattleError>;

/// Type alias for Results using DataError
pub type DataResult<T> = Result<T, DataError>;

pub type GameResult<T> = Result<T, GameError>;
