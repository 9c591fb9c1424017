//! Runtime configuration loaded from the environment.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::inventory::DEFAULT_INVENTORY_CAPACITY;
use crate::roster::DEFAULT_ROSTER_CAPACITY;

/// Delay after each narrated step so a reader can follow the battle.
pub const DEFAULT_PACING: Duration = Duration::from_millis(1000);

pub const DEFAULT_SAVE_DIR: &str = "saves";

pub const DEFAULT_PLAYER_NAME: &str = "Trainer";

/// Settings a single battle needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BattleConfig {
    /// Pause after narrated steps. Zero disables pausing.
    pub pacing: Duration,
    /// Fixed RNG seed; OS-seeded when absent.
    pub seed: Option<u64>,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            pacing: DEFAULT_PACING,
            seed: None,
        }
    }
}

impl BattleConfig {
    /// No pauses, for tests and headless runs.
    pub fn instant() -> Self {
        Self {
            pacing: Duration::ZERO,
            seed: None,
        }
    }
}

/// Settings for a whole game session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameConfig {
    pub battle: BattleConfig,
    /// Name given to a new profile.
    pub player_name: String,
    /// Directory with replacement data tables; built-in tables when absent.
    pub data_dir: Option<PathBuf>,
    pub save_dir: PathBuf,
    pub inventory_capacity: usize,
    pub roster_capacity: usize,
    /// RON file overriding narration templates.
    pub messages_path: Option<PathBuf>,
    /// Print every notification as a JSON line instead of plain text.
    pub json_events: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            battle: BattleConfig::default(),
            player_name: DEFAULT_PLAYER_NAME.to_string(),
            data_dir: None,
            save_dir: PathBuf::from(DEFAULT_SAVE_DIR),
            inventory_capacity: DEFAULT_INVENTORY_CAPACITY,
            roster_capacity: DEFAULT_ROSTER_CAPACITY,
            messages_path: None,
            json_events: false,
        }
    }
}

impl GameConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `ARENA_PACING_MS` - Pause after narrated steps (default: 1000)
    /// - `ARENA_SEED` - Fixed RNG seed (default: OS-seeded)
    /// - `ARENA_PLAYER` - Name for a new profile (default: `Trainer`)
    /// - `ARENA_DATA_DIR` - Directory holding replacement data tables
    /// - `ARENA_SAVE_DIR` - Directory for save files (default: `saves`)
    /// - `ARENA_INVENTORY_CAPACITY` - Bag size (default: 10)
    /// - `ARENA_ROSTER_CAPACITY` - Party size (default: 6)
    /// - `ARENA_MESSAGES` - RON file overriding narration templates
    /// - `ARENA_JSON_EVENTS` - Print notifications as JSON lines (default: false)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(millis) = read_env::<u64>("ARENA_PACING_MS") {
            config.battle.pacing = Duration::from_millis(millis);
        }
        config.battle.seed = read_env::<u64>("ARENA_SEED");

        if let Ok(name) = env::var("ARENA_PLAYER") {
            config.player_name = name;
        }
        config.data_dir = env::var("ARENA_DATA_DIR").ok().map(PathBuf::from);
        if let Ok(dir) = env::var("ARENA_SAVE_DIR") {
            config.save_dir = PathBuf::from(dir);
        }

        if let Some(capacity) = read_env::<usize>("ARENA_INVENTORY_CAPACITY") {
            config.inventory_capacity = capacity.max(1);
        }
        if let Some(capacity) = read_env::<usize>("ARENA_ROSTER_CAPACITY") {
            config.roster_capacity = capacity.max(1);
        }

        config.messages_path = env::var("ARENA_MESSAGES").ok().map(PathBuf::from);

        if let Some(enable) = read_env::<bool>("ARENA_JSON_EVENTS") {
            config.json_events = enable;
        } else if env::var("ARENA_JSON_EVENTS").is_ok() {
            // Also accept just setting the variable without value as "true"
            config.json_events = true;
        }

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
