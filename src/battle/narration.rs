//! Player-facing battle text.
//!
//! Every line the engine publishes comes from a template here. Templates use
//! `{name}`, `{move}`, `{amount}`, `{item}`, `{stat}` and `{coins}`
//! placeholders and can be replaced from a RON file; missing entries keep
//! their English defaults.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ability::MoveOutcome;
use crate::errors::{DataError, DataResult};
use crate::item::ItemOutcome;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Narration {
    pub battle_start: String,
    pub turn_start: String,
    pub attack: String,
    pub lack_of_mp: String,
    pub damage: String,
    pub heal: String,
    pub boost: String,
    pub miss: String,
    pub fainted: String,
    pub switch: String,
    pub item: String,
    pub revive: String,
    pub no_effect: String,
    pub capture: String,
    pub capture_failed: String,
    pub run: String,
    pub victory: String,
    pub all_fainted: String,
    pub defeat: String,
    pub loot: String,
    pub loot_coins_only: String,
    pub loot_no_room: String,
    /// Display names for move ids, when they differ.
    pub move_names: HashMap<String, String>,
}

impl Default for Narration {
    fn default() -> Self {
        Self {
            battle_start: "A wild {name} appeared!".to_string(),
            turn_start: "What will {name} do?".to_string(),
            attack: "{name} used {move}!".to_string(),
            lack_of_mp: "{name} doesn't have enough MP!".to_string(),
            damage: "{name} dealt {amount} damage!".to_string(),
            heal: "{name} restored {amount} HP!".to_string(),
            boost: "{name}'s {stat} changed by {amount}!".to_string(),
            miss: "{name}'s attack missed!".to_string(),
            fainted: "{name} fainted!".to_string(),
            switch: "Go, {name}!".to_string(),
            item: "You used a {item}!".to_string(),
            revive: "{name} was revitalized!".to_string(),
            no_effect: "But nothing happened.".to_string(),
            capture: "Gotcha! {name} was captured!".to_string(),
            capture_failed: "{name} broke free!".to_string(),
            run: "Got away safely!".to_string(),
            victory: "You won the battle!".to_string(),
            all_fainted: "All of your creatures have fainted!".to_string(),
            defeat: "You lost the battle...".to_string(),
            loot: "{name} dropped a {item} and {coins} coins!".to_string(),
            loot_coins_only: "{name} dropped {coins} coins!".to_string(),
            loot_no_room: "Your bag is full, so the {item} was left behind.".to_string(),
            move_names: HashMap::new(),
        }
    }
}

/// Replaces each `{key}` in `template` with its value.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |text, (key, value)| {
            text.replace(&format!("{{{}}}", key), value)
        })
}

impl Narration {
    /// Loads overrides from a RON map of template name to text.
    pub fn load(path: &Path) -> DataResult<Self> {
        let file = path.display().to_string();
        let source = fs::read_to_string(path).map_err(|source| DataError::Io {
            file: file.clone(),
            source,
        })?;
        ron::from_str(&source).map_err(|source| DataError::Parse { file, source })
    }

    pub fn move_name<'a>(&'a self, move_id: &'a str) -> &'a str {
        self.move_names
            .get(move_id)
            .map(String::as_str)
            .unwrap_or(move_id)
    }

    pub fn battle_start(&self, opponent: &str) -> String {
        fill(&self.battle_start, &[("name", opponent)])
    }

    pub fn turn_start(&self, actor: &str) -> String {
        fill(&self.turn_start, &[("name", actor)])
    }

    pub fn attack(&self, actor: &str, move_id: &str) -> String {
        fill(&self.attack, &[("name", actor), ("move", self.move_name(move_id))])
    }

    /// The line describing a resolved move.
    pub fn move_outcome(&self, actor: &str, outcome: &MoveOutcome) -> String {
        match outcome {
            MoveOutcome::InsufficientMp => fill(&self.lack_of_mp, &[("name", actor)]),
            MoveOutcome::Missed => fill(&self.miss, &[("name", actor)]),
            MoveOutcome::Damaged(amount) => {
                fill(&self.damage, &[("name", actor), ("amount", amount.to_string().as_str())])
            }
            MoveOutcome::Healed(amount) => {
                fill(&self.heal, &[("name", actor), ("amount", amount.to_string().as_str())])
            }
            MoveOutcome::Boosted { stat, amount } => fill(
                &self.boost,
                &[("name", actor), ("stat", stat.as_str()), ("amount", amount.to_string().as_str())],
            ),
        }
    }

    pub fn fainted(&self, name: &str) -> String {
        fill(&self.fainted, &[("name", name)])
    }

    pub fn switch(&self, name: &str) -> String {
        fill(&self.switch, &[("name", name)])
    }

    pub fn item(&self, item: &str) -> String {
        fill(&self.item, &[("item", item)])
    }

    /// The line describing an item's effect. `active` is the player's
    /// creature and `enemy` the opponent.
    pub fn item_outcome(&self, active: &str, enemy: &str, outcome: &ItemOutcome) -> String {
        match outcome {
            ItemOutcome::Healed(amount) => {
                fill(&self.heal, &[("name", active), ("amount", amount.to_string().as_str())])
            }
            ItemOutcome::Boosted { stat, amount } => fill(
                &self.boost,
                &[("name", active), ("stat", stat.as_str()), ("amount", amount.to_string().as_str())],
            ),
            ItemOutcome::Revived(name) => fill(&self.revive, &[("name", name.as_str())]),
            ItemOutcome::Captured(name) => fill(&self.capture, &[("name", name.as_str())]),
            ItemOutcome::CaptureFailed => fill(&self.capture_failed, &[("name", enemy)]),
            ItemOutcome::NoEffect => self.no_effect.clone(),
        }
    }

    pub fn run(&self) -> String {
        self.run.clone()
    }

    pub fn victory(&self) -> String {
        self.victory.clone()
    }

    pub fn all_fainted(&self) -> String {
        self.all_fainted.clone()
    }

    pub fn defeat(&self) -> String {
        self.defeat.clone()
    }

    pub fn loot(&self, opponent: &str, item: Option<&str>, coins: u32) -> String {
        let coins = coins.to_string();
        match item {
            Some(item) => fill(
                &self.loot,
                &[("name", opponent), ("item", item), ("coins", coins.as_str())],
            ),
            None => fill(&self.loot_coins_only, &[("name", opponent), ("coins", coins.as_str())]),
        }
    }

    pub fn loot_no_room(&self, item: &str) -> String {
        fill(&self.loot_no_room, &[("item", item)])
    }
}
