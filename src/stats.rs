use std::collections::HashMap;
use std::str::FromStr;

use schema::StatKind;
use serde::{Deserialize, Serialize};

/// Numeric stats of a combatant.
///
/// The stats the battle rules read are typed fields. Any other numeric column
/// of a creature row survives in `extra` under its column name, so status
/// moves and items can still address it by key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatBlock {
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub atk: i32,
    pub def: i32,
    pub agi: i32,
    pub coins: i32,
    pub extra: HashMap<String, i32>,
}

impl StatBlock {
    pub fn get(&self, kind: StatKind) -> i32 {
        match kind {
            StatKind::Hp => self.hp,
            StatKind::MaxHp => self.max_hp,
            StatKind::Mp => self.mp,
            StatKind::MaxMp => self.max_mp,
            StatKind::Atk => self.atk,
            StatKind::Def => self.def,
            StatKind::Agi => self.agi,
            StatKind::Coins => self.coins,
        }
    }

    fn slot_mut(&mut self, kind: StatKind) -> &mut i32 {
        match kind {
            StatKind::Hp => &mut self.hp,
            StatKind::MaxHp => &mut self.max_hp,
            StatKind::Mp => &mut self.mp,
            StatKind::MaxMp => &mut self.max_mp,
            StatKind::Atk => &mut self.atk,
            StatKind::Def => &mut self.def,
            StatKind::Agi => &mut self.agi,
            StatKind::Coins => &mut self.coins,
        }
    }

    pub fn set(&mut self, kind: StatKind, value: i32) {
        *self.slot_mut(kind) = value;
    }

    /// Looks a stat up by column name, typed stats first.
    pub fn by_key(&self, key: &str) -> Option<i32> {
        match StatKind::from_str(key) {
            Ok(kind) => Some(self.get(kind)),
            Err(_) => self.extra.get(key).copied(),
        }
    }

    pub fn set_by_key(&mut self, key: &str, value: i32) {
        match StatKind::from_str(key) {
            Ok(kind) => self.set(kind, value),
            Err(_) => {
                self.extra.insert(key.to_string(), value);
            }
        }
    }

    /// Shifts a stat by `delta`, returning the change actually applied.
    ///
    /// Stats never drop below zero, and current HP/MP never exceed their
    /// ceilings. An unknown key starts from zero.
    pub fn adjust_by_key(&mut self, key: &str, delta: i32) -> i32 {
        let before = self.by_key(key).unwrap_or(0);
        let mut after = before.saturating_add(delta).max(0);
        if let Some(ceiling) = StatKind::from_str(key).ok().and_then(StatKind::ceiling) {
            after = after.min(self.get(ceiling));
        }
        self.set_by_key(key, after);
        self.hp = self.hp.min(self.max_hp);
        self.mp = self.mp.min(self.max_mp);
        after - before
    }

    /// Current HP as a whole percentage of max HP.
    pub fn hp_percent(&self) -> i32 {
        if self.max_hp <= 0 {
            return 0;
        }
        (self.hp.max(0) as i64 * 100 / self.max_hp as i64) as i32
    }
}

/// Text-valued columns of a creature row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Attributes {
    pub name: String,
    pub species: String,
    pub loot: Option<String>,
    pub description: Option<String>,
    pub extra: HashMap<String, String>,
}

impl Attributes {
    pub fn by_key(&self, key: &str) -> Option<&str> {
        match key {
            "Name" => Some(&self.name),
            "Species" => Some(&self.species),
            "Loot" => self.loot.as_deref(),
            "Description" => self.description.as_deref(),
            other => self.extra.get(other).map(String::as_str),
        }
    }
}
