use std::str::FromStr;

use schema::ItemEffectKind;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::battle::state::TurnRng;
use crate::combatant::{Combatant, Decision};
use crate::data::{parse_numeric, Record, NAME_FIELD};
use crate::errors::{DataError, DataResult};
use crate::roster::Roster;

/// A consumable from the item table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub effect: ItemEffectKind,
    pub power: i32,
    /// Stat raised by a boost item.
    pub stat: Option<String>,
    pub sprite: Option<String>,
}

/// What using an item did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemOutcome {
    Healed(i32),
    Boosted { stat: String, amount: i32 },
    Revived(String),
    /// The opponent joined the roster; the battle is over.
    Captured(String),
    CaptureFailed,
    NoEffect,
}

impl ItemOutcome {
    /// Whether the battle ends once this outcome is applied.
    pub fn ends_battle(&self) -> bool {
        matches!(self, ItemOutcome::Captured(_))
    }
}

/// Everything an item may touch when used mid-battle.
pub struct ItemTarget<'a> {
    pub roster: &'a mut Roster,
    pub active: usize,
    pub enemy: &'a mut Combatant,
}

impl Item {
    pub fn from_record(record: &Record) -> DataResult<Self> {
        let name = record
            .get(NAME_FIELD)
            .map(|name| name.trim().to_string())
            .unwrap_or_default();
        let malformed = |field: &'static str, value: &str| DataError::MalformedField {
            table: "item",
            row: name.clone(),
            field,
            value: value.to_string(),
        };

        let effect_raw = record
            .get("Effect")
            .map(|value| value.trim())
            .ok_or_else(|| DataError::MissingField {
                table: "item",
                row: name.clone(),
                field: "Effect",
            })?;
        let effect =
            ItemEffectKind::from_str(effect_raw).map_err(|_| malformed("Effect", effect_raw))?;

        let numeric = |field: &'static str| -> DataResult<i32> {
            match record.get(field).map(|value| value.trim()) {
                None => Ok(0),
                Some(value) => parse_numeric(value).ok_or_else(|| malformed(field, value)),
            }
        };
        let power = numeric("Power")?;

        let text = |field: &str| {
            record
                .get(field)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let stat = text("Stat");
        if effect == ItemEffectKind::Boost && stat.is_none() {
            return Err(DataError::MissingField {
                table: "item",
                row: name,
                field: "Stat",
            });
        }

        Ok(Self {
            sprite: text("Sprite"),
            name,
            effect,
            power,
            stat,
        })
    }

    /// Percent chance a capture item succeeds against `enemy`: the item's
    /// power plus half the enemy's missing HP percentage, capped at 100.
    pub fn capture_chance(&self, enemy: &Combatant) -> i32 {
        let missing = 100 - enemy.stats().hp_percent();
        (self.power + missing / 2).clamp(0, 100)
    }

    /// Applies the item's effect.
    ///
    /// Heal and boost act on the active roster member. Revive restores the
    /// first fainted member. Capture rolls against [`Item::capture_chance`]
    /// and, on success, moves a revitalized copy of the enemy into the roster
    /// under the player's control; the caller ends the battle.
    pub fn apply(&self, target: ItemTarget<'_>, rng: &mut TurnRng) -> ItemOutcome {
        let ItemTarget {
            roster,
            active,
            enemy,
        } = target;

        match self.effect {
            ItemEffectKind::Heal => match roster.get_mut(active) {
                Some(member) if !member.is_fainted() => ItemOutcome::Healed(member.gain_hp(self.power)),
                _ => ItemOutcome::NoEffect,
            },
            ItemEffectKind::Boost => {
                let stat = self.stat.clone().unwrap_or_default();
                match roster.get_mut(active) {
                    Some(member) => {
                        let amount = member.adjust_stat(&stat, self.power);
                        ItemOutcome::Boosted { stat, amount }
                    }
                    None => ItemOutcome::NoEffect,
                }
            }
            ItemEffectKind::Revive => match roster.revive_first_fainted() {
                Some(name) => ItemOutcome::Revived(name),
                None => ItemOutcome::NoEffect,
            },
            ItemEffectKind::Capture => {
                if roster.is_full() {
                    debug!(item = %self.name, "roster full, capture cannot succeed");
                    return ItemOutcome::CaptureFailed;
                }
                let chance = self.capture_chance(enemy);
                let roll = rng.roll_percent("capture") as i32;
                if roll >= chance {
                    return ItemOutcome::CaptureFailed;
                }

                let mut recruit = enemy.clone();
                recruit.revitalize();
                recruit.set_decision(Decision::Controlled);
                let name = recruit.name().to_string();
                match roster.add(recruit) {
                    Ok(_) => ItemOutcome::Captured(name),
                    Err(_) => ItemOutcome::CaptureFailed,
                }
            }
        }
    }
}
