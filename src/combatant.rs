use schema::PolicyKind;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::ability::AbilityBook;
use crate::battle::action::ActionToken;
use crate::battle::ai::behavior_for;
use crate::battle::input::PlayerInput;
use crate::battle::state::TurnRng;
use crate::data::{is_numeric, parse_numeric, split_move_set, Record, NAME_FIELD};
use crate::errors::{BattleResult, DataError, DataResult};
use crate::stats::{Attributes, StatBlock};

/// Dodge chance floor/ceiling, in percent.
const MIN_DODGE: i32 = 0;
const MAX_DODGE: i32 = 100;
/// Flat bonus every defender gets on top of `Agi - accuracy`.
const BASE_DODGE: i32 = 20;

/// Who picks a combatant's action each turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Waits for the player to supply an action.
    Controlled,
    /// Picks its own action using a built-in policy.
    Autonomous(PolicyKind),
}

/// Borrowed battle context a combatant needs to choose an action.
pub struct DecisionContext<'a> {
    pub input: &'a PlayerInput,
    pub abilities: &'a AbilityBook,
    pub rng: &'a mut TurnRng,
}

/// A single creature, either in the player's roster or met in the wild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    stats: StatBlock,
    attributes: Attributes,
    moves: Vec<String>,
    fainted: bool,
    decision: Decision,
}

/// Current HP/MP numbers, as published on the stats channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatSnapshot {
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
}

/// Summary of one roster member, as published on the roster channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantSnapshot {
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub fainted: bool,
}

impl Combatant {
    /// Builds a combatant from a creature row.
    ///
    /// Numeric cells become stats, everything else becomes an attribute.
    /// `MaxHP`, `MaxMP` and a non-empty `MoveSet` are required; current HP
    /// and MP start at their maximums.
    pub fn from_record(record: Record, decision: Decision) -> DataResult<Self> {
        let name = record
            .get(NAME_FIELD)
            .map(|name| name.trim().to_string())
            .ok_or_else(|| missing("?", NAME_FIELD))?;

        for required in ["MaxHP", "MaxMP"] {
            match record.get(required).map(|value| value.trim()) {
                None => return Err(missing(&name, required)),
                Some(value) if !is_numeric(value) => {
                    return Err(DataError::MalformedField {
                        table: "creature",
                        row: name,
                        field: required,
                        value: value.to_string(),
                    })
                }
                Some(_) => {}
            }
        }

        let mut stats = StatBlock::default();
        let mut attributes = Attributes {
            name: name.clone(),
            species: name.clone(),
            ..Attributes::default()
        };
        let mut moves = Vec::new();

        for (key, value) in record {
            let value = value.trim();
            match key.as_str() {
                NAME_FIELD => {}
                "MoveSet" => moves = split_move_set(value),
                "Species" => attributes.species = value.to_string(),
                "Loot" => attributes.loot = Some(value.to_string()).filter(|loot| !loot.is_empty()),
                "Description" => attributes.description = Some(value.to_string()),
                _ if is_numeric(value) => {
                    // is_numeric guarantees the parse
                    stats.set_by_key(&key, parse_numeric(value).unwrap_or_default());
                }
                _ => {
                    attributes.extra.insert(key, value.to_string());
                }
            }
        }

        if moves.is_empty() {
            return Err(missing(&name, "MoveSet"));
        }
        if stats.max_hp <= 0 {
            return Err(DataError::MalformedField {
                table: "creature",
                row: name,
                field: "MaxHP",
                value: stats.max_hp.to_string(),
            });
        }

        stats.max_mp = stats.max_mp.max(0);
        stats.hp = stats.max_hp;
        stats.mp = stats.max_mp;

        Ok(Self {
            stats,
            attributes,
            moves,
            fainted: false,
            decision,
        })
    }

    pub fn name(&self) -> &str {
        &self.attributes.name
    }

    pub fn species(&self) -> &str {
        &self.attributes.species
    }

    pub fn loot(&self) -> Option<&str> {
        self.attributes.loot.as_deref()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn stats(&self) -> &StatBlock {
        &self.stats
    }

    pub fn stat(&self, key: &str) -> Option<i32> {
        self.stats.by_key(key)
    }

    pub fn hp(&self) -> i32 {
        self.stats.hp
    }

    pub fn mp(&self) -> i32 {
        self.stats.mp
    }

    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    pub fn knows_move(&self, move_id: &str) -> bool {
        self.moves.iter().any(|known| known == move_id)
    }

    pub fn is_fainted(&self) -> bool {
        self.fainted
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    pub fn set_decision(&mut self, decision: Decision) {
        self.decision = decision;
    }

    /// Percent chance to dodge an attack with the given accuracy.
    pub fn dodge_chance(&self, attacker_accuracy: i32) -> i32 {
        (self.stats.agi - attacker_accuracy + BASE_DODGE).clamp(MIN_DODGE, MAX_DODGE)
    }

    /// Resolves an incoming hit of `raw` power and returns the damage dealt.
    ///
    /// A successful dodge deals nothing. Otherwise the damage is `raw - Def`
    /// floored at zero, and HP is floored at zero with the combatant fainting
    /// when it gets there.
    pub fn take_damage(&mut self, raw: i32, attacker_accuracy: i32, rng: &mut TurnRng) -> i32 {
        let dodge = self.dodge_chance(attacker_accuracy);
        let roll = rng.roll_percent("dodge") as i32;
        if roll < dodge {
            trace!(target = %self.name(), roll, dodge, "attack dodged");
            return 0;
        }

        let damage = raw.saturating_sub(self.stats.def).max(0);
        self.stats.hp = self.stats.hp.saturating_sub(damage).max(0);
        if self.stats.hp == 0 {
            self.faint();
        }
        damage
    }

    /// Spends MP, stopping at zero. Returns the amount actually spent.
    pub fn lose_mp(&mut self, amount: i32) -> i32 {
        let before = self.stats.mp;
        self.stats.mp = self.stats.mp.saturating_sub(amount.max(0)).max(0);
        before - self.stats.mp
    }

    /// Restores HP up to the maximum. Returns the amount actually restored.
    ///
    /// A fainted combatant gains nothing; only a revive brings it back.
    pub fn gain_hp(&mut self, amount: i32) -> i32 {
        if self.fainted {
            return 0;
        }
        let before = self.stats.hp;
        self.stats.hp = self.stats.hp.saturating_add(amount.max(0)).min(self.stats.max_hp);
        self.stats.hp - before
    }

    /// Raises (or with a negative amount, lowers) a stat by key.
    pub fn adjust_stat(&mut self, key: &str, amount: i32) -> i32 {
        let applied = self.stats.adjust_by_key(key, amount);
        if self.stats.hp == 0 && !self.fainted {
            self.faint();
        }
        applied
    }

    /// Full HP, full MP, not fainted.
    pub fn revitalize(&mut self) {
        self.stats.hp = self.stats.max_hp;
        self.stats.mp = self.stats.max_mp;
        self.fainted = false;
    }

    /// Drops HP to zero and faints.
    pub fn kill_immediately(&mut self) {
        self.stats.hp = 0;
        self.faint();
    }

    /// Overrides current HP, clamped to `[0, MaxHP]`.
    pub fn set_hp(&mut self, hp: i32) {
        self.stats.hp = hp.clamp(0, self.stats.max_hp);
        self.fainted = self.stats.hp == 0;
    }

    /// Overrides current MP, clamped to `[0, MaxMP]`.
    pub fn set_mp(&mut self, mp: i32) {
        self.stats.mp = mp.clamp(0, self.stats.max_mp);
    }

    fn faint(&mut self) {
        self.fainted = true;
    }

    pub fn stat_snapshot(&self) -> StatSnapshot {
        StatSnapshot {
            hp: self.stats.hp,
            max_hp: self.stats.max_hp,
            mp: self.stats.mp,
            max_mp: self.stats.max_mp,
        }
    }

    pub fn snapshot(&self) -> CombatantSnapshot {
        CombatantSnapshot {
            name: self.name().to_string(),
            hp: self.stats.hp,
            max_hp: self.stats.max_hp,
            mp: self.stats.mp,
            max_mp: self.stats.max_mp,
            fainted: self.fainted,
        }
    }

    /// Produces this combatant's action for the current turn.
    ///
    /// A controlled combatant suspends until the player supplies an action;
    /// an autonomous one asks its policy and returns immediately.
    pub async fn select_action(
        &self,
        opponent: &StatBlock,
        ctx: DecisionContext<'_>,
    ) -> BattleResult<ActionToken> {
        match self.decision {
            Decision::Controlled => ctx.input.await_action().await,
            Decision::Autonomous(policy) => {
                let behavior = behavior_for(policy);
                Ok(behavior.decide_action(self, opponent, ctx.abilities, ctx.rng))
            }
        }
    }
}

fn missing(row: &str, field: &'static str) -> DataError {
    DataError::MissingField {
        table: "creature",
        row: row.to_string(),
        field,
    }
}
