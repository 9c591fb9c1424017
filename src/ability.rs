//! Move definitions and the rules that resolve them.

use std::collections::HashMap;
use std::str::FromStr;

use schema::{MoveCategory, MoveTarget};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::battle::state::TurnRng;
use crate::combatant::Combatant;
use crate::data::{parse_numeric, Record, NAME_FIELD};
use crate::errors::{DataError, DataResult};
use crate::stats::StatBlock;

/// A move as described by one row of the move table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability {
    pub name: String,
    pub power: i32,
    pub mp_cost: i32,
    pub accuracy: i32,
    pub category: MoveCategory,
    pub target: MoveTarget,
    /// Stat a status move adjusts.
    pub stat: Option<String>,
}

/// What happened when a move was used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    /// The attacker could not pay the MP cost; nothing else changed.
    InsufficientMp,
    /// The defender dodged, or the hit was fully absorbed.
    Missed,
    Damaged(i32),
    Healed(i32),
    Boosted { stat: String, amount: i32 },
}

impl MoveOutcome {
    /// Sentinel magnitude for a move that could not be paid for.
    pub const INSUFFICIENT_MP: i32 = -1;

    /// The outcome as a single signed number: `-1` for insufficient MP,
    /// other negatives for healing, `0` for a miss and positives for damage.
    ///
    /// A one-point heal encodes as `-1` as well, so callers that need to tell
    /// the two apart should match on the enum instead.
    pub fn signed_magnitude(&self) -> i32 {
        match self {
            MoveOutcome::InsufficientMp => Self::INSUFFICIENT_MP,
            MoveOutcome::Missed => 0,
            MoveOutcome::Damaged(damage) => *damage,
            MoveOutcome::Healed(amount) => -amount,
            MoveOutcome::Boosted { .. } => 0,
        }
    }
}

impl Ability {
    pub fn from_record(record: &Record) -> DataResult<Self> {
        let name = record
            .get(NAME_FIELD)
            .map(|name| name.trim().to_string())
            .unwrap_or_default();

        let number = |field: &'static str, required: bool| -> DataResult<i32> {
            match record.get(field).map(|value| value.trim()) {
                None if required => Err(DataError::MissingField {
                    table: "move",
                    row: name.clone(),
                    field,
                }),
                None => Ok(0),
                Some(value) => parse_numeric(value).ok_or_else(|| DataError::MalformedField {
                    table: "move",
                    row: name.clone(),
                    field,
                    value: value.to_string(),
                }),
            }
        };
        let power = number("Power", true)?;
        let mp_cost = number("Cost", false)?;
        let accuracy = number("Accuracy", false)?;

        let category = match record.get("Category").map(|value| value.trim()) {
            None => MoveCategory::Damage,
            Some(value) => MoveCategory::from_str(value).map_err(|_| DataError::MalformedField {
                table: "move",
                row: name.clone(),
                field: "Category",
                value: value.to_string(),
            })?,
        };
        let default_target = match category {
            MoveCategory::Damage => MoveTarget::Enemy,
            MoveCategory::Heal | MoveCategory::Status => MoveTarget::User,
        };
        let target = match record.get("Target").map(|value| value.trim()) {
            None => default_target,
            Some(value) => MoveTarget::from_str(value).map_err(|_| DataError::MalformedField {
                table: "move",
                row: name.clone(),
                field: "Target",
                value: value.to_string(),
            })?,
        };

        let stat = record
            .get("Stat")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        if category == MoveCategory::Status && stat.is_none() {
            return Err(DataError::MissingField {
                table: "move",
                row: name,
                field: "Stat",
            });
        }

        Ok(Self {
            name,
            power,
            mp_cost: mp_cost.max(0),
            accuracy,
            category,
            target,
            stat,
        })
    }

    pub fn is_affordable(&self, user: &Combatant) -> bool {
        user.mp() >= self.mp_cost
    }

    /// Raw power of a damaging hit before the defender's defense applies.
    pub fn base_damage(&self, attacker: &StatBlock) -> i32 {
        self.power.saturating_add(attacker.atk)
    }

    pub fn heal_amount(&self, user: &StatBlock) -> i32 {
        self.power.saturating_add(user.atk / 2)
    }

    /// Damage this move should deal on average, accounting for the
    /// defender's defense and dodge chance. Zero for non-damaging moves.
    pub fn expected_damage(&self, attacker: &StatBlock, defender: &StatBlock) -> f64 {
        if self.category != MoveCategory::Damage {
            return 0.0;
        }
        let per_hit = (self.base_damage(attacker) - defender.def).max(0) as f64;
        let dodge = (defender.agi - self.accuracy + 20).clamp(0, 100) as f64;
        per_hit * (100.0 - dodge) / 100.0
    }

    /// Resolves this move with `attacker` as the user.
    ///
    /// MP is checked and spent first; a move that cannot be paid for changes
    /// nothing else. Afterwards the category decides what happens to the
    /// target (the defender, or the attacker for self-targeted moves).
    pub fn execute(
        &self,
        defender: &mut Combatant,
        attacker: &mut Combatant,
        rng: &mut TurnRng,
    ) -> MoveOutcome {
        if !self.is_affordable(attacker) {
            trace!(user = %attacker.name(), ability = %self.name, "not enough MP");
            return MoveOutcome::InsufficientMp;
        }
        attacker.lose_mp(self.mp_cost);

        match self.category {
            MoveCategory::Damage => {
                let raw = self.base_damage(attacker.stats());
                let target = match self.target {
                    MoveTarget::Enemy => defender,
                    MoveTarget::User => attacker,
                };
                match target.take_damage(raw, self.accuracy, rng) {
                    0 => MoveOutcome::Missed,
                    dealt => MoveOutcome::Damaged(dealt),
                }
            }
            MoveCategory::Heal => {
                let amount = self.heal_amount(attacker.stats());
                let target = match self.target {
                    MoveTarget::Enemy => defender,
                    MoveTarget::User => attacker,
                };
                MoveOutcome::Healed(target.gain_hp(amount))
            }
            MoveCategory::Status => {
                let stat = self.stat.clone().unwrap_or_default();
                let target = match self.target {
                    MoveTarget::Enemy => defender,
                    MoveTarget::User => attacker,
                };
                let amount = target.adjust_stat(&stat, self.power);
                MoveOutcome::Boosted { stat, amount }
            }
        }
    }
}

/// Every known move, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbilityBook {
    abilities: HashMap<String, Ability>,
}

impl AbilityBook {
    pub fn new(abilities: impl IntoIterator<Item = Ability>) -> Self {
        Self {
            abilities: abilities
                .into_iter()
                .map(|ability| (ability.name.clone(), ability))
                .collect(),
        }
    }

    pub fn get(&self, move_id: &str) -> DataResult<&Ability> {
        self.abilities
            .get(move_id)
            .ok_or_else(|| DataError::UnknownMove(move_id.to_string()))
    }

    pub fn contains(&self, move_id: &str) -> bool {
        self.abilities.contains_key(move_id)
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    /// Looks up and resolves a move in one step.
    pub fn execute_move(
        &self,
        move_id: &str,
        defender: &mut Combatant,
        attacker: &mut Combatant,
        rng: &mut TurnRng,
    ) -> DataResult<MoveOutcome> {
        Ok(self.get(move_id)?.execute(defender, attacker, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::tests::common::{test_data, TestCombatantBuilder};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn book() -> AbilityBook {
        test_data().ability_book().unwrap()
    }

    #[test]
    fn test_damage_adds_attack_and_subtracts_defense() {
        // Arrange
        let mut attacker = TestCombatantBuilder::new("Attacker").with_stat("Atk", 10).build();
        let mut defender = TestCombatantBuilder::new("Defender")
            .with_stat("Def", 3)
            .with_stat("Agi", 0)
            .build();
        let hp = defender.hp();
        let mut rng = TurnRng::new_for_test(vec![99]);

        // Act
        let outcome = book()
            .execute_move("Strike", &mut defender, &mut attacker, &mut rng)
            .unwrap();

        // Assert: Strike has power 10, so 10 + 10 - 3
        assert_eq!(outcome, MoveOutcome::Damaged(17));
        assert_eq!(outcome.signed_magnitude(), 17);
        assert_eq!(defender.hp(), hp - 17);
    }

    #[test]
    fn test_insufficient_mp_changes_nothing() {
        let mut attacker = TestCombatantBuilder::new("Tired").with_mp(2).build();
        let mut defender = TestCombatantBuilder::new("Target").build();
        let before = (attacker.clone(), defender.clone());
        let mut rng = TurnRng::new_for_test(vec![]);

        let outcome = book()
            .execute_move("Blast", &mut defender, &mut attacker, &mut rng)
            .unwrap();

        assert_eq!(outcome, MoveOutcome::InsufficientMp);
        assert_eq!(outcome.signed_magnitude(), -1);
        assert_eq!((attacker, defender), before);
    }

    #[test]
    fn test_exact_mp_is_enough() {
        // Mend costs 4
        let mut attacker = TestCombatantBuilder::new("Caster").with_mp(4).with_hp(30).build();
        let mut defender = TestCombatantBuilder::new("Target").build();
        let mut rng = TurnRng::new_for_test(vec![]);

        let outcome = book()
            .execute_move("Mend", &mut defender, &mut attacker, &mut rng)
            .unwrap();

        assert!(matches!(outcome, MoveOutcome::Healed(_)));
        assert_eq!(attacker.mp(), 0);
    }

    #[test]
    fn test_miss_still_spends_mp() {
        let mut attacker = TestCombatantBuilder::new("Caster").build();
        let mut defender = TestCombatantBuilder::new("Dodger").with_stat("Agi", 10).build();
        let mp = attacker.mp();
        let mut rng = TurnRng::new_for_test(vec![0]);

        let blast = book().get("Blast").unwrap().clone();
        let outcome = blast.execute(&mut defender, &mut attacker, &mut rng);

        assert_eq!(outcome, MoveOutcome::Missed);
        assert_eq!(outcome.signed_magnitude(), 0);
        assert_eq!(attacker.mp(), mp - blast.mp_cost);
    }

    #[test]
    fn test_heal_targets_user_and_reports_negative() {
        let mut user = TestCombatantBuilder::new("Healer")
            .with_stat("Atk", 8)
            .with_hp(10)
            .build();
        let mut enemy = TestCombatantBuilder::new("Enemy").build();
        let mut rng = TurnRng::new_for_test(vec![]);

        let outcome = book()
            .execute_move("Mend", &mut enemy, &mut user, &mut rng)
            .unwrap();

        // Mend has power 10, plus half of Atk 8
        assert_eq!(outcome, MoveOutcome::Healed(14));
        assert_eq!(outcome.signed_magnitude(), -14);
        assert_eq!(user.hp(), 24);
    }

    #[test]
    fn test_status_move_raises_named_stat() {
        let mut user = TestCombatantBuilder::new("Turtle").with_stat("Def", 4).build();
        let mut enemy = TestCombatantBuilder::new("Enemy").build();
        let mut rng = TurnRng::new_for_test(vec![]);

        let outcome = book()
            .execute_move("Guard", &mut enemy, &mut user, &mut rng)
            .unwrap();

        assert_eq!(
            outcome,
            MoveOutcome::Boosted {
                stat: "Def".to_string(),
                amount: 3
            }
        );
        assert_eq!(user.stats().def, 7);
    }

    #[test]
    fn test_unknown_move_is_an_error() {
        let mut a = TestCombatantBuilder::new("A").build();
        let mut b = TestCombatantBuilder::new("B").build();
        let mut rng = TurnRng::new_for_test(vec![]);
        assert!(matches!(
            book().execute_move("Splash", &mut a, &mut b, &mut rng),
            Err(DataError::UnknownMove(name)) if name == "Splash"
        ));
    }

    #[rstest]
    #[case(&[("Name", "Bad"), ("Cost", "1")], "Power")]
    #[case(&[("Name", "Bad"), ("Power", "x")], "Power")]
    #[case(&[("Name", "Bad"), ("Power", "1"), ("Category", "Psychic")], "Category")]
    #[case(&[("Name", "Bad"), ("Power", "1"), ("Category", "Status")], "Stat")]
    fn test_malformed_move_rows(#[case] pairs: &[(&str, &str)], #[case] field: &str) {
        let record: Record = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let err = Ability::from_record(&record).unwrap_err();
        let reported = match err {
            DataError::MissingField { field, .. } | DataError::MalformedField { field, .. } => field,
            other => panic!("unexpected error: {other}"),
        };
        assert_eq!(reported, field);
    }

    #[test]
    fn test_expected_damage_accounts_for_dodge() {
        let attacker = TestCombatantBuilder::new("A").with_stat("Atk", 10).build();
        let defender = TestCombatantBuilder::new("D")
            .with_stat("Def", 0)
            .with_stat("Agi", 30)
            .build();
        let strike = book().get("Strike").unwrap().clone();
        // 20 per hit, 50% dodge
        assert_eq!(strike.expected_damage(attacker.stats(), defender.stats()), 10.0);
    }
}
