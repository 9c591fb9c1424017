//! Static game data: the creature, move and item tables.
//!
//! Each table is a RON list of string maps keyed by column header. The
//! built-in tables ship inside the binary; a data directory holding
//! `creatures.ron`, `moves.ron` and `items.ron` replaces them wholesale.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::ability::{Ability, AbilityBook};
use crate::combatant::{Combatant, Decision};
use crate::errors::{DataError, DataResult};
use crate::item::Item;

/// One row of a data table, column header to raw value.
pub type Record = HashMap<String, String>;

/// The column every table is keyed by.
pub const NAME_FIELD: &str = "Name";

const BUILTIN_CREATURES: &str = include_str!("../data/creatures.ron");
const BUILTIN_MOVES: &str = include_str!("../data/moves.ron");
const BUILTIN_ITEMS: &str = include_str!("../data/items.ron");

const CREATURE_FILE: &str = "creatures.ron";
const MOVE_FILE: &str = "moves.ron";
const ITEM_FILE: &str = "items.ron";

#[derive(Debug, Clone, Default)]
pub struct DataProvider {
    creatures: HashMap<String, Record>,
    moves: HashMap<String, Record>,
    items: HashMap<String, Record>,
}

impl DataProvider {
    /// Tables compiled into the crate.
    pub fn builtin() -> DataResult<Self> {
        Self::from_sources(
            (CREATURE_FILE, BUILTIN_CREATURES),
            (MOVE_FILE, BUILTIN_MOVES),
            (ITEM_FILE, BUILTIN_ITEMS),
        )
    }

    /// Reads the three tables from `dir`.
    pub fn load(dir: &Path) -> DataResult<Self> {
        info!(dir = %dir.display(), "loading data tables");
        let creatures = read_table_file(dir, CREATURE_FILE)?;
        let moves = read_table_file(dir, MOVE_FILE)?;
        let items = read_table_file(dir, ITEM_FILE)?;
        Self::from_sources(
            (CREATURE_FILE, &creatures),
            (MOVE_FILE, &moves),
            (ITEM_FILE, &items),
        )
    }

    /// Builds a provider from in-memory RON sources. The tables are
    /// cross-checked before the provider is handed out.
    pub fn from_ron(creatures: &str, moves: &str, items: &str) -> DataResult<Self> {
        Self::from_sources(
            (CREATURE_FILE, creatures),
            (MOVE_FILE, moves),
            (ITEM_FILE, items),
        )
    }

    fn from_sources(
        creatures: (&str, &str),
        moves: (&str, &str),
        items: (&str, &str),
    ) -> DataResult<Self> {
        let provider = Self {
            creatures: parse_table("creature", creatures.0, creatures.1)?,
            moves: parse_table("move", moves.0, moves.1)?,
            items: parse_table("item", items.0, items.1)?,
        };
        provider.validate()?;
        debug!(
            creatures = provider.creatures.len(),
            moves = provider.moves.len(),
            items = provider.items.len(),
            "data tables ready"
        );
        Ok(provider)
    }

    pub fn creature_data(&self, name: &str) -> DataResult<Record> {
        self.creatures
            .get(name)
            .cloned()
            .ok_or_else(|| DataError::UnknownCreature(name.to_string()))
    }

    pub fn move_data(&self, name: &str) -> DataResult<Record> {
        self.moves
            .get(name)
            .cloned()
            .ok_or_else(|| DataError::UnknownMove(name.to_string()))
    }

    pub fn item_data(&self, name: &str) -> DataResult<Record> {
        self.items
            .get(name)
            .cloned()
            .ok_or_else(|| DataError::UnknownItem(name.to_string()))
    }

    /// Creature names in sorted order, so seeded picks are reproducible.
    pub fn creature_names(&self) -> Vec<String> {
        sorted_keys(&self.creatures)
    }

    pub fn move_names(&self) -> Vec<String> {
        sorted_keys(&self.moves)
    }

    pub fn item_names(&self) -> Vec<String> {
        sorted_keys(&self.items)
    }

    /// Builds a creature from its table row.
    pub fn spawn_creature(&self, name: &str, decision: Decision) -> DataResult<Combatant> {
        Combatant::from_record(self.creature_data(name)?, decision)
    }

    pub fn item(&self, name: &str) -> DataResult<Item> {
        Item::from_record(&self.item_data(name)?)
    }

    /// Every move row, parsed.
    pub fn ability_book(&self) -> DataResult<AbilityBook> {
        self.moves
            .values()
            .map(Ability::from_record)
            .collect::<DataResult<Vec<_>>>()
            .map(AbilityBook::new)
    }

    /// Checks that every row parses and every cross-table reference
    /// (a creature's move set, its loot) resolves.
    pub fn validate(&self) -> DataResult<()> {
        let abilities = self.ability_book()?;
        for item in self.items.values() {
            Item::from_record(item)?;
        }
        for name in self.creature_names() {
            let creature = self.spawn_creature(&name, Decision::Controlled)?;
            for move_id in creature.moves() {
                if !abilities.contains(move_id) {
                    return Err(DataError::UnknownMove(move_id.clone()));
                }
            }
            if let Some(loot) = creature.loot() {
                if !self.items.contains_key(loot) {
                    return Err(DataError::UnknownItem(loot.to_string()));
                }
            }
        }
        Ok(())
    }
}

fn read_table_file(dir: &Path, file: &str) -> DataResult<String> {
    let path = dir.join(file);
    fs::read_to_string(&path).map_err(|source| DataError::Io {
        file: path.display().to_string(),
        source,
    })
}

fn parse_table(table: &'static str, file: &str, source: &str) -> DataResult<HashMap<String, Record>> {
    let rows: Vec<Record> = ron::from_str(source).map_err(|source| DataError::Parse {
        file: file.to_string(),
        source,
    })?;

    let mut keyed = HashMap::with_capacity(rows.len());
    for (position, row) in rows.into_iter().enumerate() {
        let name = row
            .get(NAME_FIELD)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| DataError::MissingField {
                table,
                row: format!("#{}", position),
                field: NAME_FIELD,
            })?;
        keyed.insert(name, row);
    }
    Ok(keyed)
}

fn sorted_keys(table: &HashMap<String, Record>) -> Vec<String> {
    let mut names: Vec<String> = table.keys().cloned().collect();
    names.sort();
    names
}

/// True when `value` is an optionally negative integer or decimal, the only
/// shape the loader treats as a number.
pub fn is_numeric(value: &str) -> bool {
    let unsigned = value.strip_prefix('-').unwrap_or(value);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    all_digits(whole) && fraction.map_or(true, all_digits)
}

/// Parses a numeric cell. Decimals are truncated toward zero; anything
/// outside the `i32` range saturates.
pub fn parse_numeric(value: &str) -> Option<i32> {
    if !is_numeric(value) {
        return None;
    }
    let whole = value.split('.').next().unwrap_or(value);
    match whole.parse::<i64>() {
        Ok(number) => Some(number.clamp(i32::MIN as i64, i32::MAX as i64) as i32),
        Err(_) if whole.starts_with('-') => Some(i32::MIN),
        Err(_) => Some(i32::MAX),
    }
}

/// Splits a `MoveSet` cell into move names, dropping blanks.
pub fn split_move_set(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("42", true)]
    #[case("-7", true)]
    #[case("3.75", true)]
    #[case("-0.5", true)]
    #[case("", false)]
    #[case("-", false)]
    #[case("1.", false)]
    #[case(".5", false)]
    #[case("1e3", false)]
    #[case("+4", false)]
    #[case("Potion", false)]
    fn test_is_numeric(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(is_numeric(value), expected, "value {:?}", value);
    }

    #[rstest]
    #[case("12", Some(12))]
    #[case("12.9", Some(12))]
    #[case("-3.2", Some(-3))]
    #[case("99999999999", Some(i32::MAX))]
    #[case("twelve", None)]
    fn test_parse_numeric_truncates(#[case] value: &str, #[case] expected: Option<i32>) {
        assert_eq!(parse_numeric(value), expected);
    }

    #[test]
    fn test_split_move_set_trims_and_drops_blanks() {
        assert_eq!(
            split_move_set(" Tackle; Ember ;;Focus;"),
            vec!["Tackle".to_string(), "Ember".to_string(), "Focus".to_string()]
        );
        assert!(split_move_set("").is_empty());
    }

    #[test]
    fn test_builtin_tables_are_consistent() {
        let data = DataProvider::builtin().expect("built-in data should validate");
        assert!(!data.creature_names().is_empty());

        let book = data.ability_book().unwrap();
        assert_eq!(book.len(), data.move_names().len());

        let emberfox = data.creature_data("Emberfox").unwrap();
        assert_eq!(emberfox.get("MaxHP").map(String::as_str), Some("46"));
    }

    #[test]
    fn test_unknown_rows_are_errors() {
        let data = DataProvider::builtin().unwrap();
        assert!(matches!(
            data.creature_data("Missingno"),
            Err(DataError::UnknownCreature(name)) if name == "Missingno"
        ));
        assert!(matches!(data.move_data("Hyper Beam"), Err(DataError::UnknownMove(_))));
        assert!(matches!(data.item_data("Master Ball"), Err(DataError::UnknownItem(_))));
    }

    #[test]
    fn test_dangling_move_reference_fails_validation() {
        let creatures = r#"[{ "Name": "Glitch", "MaxHP": "10", "MaxMP": "5", "MoveSet": "Nothing" }]"#;
        let moves = r#"[{ "Name": "Tackle", "Power": "5", "Cost": "0", "Accuracy": "0", "Category": "Damage", "Target": "Enemy" }]"#;
        let result = DataProvider::from_ron(creatures, moves, "[]");
        assert!(matches!(result, Err(DataError::UnknownMove(name)) if name == "Nothing"));
    }

    #[test]
    fn test_row_without_name_is_rejected() {
        let result = DataProvider::from_ron(r#"[{ "MaxHP": "10" }]"#, "[]", "[]");
        assert!(matches!(
            result,
            Err(DataError::MissingField { table: "creature", field: "Name", .. })
        ));
    }

    #[test]
    fn test_load_reads_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CREATURE_FILE), BUILTIN_CREATURES).unwrap();
        fs::write(dir.path().join(MOVE_FILE), BUILTIN_MOVES).unwrap();
        fs::write(dir.path().join(ITEM_FILE), BUILTIN_ITEMS).unwrap();

        let data = DataProvider::load(dir.path()).unwrap();
        assert_eq!(data.creature_names(), DataProvider::builtin().unwrap().creature_names());
    }

    #[test]
    fn test_load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(DataProvider::load(dir.path()), Err(DataError::Io { .. })));
    }
}
