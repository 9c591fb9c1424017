use std::sync::Arc;
use std::time::Duration;

use schema::PolicyKind;

use crate::battle::action::ActionToken;
use crate::battle::engine::{BattleEngine, BattleReport, FinishedBattle};
use crate::battle::events::NotificationLog;
use crate::battle::state::TurnRng;
use crate::combatant::{Combatant, Decision};
use crate::config::BattleConfig;
use crate::data::{DataProvider, Record};
use crate::errors::BattleResult;
use crate::player::Player;

/// How long a test waits on the engine before assuming it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

const TEST_CREATURES: &str = r#"[
    { "Name": "Sprout", "MaxHP": "40", "MaxMP": "10", "Atk": "6", "Def": "2", "Agi": "5",
      "Coins": "10", "Loot": "Potion", "MoveSet": "Strike;Mend" },
    { "Name": "Brute", "MaxHP": "60", "MaxMP": "20", "Atk": "12", "Def": "4", "Agi": "0",
      "Coins": "25", "Loot": "Capture Orb", "MoveSet": "Strike;Blast" },
]"#;

const TEST_MOVES: &str = r#"[
    { "Name": "Strike", "Power": "10", "Cost": "0", "Accuracy": "0", "Category": "Damage", "Target": "Enemy" },
    { "Name": "Blast",  "Power": "25", "Cost": "5", "Accuracy": "0", "Category": "Damage", "Target": "Enemy" },
    { "Name": "Mend",   "Power": "10", "Cost": "4", "Accuracy": "0", "Category": "Heal",   "Target": "Self" },
    { "Name": "Guard",  "Power": "3",  "Cost": "2", "Accuracy": "0", "Category": "Status", "Target": "Self", "Stat": "Def" },
]"#;

const TEST_ITEMS: &str = r#"[
    { "Name": "Potion",      "Effect": "Heal",    "Power": "20" },
    { "Name": "Capture Orb", "Effect": "Capture", "Power": "30" },
    { "Name": "Power Seed",  "Effect": "Boost",   "Power": "2", "Stat": "Atk" },
    { "Name": "Revive Herb", "Effect": "Revive",  "Power": "0" },
]"#;

/// A small, fixed set of tables so tests don't depend on the shipped data.
pub fn test_data() -> DataProvider {
    match DataProvider::from_ron(TEST_CREATURES, TEST_MOVES, TEST_ITEMS) {
        Ok(data) => data,
        Err(err) => panic!("Failed to load test tables: {}", err),
    }
}

/// A builder for creating test combatants with common defaults.
///
/// Defaults: MaxHP 50, MaxMP 20, Atk 10, Def 0, Agi 0, no coins, knows
/// `Strike`, player-controlled.
///
/// # Example
/// ```ignore
/// let brute = TestCombatantBuilder::new("Brute")
///     .with_stat("Atk", 30)
///     .with_policy(PolicyKind::Reckless)
///     .build();
/// ```
pub struct TestCombatantBuilder {
    name: String,
    stats: Vec<(String, i32)>,
    moves: Vec<String>,
    loot: Option<String>,
    decision: Decision,
    hp: Option<i32>,
    mp: Option<i32>,
}

impl TestCombatantBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            stats: Vec::new(),
            moves: vec!["Strike".to_string()],
            loot: None,
            decision: Decision::Controlled,
            hp: None,
            mp: None,
        }
    }

    /// Overrides a stat column. Setting `MaxHP`/`MaxMP` also fills HP/MP.
    pub fn with_stat(mut self, key: &str, value: i32) -> Self {
        self.stats.push((key.to_string(), value));
        self
    }

    pub fn with_moves(mut self, moves: &[&str]) -> Self {
        self.moves = moves.iter().map(|name| name.to_string()).collect();
        self
    }

    pub fn with_loot(mut self, item: &str) -> Self {
        self.loot = Some(item.to_string());
        self
    }

    /// Sets the current HP. If not set, HP will be max.
    pub fn with_hp(mut self, hp: i32) -> Self {
        self.hp = Some(hp);
        self
    }

    /// Sets the current MP. If not set, MP will be max.
    pub fn with_mp(mut self, mp: i32) -> Self {
        self.mp = Some(mp);
        self
    }

    pub fn with_policy(mut self, policy: PolicyKind) -> Self {
        self.decision = Decision::Autonomous(policy);
        self
    }

    pub fn autonomous(self) -> Self {
        self.with_policy(PolicyKind::Random)
    }

    pub fn build(self) -> Combatant {
        let mut record: Record = [
            ("Name", self.name.clone()),
            ("MaxHP", "50".to_string()),
            ("MaxMP", "20".to_string()),
            ("Atk", "10".to_string()),
            ("Def", "0".to_string()),
            ("Agi", "0".to_string()),
            ("Coins", "0".to_string()),
            ("MoveSet", self.moves.join(";")),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
        for (key, value) in &self.stats {
            record.insert(key.clone(), value.to_string());
        }
        if let Some(loot) = &self.loot {
            record.insert("Loot".to_string(), loot.clone());
        }

        let mut combatant = match Combatant::from_record(record, self.decision) {
            Ok(combatant) => combatant,
            Err(err) => panic!("Failed to build test combatant {}: {}", self.name, err),
        };
        if let Some(hp) = self.hp {
            combatant.set_hp(hp);
        }
        if let Some(mp) = self.mp {
            combatant.set_mp(mp);
        }
        combatant
    }
}

/// Creates a player whose roster holds `members`, in order.
pub fn test_player(members: Vec<Combatant>) -> Player {
    let mut player = Player::new("Tester");
    for member in members {
        player.roster.add(member).expect("test roster overflow");
    }
    player
}

/// Adds items from the test tables to the player's bag.
pub fn give_items(player: &mut Player, items: &[&str]) {
    let data = test_data();
    for name in items {
        player
            .inventory
            .add_item(data.item(name).expect("unknown test item"))
            .expect("test bag overflow");
    }
}

/// Rolls that never dodge and never fail a percent check they must pass.
pub fn never_dodge() -> Vec<u8> {
    vec![99; 64]
}

/// An engine over the test tables with no pacing and scripted rolls, plus
/// a log attached to every channel.
pub fn test_engine(rolls: Vec<u8>) -> (BattleEngine, NotificationLog) {
    let data = test_data();
    let abilities = data.ability_book().expect("test moves should parse");
    let mut engine = BattleEngine::new(Arc::new(data), Arc::new(abilities), BattleConfig::instant())
        .with_rng(TurnRng::new_for_test(rolls));
    let log = NotificationLog::new();
    log.attach(engine.bus_mut());
    (engine, log)
}

/// Spawns the battle and feeds `script` to the player's side, one action
/// each time the engine asks for input.
pub async fn run_scripted(
    engine: BattleEngine,
    player: Player,
    opponent: Combatant,
    script: Vec<ActionToken>,
) -> FinishedBattle {
    let input = engine.input();
    let handle = engine.spawn(player, opponent);

    for action in script {
        tokio::time::timeout(TEST_TIMEOUT, input.awaiting())
            .await
            .unwrap_or_else(|_| panic!("engine never asked for input before {}", action));
        assert!(input.supply(action), "input window closed unexpectedly");
    }

    tokio::time::timeout(TEST_TIMEOUT, handle)
        .await
        .expect("battle did not finish")
        .expect("battle task panicked")
}

pub fn attack(move_id: &str) -> ActionToken {
    ActionToken::Attack {
        move_id: move_id.to_string(),
    }
}

/// Helper function to assert that a Result is Ok and return the value.
pub fn assert_ok<T>(result: BattleResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("Expected Ok but got error: {}", err),
    }
}

/// Unwraps a finished battle's report, panicking on failure.
pub fn report_of(finished: &FinishedBattle) -> BattleReport {
    match &finished.result {
        Ok(report) => report.clone(),
        Err(err) => panic!("Expected a finished battle but got error: {}", err),
    }
}
