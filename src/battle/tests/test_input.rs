use std::sync::Arc;
use std::time::Duration;

use schema::{BattlePhase, PolicyKind};
use tokio::time::{timeout, Instant};

use crate::battle::action::ActionToken;
use crate::battle::engine::BattleEngine;
use crate::battle::events::{Channel, Notification, NotificationLog};
use crate::battle::state::TurnRng;
use crate::battle::tests::common::{
    never_dodge, report_of, run_scripted, test_data, test_engine, test_player,
    TestCombatantBuilder,
};
use crate::config::BattleConfig;
use pretty_assertions::assert_eq;

const WAIT: Duration = Duration::from_secs(5);

fn wildling() -> crate::combatant::Combatant {
    TestCombatantBuilder::new("Wildling")
        .with_stat("MaxHP", 20)
        .with_policy(PolicyKind::Reckless)
        .build()
}

#[tokio::test]
async fn test_selection_before_the_battle_asks_is_dropped() {
    let (engine, _log) = test_engine(never_dodge());
    let input = engine.input();

    assert!(!input.is_awaiting());
    assert!(!input.select_flee());
    assert!(!input.select_move("Strike"));
}

#[tokio::test]
async fn test_run_command_flees_through_the_input_handle() {
    // Arrange
    let (engine, log) = test_engine(vec![]);
    let input = engine.input();
    let handle = engine.spawn(test_player(vec![TestCombatantBuilder::new("Hero").build()]), wildling());

    // Act
    timeout(WAIT, input.awaiting()).await.expect("engine never asked for input");
    assert!(input.is_awaiting());
    assert!(input.select_move("Run"));
    let finished = timeout(WAIT, handle)
        .await
        .expect("battle did not finish")
        .expect("battle task panicked");

    // Assert
    assert_eq!(report_of(&finished).outcome, BattlePhase::Draw);
    assert_eq!(log.phases(), vec![BattlePhase::Start, BattlePhase::Draw]);
    assert!(!input.is_awaiting());
}

#[tokio::test]
async fn test_autonomous_player_side_needs_no_input() {
    let (engine, log) = test_engine(never_dodge());
    let hero = TestCombatantBuilder::new("Hero")
        .with_policy(PolicyKind::Reckless)
        .build();

    let finished = timeout(WAIT, engine.spawn(test_player(vec![hero]), wildling()))
        .await
        .expect("battle did not finish")
        .expect("battle task panicked");

    assert_eq!(report_of(&finished).outcome, BattlePhase::Victory);
    assert!(log.dialogue().contains(&"Hero used Strike!".to_string()));
}

#[tokio::test]
async fn test_pacing_pauses_after_narrated_steps() {
    // Arrange
    let config = BattleConfig {
        pacing: Duration::from_millis(5),
        seed: None,
    };
    let data = test_data();
    let abilities = data.ability_book().unwrap();
    let engine = BattleEngine::new(Arc::new(data), Arc::new(abilities), config)
        .with_rng(TurnRng::new_for_test(vec![]));
    let player = test_player(vec![TestCombatantBuilder::new("Hero").build()]);

    // Act
    let started = Instant::now();
    run_scripted(engine, player, wildling(), vec![ActionToken::Flee]).await;

    // Assert: one pause after the opening line and one after fleeing
    assert!(started.elapsed() >= Duration::from_millis(10));
}

#[tokio::test]
async fn test_engine_is_reusable_with_its_listeners() {
    // Arrange
    let (engine, log) = test_engine(never_dodge());
    let first = run_scripted(
        engine,
        test_player(vec![TestCombatantBuilder::new("Hero").build()]),
        wildling(),
        vec![ActionToken::Flee],
    )
    .await;

    // Act
    let second = run_scripted(first.engine, first.player, wildling(), vec![ActionToken::Flee]).await;

    // Assert
    assert_eq!(report_of(&second).outcome, BattlePhase::Draw);
    assert_eq!(
        log.phases(),
        vec![
            BattlePhase::Start,
            BattlePhase::Draw,
            BattlePhase::Start,
            BattlePhase::Draw
        ]
    );
}

#[tokio::test]
async fn test_unsubscribed_listener_hears_nothing_more() {
    // Arrange
    let (mut engine, _log) = test_engine(never_dodge());
    let quiet = NotificationLog::new();
    let id = engine.subscribe(Channel::Dialogue, quiet.clone());
    assert!(engine.unsubscribe(id));

    // Act
    run_scripted(
        engine,
        test_player(vec![TestCombatantBuilder::new("Hero").build()]),
        wildling(),
        vec![ActionToken::Flee],
    )
    .await;

    // Assert
    assert!(quiet.is_empty());
}

#[tokio::test]
async fn test_closure_listener_sees_dialogue_in_order() {
    let (mut engine, _log) = test_engine(never_dodge());
    let lines = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = Arc::clone(&lines);
    engine.subscribe(Channel::Dialogue, move |notification: &Notification| {
        if let Notification::Dialogue(line) = notification {
            sink.lock().unwrap().push(line.clone());
        }
    });

    run_scripted(
        engine,
        test_player(vec![TestCombatantBuilder::new("Hero").build()]),
        wildling(),
        vec![ActionToken::Flee],
    )
    .await;

    assert_eq!(
        *lines.lock().unwrap(),
        vec!["A wild Wildling appeared!", "What will Hero do?", "Got away safely!"]
    );
}
