//! Terminal front end: a menu between battles and a command prompt during
//! them. Narration goes to stdout, logs to stderr.

use std::str::FromStr;

use anyhow::Result;
use creature_arena::{
    BattlePhase, Channel, GameConfig, GameSession, Notification, PlayerInput, PolicyKind,
    TrainerAbility,
};
use strum::IntoEnumIterator;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const BATTLE_HELP: &str = "commands: move <name> | item <index> | switch <index> | run";
const MENU_HELP: &str =
    "commands: battle [random|reckless|attrition] | heal | release <index> | roster | bag | save | quit";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = GameConfig::from_env();
    let json_events = config.json_events;
    let mut session = GameSession::new(config)?;
    subscribe_printers(&mut session, json_events)?;

    let mut lines = spawn_stdin_reader();

    if !session.continue_game()? {
        if !choose_starter(&mut session, &mut lines).await? {
            return Ok(());
        }
    }

    println!("{}", MENU_HELP);
    while let Some(line) = lines.recv().await {
        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (Some("battle"), policy) => {
                let policy = policy
                    .and_then(|raw| PolicyKind::from_str(raw).ok())
                    .unwrap_or(PolicyKind::Random);
                if let Err(err) = battle(&mut session, &mut lines, policy).await {
                    error!(%err, "battle failed");
                    return Err(err);
                }
                session.save_game()?;
            }
            (Some("heal"), _) => {
                session.revitalize_roster()?;
                println!("Your creatures are fully rested.");
            }
            (Some("release"), Some(index)) => match index.parse::<usize>() {
                Ok(index) => match session.remove_creature(index) {
                    Ok(creature) => println!("Released {}.", creature.name()),
                    Err(err) => warn!(%err, "cannot release"),
                },
                Err(_) => println!("release needs a roster index"),
            },
            (Some("roster"), _) => {
                if let Some(player) = session.player() {
                    for (index, member) in player.roster.snapshot().iter().enumerate() {
                        let marker = if member.fainted { " (fainted)" } else { "" };
                        println!(
                            "{}: {} HP {}/{} MP {}/{}{}",
                            index, member.name, member.hp, member.max_hp, member.mp, member.max_mp, marker
                        );
                    }
                }
            }
            (Some("bag"), _) => {
                if let Some(player) = session.player() {
                    let bag = player.inventory.snapshot();
                    for (index, item) in bag.items.iter().enumerate() {
                        println!("{}: {}", index, item);
                    }
                    println!("{} coins", bag.coins);
                }
            }
            (Some("save"), _) => {
                let path = session.save_game()?;
                println!("Saved to {}.", path.display());
            }
            (Some("quit"), _) => break,
            (None, _) => {}
            _ => println!("{}", MENU_HELP),
        }
    }

    if session.player().is_some() {
        session.save_game()?;
    }
    Ok(())
}

/// Prints every notification, as text or as JSON lines.
fn subscribe_printers(session: &mut GameSession, json_events: bool) -> Result<()> {
    let engine = session.engine_mut()?;
    for channel in Channel::iter() {
        if json_events {
            engine.subscribe(channel, |notification: &Notification| {
                match serde_json::to_string(notification) {
                    Ok(json) => println!("{}", json),
                    Err(err) => warn!(%err, "could not encode notification"),
                }
            });
        } else {
            engine.subscribe(channel, |notification: &Notification| match notification {
                Notification::Dialogue(line) => println!("{}", line),
                Notification::BattleState(phase) if phase.is_conclusion() => {
                    println!("== {} ==", phase)
                }
                Notification::Moves(moves) => println!("  moves: {}", moves.join(", ")),
                other => println!("  {}", other),
            });
        }
    }
    Ok(())
}

/// Forwards stdin lines to a channel. The channel closes at end of input.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (sender, receiver) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if sender.send(line.trim().to_string()).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    error!(%err, "failed to read stdin");
                    break;
                }
            }
        }
    });
    receiver
}

/// Starts a new game. Returns false if input ended first.
async fn choose_starter(
    session: &mut GameSession,
    lines: &mut mpsc::UnboundedReceiver<String>,
) -> Result<bool> {
    let name = session.config().player_name.clone();
    session.start_new_game(name);
    let creatures = session.data().creature_names();

    loop {
        println!("Choose a starter and a perk (climber, swimmer, rich):");
        println!("  {}", creatures.join(", "));
        let Some(line) = lines.recv().await else {
            return Ok(false);
        };
        let mut words = line.split_whitespace();
        let Some(creature) = words.next() else {
            continue;
        };
        let perk = words
            .next()
            .and_then(|raw| TrainerAbility::from_str(raw).ok())
            .unwrap_or(TrainerAbility::Climber);

        match session.add_starter(creature, perk) {
            Ok(()) => {
                session.save_game()?;
                return Ok(true);
            }
            Err(err) => warn!(%err, "invalid starter"),
        }
    }
}

async fn battle(
    session: &mut GameSession,
    lines: &mut mpsc::UnboundedReceiver<String>,
    policy: PolicyKind,
) -> Result<()> {
    let handle = match session.start_battle(policy) {
        Ok(handle) => handle,
        Err(err) => {
            warn!(%err, "cannot start a battle");
            return Ok(());
        }
    };
    let input = handle.input();
    println!("{}", BATTLE_HELP);

    let finish = session.finish_battle(handle);
    tokio::pin!(finish);
    let mut input_closed = false;
    let report = loop {
        tokio::select! {
            report = &mut finish => break report?,
            line = lines.recv(), if !input_closed => match line {
                Some(line) => dispatch(&input, &line),
                None => input_closed = true,
            },
            // Without a player at the keyboard, run from the battle.
            _ = input.awaiting(), if input_closed => {
                input.select_flee();
            }
        }
    };

    info!(
        outcome = %report.outcome,
        turns = report.turns,
        opponent = %report.opponent,
        "battle finished"
    );
    if report.outcome == BattlePhase::Defeat {
        println!("Type 'heal' to rest your creatures.");
    }
    Ok(())
}

fn dispatch(input: &PlayerInput, line: &str) {
    let (command, argument) = match line.split_once(' ') {
        Some((command, argument)) => (command, argument.trim()),
        None => (line, ""),
    };
    let accepted = match command {
        "move" if !argument.is_empty() => input.select_move(argument),
        "item" => match argument.parse() {
            Ok(index) => input.select_item(index),
            Err(_) => {
                println!("{}", BATTLE_HELP);
                return;
            }
        },
        "switch" => match argument.parse() {
            Ok(index) => input.select_switch(index),
            Err(_) => {
                println!("{}", BATTLE_HELP);
                return;
            }
        },
        "run" => input.select_flee(),
        _ => {
            println!("{}", BATTLE_HELP);
            return;
        }
    };
    if !accepted {
        println!("Wait for your turn.");
    }
}
