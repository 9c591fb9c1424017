//! The battle loop.
//!
//! One engine runs one battle at a time on its own task. Turns alternate
//! between the player's active creature (even turns) and the opponent (odd
//! turns). Every resolved action takes one turn slot; replacing a fainted
//! creature does not. Each state change is published on the notification
//! bus, and narrated steps are followed by a pacing pause.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use schema::{BattlePhase, Side};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::ability::AbilityBook;
use crate::battle::action::ActionToken;
use crate::battle::events::{Channel, Listener, ListenerId, Notification, NotificationBus};
use crate::battle::input::PlayerInput;
use crate::battle::narration::Narration;
use crate::battle::state::{BattleSession, TurnRng};
use crate::combatant::{Combatant, DecisionContext};
use crate::config::BattleConfig;
use crate::data::DataProvider;
use crate::errors::{BattleError, BattleResult};
use crate::item::{ItemOutcome, ItemTarget};
use crate::player::Player;

/// Summary of a finished battle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleReport {
    pub outcome: BattlePhase,
    pub turns: u32,
    pub opponent: String,
    /// Loot item that made it into the bag.
    pub loot: Option<String>,
    pub coins: u32,
    pub captured: bool,
}

/// What a spawned battle hands back when its task ends.
///
/// The engine keeps its listeners, so it can be reused for the next battle.
/// The player is returned even when the battle failed.
pub struct FinishedBattle {
    pub engine: BattleEngine,
    pub player: Player,
    pub result: BattleResult<BattleReport>,
}

pub struct BattleEngine {
    data: Arc<DataProvider>,
    abilities: Arc<AbilityBook>,
    narration: Arc<Narration>,
    config: BattleConfig,
    bus: NotificationBus,
    input: PlayerInput,
    rng: TurnRng,
}

impl fmt::Debug for BattleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BattleEngine")
            .field("config", &self.config)
            .field("bus", &self.bus)
            .field("input", &self.input)
            .finish()
    }
}

async fn pace(pacing: Duration) {
    if !pacing.is_zero() {
        tokio::time::sleep(pacing).await;
    }
}

impl BattleEngine {
    pub fn new(data: Arc<DataProvider>, abilities: Arc<AbilityBook>, config: BattleConfig) -> Self {
        let rng = TurnRng::from_optional_seed(config.seed);
        Self {
            data,
            abilities,
            narration: Arc::new(Narration::default()),
            config,
            bus: NotificationBus::new(),
            input: PlayerInput::new(),
            rng,
        }
    }

    pub fn with_narration(mut self, narration: Arc<Narration>) -> Self {
        self.narration = narration;
        self
    }

    pub fn with_rng(mut self, rng: TurnRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn bus_mut(&mut self) -> &mut NotificationBus {
        &mut self.bus
    }

    pub fn subscribe(&mut self, channel: Channel, listener: impl Listener + 'static) -> ListenerId {
        self.bus.subscribe(channel, listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Handle through which the player's actions reach the battle.
    pub fn input(&self) -> PlayerInput {
        self.input.clone()
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Runs the battle on its own task, which owns the player until the
    /// battle ends.
    pub fn spawn(mut self, mut player: Player, opponent: Combatant) -> JoinHandle<FinishedBattle> {
        tokio::spawn(async move {
            let result = self.run(&mut player, opponent).await;
            if let Err(err) = &result {
                error!(%err, "battle aborted");
            }
            FinishedBattle {
                engine: self,
                player,
                result,
            }
        })
    }

    /// Runs a battle to its conclusion.
    pub async fn run(&mut self, player: &mut Player, opponent: Combatant) -> BattleResult<BattleReport> {
        let mut session = BattleSession::new(player, opponent)?;
        info!(
            player = %session.active().name(),
            opponent = %session.opponent.name(),
            "battle started"
        );
        self.set_up(&session).await;

        while !session.is_over() {
            let side = session.acting_side();
            let actor = session.combatant(side).name().to_string();
            self.say(self.narration.turn_start(&actor));

            let action = self.select_action(&session, side).await?;
            self.validate_action(&session, side, &action)?;
            debug!(turn = session.turn, %side, %actor, %action, "action chosen");

            match action {
                ActionToken::Attack { move_id } => {
                    self.resolve_attack(&mut session, side, &move_id).await?
                }
                ActionToken::UseItem { index } => self.resolve_item(&mut session, index).await?,
                ActionToken::Switch { roster_index } => {
                    self.switch_to(&mut session, roster_index).await
                }
                ActionToken::Flee => return Ok(self.flee(session).await),
            }
            session.turn += 1;
        }

        self.conclude(session).await
    }

    async fn set_up(&mut self, session: &BattleSession<'_>) {
        self.publish_stats(session);
        self.publish(Notification::Moves(session.active().moves().to_vec()));
        self.publish(Notification::Sprite {
            side: Side::Player,
            name: session.active().name().to_string(),
        });
        self.publish(Notification::Sprite {
            side: Side::Opponent,
            name: session.opponent.name().to_string(),
        });
        self.publish_roster(session);
        self.publish_inventory(session);
        self.publish(Notification::BattleState(BattlePhase::Start));
        self.say(self.narration.battle_start(session.opponent.name()));
        pace(self.config.pacing).await;
    }

    async fn select_action(
        &mut self,
        session: &BattleSession<'_>,
        side: Side,
    ) -> BattleResult<ActionToken> {
        let actor = session.combatant(side);
        let opponent = session.combatant(side.opposite()).stats();
        let ctx = DecisionContext {
            input: &self.input,
            abilities: self.abilities.as_ref(),
            rng: &mut self.rng,
        };
        actor.select_action(opponent, ctx).await
    }

    fn validate_action(
        &self,
        session: &BattleSession<'_>,
        side: Side,
        action: &ActionToken,
    ) -> BattleResult<()> {
        let actor = session.combatant(side);
        if side == Side::Opponent && action.is_player_only() {
            return Err(BattleError::ActionNotAllowed {
                actor: actor.name().to_string(),
                action: action.to_string(),
            });
        }

        match action {
            ActionToken::Attack { move_id } => {
                if !actor.knows_move(move_id) {
                    return Err(BattleError::MoveNotKnown {
                        actor: actor.name().to_string(),
                        move_id: move_id.clone(),
                    });
                }
                self.abilities.get(move_id)?;
            }
            ActionToken::UseItem { index } => {
                let len = session.player.inventory.len();
                if *index >= len {
                    return Err(BattleError::InvalidItemIndex { index: *index, len });
                }
            }
            ActionToken::Switch { roster_index } => {
                let reason = match session.player.roster.get(*roster_index) {
                    None => Some("no roster member at that index"),
                    Some(member) if member.is_fainted() => Some("that member has fainted"),
                    Some(_) if *roster_index == session.active => Some("that member is already active"),
                    Some(_) => None,
                };
                if let Some(reason) = reason {
                    return Err(BattleError::InvalidSwitchTarget {
                        index: *roster_index,
                        reason,
                    });
                }
            }
            ActionToken::Flee => {}
        }
        Ok(())
    }

    async fn resolve_attack(
        &mut self,
        session: &mut BattleSession<'_>,
        side: Side,
        move_id: &str,
    ) -> BattleResult<()> {
        let abilities = Arc::clone(&self.abilities);
        let ability = abilities.get(move_id)?;
        let actor = session.combatant(side).name().to_string();

        self.say(self.narration.attack(&actor, move_id));
        pace(self.config.pacing).await;

        let (attacker, defender) = session.actor_and_target(side);
        let outcome = ability.execute(defender, attacker, &mut self.rng);
        debug!(
            %actor,
            ability = %ability.name,
            ?outcome,
            magnitude = outcome.signed_magnitude(),
            "move resolved"
        );

        self.say(self.narration.move_outcome(&actor, &outcome));
        self.publish_stats(session);
        pace(self.config.pacing).await;

        if session.active().is_fainted() {
            self.replace_fainted(session).await;
        }
        Ok(())
    }

    /// Narrates the player's fallen creature and sends in the next
    /// conscious one, if any. Does not take a turn slot.
    async fn replace_fainted(&mut self, session: &mut BattleSession<'_>) {
        let fallen = session.active().name().to_string();
        self.say(self.narration.fainted(&fallen));
        pace(self.config.pacing).await;

        if let Some(next) = session.player.roster.first_alive() {
            debug!(%fallen, next, "replacing fainted creature");
            self.switch_to(session, next).await;
        }
        self.publish_roster(session);
    }

    async fn switch_to(&mut self, session: &mut BattleSession<'_>, roster_index: usize) {
        session.active = roster_index;
        let active = session.active();
        let name = active.name().to_string();

        self.publish(Notification::Moves(active.moves().to_vec()));
        self.publish(Notification::Sprite {
            side: Side::Player,
            name: name.clone(),
        });
        self.publish(Notification::Stats {
            side: Side::Player,
            stats: active.stat_snapshot(),
        });
        self.say(self.narration.switch(&name));
        pace(self.config.pacing).await;
    }

    async fn resolve_item(&mut self, session: &mut BattleSession<'_>, index: usize) -> BattleResult<()> {
        let len = session.player.inventory.len();
        let item = session
            .player
            .inventory
            .remove_item(index)
            .map_err(|_| BattleError::InvalidItemIndex { index, len })?;

        self.say(self.narration.item(&item.name));
        self.publish_inventory(session);
        pace(self.config.pacing).await;

        let outcome = {
            let BattleSession {
                player,
                opponent,
                active,
                ..
            } = &mut *session;
            let target = ItemTarget {
                roster: &mut player.roster,
                active: *active,
                enemy: opponent,
            };
            item.apply(target, &mut self.rng)
        };
        debug!(item = %item.name, ?outcome, "item used");

        let line = self.narration.item_outcome(
            session.active().name(),
            session.opponent.name(),
            &outcome,
        );
        self.say(line);

        if outcome.ends_battle() {
            session.captured = true;
            session.opponent.kill_immediately();
        }
        if outcome.ends_battle() || matches!(outcome, ItemOutcome::Revived(_)) {
            self.publish_roster(session);
        }
        self.publish_stats(session);
        pace(self.config.pacing).await;
        Ok(())
    }

    async fn flee(&mut self, session: BattleSession<'_>) -> BattleReport {
        self.say(self.narration.run());
        pace(self.config.pacing).await;
        self.publish(Notification::BattleState(BattlePhase::Draw));
        info!(turns = session.turn, "player fled");

        BattleReport {
            outcome: BattlePhase::Draw,
            turns: session.turn,
            opponent: session.opponent.name().to_string(),
            loot: None,
            coins: 0,
            captured: false,
        }
    }

    async fn conclude(&mut self, mut session: BattleSession<'_>) -> BattleResult<BattleReport> {
        let mut report = BattleReport {
            outcome: BattlePhase::Defeat,
            turns: session.turn,
            opponent: session.opponent.name().to_string(),
            loot: None,
            coins: 0,
            captured: session.captured,
        };

        if session.opponent.hp() <= 0 {
            if !session.captured {
                self.say(self.narration.fainted(session.opponent.name()));
                pace(self.config.pacing).await;
            }
            self.say(self.narration.victory());
            pace(self.config.pacing).await;

            let (loot, coins) = self.grant_loot(&mut session)?;
            report.loot = loot;
            report.coins = coins;
            pace(self.config.pacing).await;
            report.outcome = BattlePhase::Victory;
        } else {
            self.say(self.narration.all_fainted());
            pace(self.config.pacing).await;
            self.say(self.narration.defeat());
            pace(self.config.pacing).await;
        }

        self.publish(Notification::BattleState(report.outcome));
        info!(outcome = %report.outcome, turns = report.turns, "battle concluded");
        Ok(report)
    }

    /// Moves the opponent's loot item (if the bag has room) and coins to
    /// the player.
    fn grant_loot(&mut self, session: &mut BattleSession<'_>) -> BattleResult<(Option<String>, u32)> {
        let opponent = session.opponent.name().to_string();
        let coins = session.opponent.stats().coins.max(0) as u32;
        let mut granted = None;

        let line = match session.opponent.loot().map(str::to_string) {
            Some(loot) => {
                let item = self.data.item(&loot)?;
                match session.player.inventory.add_item(item) {
                    Ok(()) => {
                        let line = self.narration.loot(&opponent, Some(&loot), coins);
                        granted = Some(loot);
                        line
                    }
                    Err(err) => {
                        info!(%loot, %err, "loot left behind");
                        self.say(self.narration.loot_no_room(&loot));
                        self.narration.loot(&opponent, None, coins)
                    }
                }
            }
            None => self.narration.loot(&opponent, None, coins),
        };

        session.player.inventory.add_coins(coins);
        self.say(line);
        self.publish_inventory(session);
        Ok((granted, coins))
    }

    fn publish(&mut self, notification: Notification) {
        self.bus.publish(notification);
    }

    fn say(&mut self, line: String) {
        debug!(%line, "dialogue");
        self.publish(Notification::Dialogue(line));
    }

    fn publish_stats(&mut self, session: &BattleSession<'_>) {
        self.publish(Notification::Stats {
            side: Side::Player,
            stats: session.active().stat_snapshot(),
        });
        self.publish(Notification::Stats {
            side: Side::Opponent,
            stats: session.opponent.stat_snapshot(),
        });
    }

    fn publish_roster(&mut self, session: &BattleSession<'_>) {
        self.publish(Notification::Roster(session.player.roster.snapshot()));
    }

    fn publish_inventory(&mut self, session: &BattleSession<'_>) {
        self.publish(Notification::Inventory(session.player.inventory.snapshot()));
    }
}
