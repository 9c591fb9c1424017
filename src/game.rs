//! Game state around battles.
//!
//! A [`GameSession`] owns the loaded tables, the player's profile and the
//! battle engine. Starting a battle hands the profile and engine to a
//! dedicated task; finishing it takes both back.

use std::path::PathBuf;
use std::sync::Arc;

use schema::{PolicyKind, TrainerAbility};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::ability::AbilityBook;
use crate::battle::engine::{BattleEngine, BattleReport, FinishedBattle};
use crate::battle::input::PlayerInput;
use crate::battle::narration::Narration;
use crate::battle::state::TurnRng;
use crate::combatant::{Combatant, Decision};
use crate::config::GameConfig;
use crate::data::DataProvider;
use crate::errors::{BattleError, DataError, GameError, GameResult};
use crate::player::Player;
use crate::save::SaveStore;

/// Name of the single save slot.
pub const SAVE_NAME: &str = "playerData";

/// A battle running on its own task.
pub struct BattleHandle {
    join: JoinHandle<FinishedBattle>,
    input: PlayerInput,
    opponent: String,
}

impl BattleHandle {
    /// Where the player's actions for this battle go.
    pub fn input(&self) -> PlayerInput {
        self.input.clone()
    }

    pub fn opponent(&self) -> &str {
        &self.opponent
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

pub struct GameSession {
    config: GameConfig,
    data: Arc<DataProvider>,
    abilities: Arc<AbilityBook>,
    narration: Arc<Narration>,
    saves: SaveStore,
    player: Option<Player>,
    // Lent to the battle task while a battle runs
    engine: Option<BattleEngine>,
    rng: TurnRng,
}

impl GameSession {
    /// Loads tables and narration as configured and validates them.
    pub fn new(config: GameConfig) -> GameResult<Self> {
        let data = match &config.data_dir {
            Some(dir) => DataProvider::load(dir)?,
            None => DataProvider::builtin()?,
        };
        let narration = match &config.messages_path {
            Some(path) => Narration::load(path)?,
            None => Narration::default(),
        };
        Self::from_parts(config, data, narration)
    }

    pub fn from_parts(config: GameConfig, data: DataProvider, narration: Narration) -> GameResult<Self> {
        data.validate()?;
        let abilities = Arc::new(data.ability_book()?);
        let data = Arc::new(data);
        let narration = Arc::new(narration);
        let engine = BattleEngine::new(Arc::clone(&data), Arc::clone(&abilities), config.battle.clone())
            .with_narration(Arc::clone(&narration));
        info!(
            creatures = data.creature_names().len(),
            moves = abilities.len(),
            items = data.item_names().len(),
            "game data loaded"
        );

        Ok(Self {
            saves: SaveStore::new(config.save_dir.clone()),
            rng: TurnRng::from_optional_seed(config.battle.seed),
            config,
            data,
            abilities,
            narration,
            player: None,
            engine: Some(engine),
        })
    }

    /// Replaces the randomness used outside battles (opponent picks).
    pub fn with_rng(mut self, rng: TurnRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn data(&self) -> &DataProvider {
        &self.data
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    fn player_mut(&mut self) -> GameResult<&mut Player> {
        self.player.as_mut().ok_or(GameError::NoActiveGame)
    }

    /// The idle engine, for subscribing listeners between battles.
    pub fn engine_mut(&mut self) -> GameResult<&mut BattleEngine> {
        self.engine.as_mut().ok_or(GameError::BattleInProgress)
    }

    pub fn is_battling(&self) -> bool {
        self.engine.is_none()
    }

    /// Starts over with an empty profile.
    pub fn start_new_game(&mut self, name: impl Into<String>) -> &mut Player {
        let player = Player::with_capacities(
            name,
            self.config.roster_capacity,
            self.config.inventory_capacity,
        );
        info!(player = %player.name, "new game started");
        self.player.insert(player)
    }

    pub fn add_starter(&mut self, creature: &str, perk: TrainerAbility) -> GameResult<()> {
        let data = Arc::clone(&self.data);
        self.player_mut()?.add_starter(&data, creature, perk)
    }

    /// Loads the saved profile. Returns false if there is none.
    pub fn continue_game(&mut self) -> GameResult<bool> {
        if self.is_battling() {
            return Err(GameError::BattleInProgress);
        }
        match self.saves.load(SAVE_NAME)? {
            Some(player) => {
                info!(player = %player.name, members = player.roster.len(), "game continued");
                self.player = Some(player);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn has_save(&self) -> bool {
        self.saves.exists(SAVE_NAME)
    }

    pub fn save_game(&self) -> GameResult<PathBuf> {
        let player = self.player.as_ref().ok_or(GameError::NoActiveGame)?;
        Ok(self.saves.save(SAVE_NAME, player)?)
    }

    /// Restores every roster member to full HP and MP.
    pub fn revitalize_roster(&mut self) -> GameResult<()> {
        self.player_mut()?.roster.revitalize_all();
        Ok(())
    }

    pub fn remove_creature(&mut self, index: usize) -> GameResult<Combatant> {
        let removed = self.player_mut()?.roster.remove(index)?;
        info!(creature = %removed.name(), "released from roster");
        Ok(removed)
    }

    /// Spawns a random creature from the tables, driven by `policy`.
    pub fn pick_opponent(&mut self, policy: PolicyKind) -> GameResult<Combatant> {
        let names = self.data.creature_names();
        if names.is_empty() {
            return Err(DataError::UnknownCreature("<no creatures loaded>".to_string()).into());
        }
        let name = &names[self.rng.pick_index(names.len(), "opponent")];
        Ok(self.data.spawn_creature(name, Decision::Autonomous(policy))?)
    }

    /// Starts a battle against a random opponent on a dedicated task.
    pub fn start_battle(&mut self, policy: PolicyKind) -> GameResult<BattleHandle> {
        if self.is_battling() {
            return Err(GameError::BattleInProgress);
        }
        let player = self.player.as_ref().ok_or(GameError::NoActiveGame)?;
        if player.roster.all_fainted() {
            return Err(BattleError::NoConsciousMember.into());
        }
        let opponent = self.pick_opponent(policy)?;
        self.start_battle_against(opponent)
    }

    /// Starts a battle against a given opponent.
    pub fn start_battle_against(&mut self, opponent: Combatant) -> GameResult<BattleHandle> {
        if self.player.is_none() {
            return Err(GameError::NoActiveGame);
        }
        let engine = self.engine.take().ok_or(GameError::BattleInProgress)?;
        let Some(player) = self.player.take() else {
            self.engine = Some(engine);
            return Err(GameError::NoActiveGame);
        };

        info!(opponent = %opponent.name(), decision = ?opponent.decision(), "starting battle");
        let opponent_name = opponent.name().to_string();
        let input = engine.input();
        let join = engine.spawn(player, opponent);
        Ok(BattleHandle {
            join,
            input,
            opponent: opponent_name,
        })
    }

    /// Waits for the battle task and takes back the profile and engine.
    pub async fn finish_battle(&mut self, handle: BattleHandle) -> GameResult<BattleReport> {
        let finished = match handle.join.await {
            Ok(finished) => finished,
            Err(err) => {
                // The profile went down with the task; keep the session usable.
                error!(%err, "battle task failed");
                self.engine = Some(self.fresh_engine());
                return Err(err.into());
            }
        };

        let FinishedBattle {
            engine,
            player,
            result,
        } = finished;
        self.engine = Some(engine);
        self.player = Some(player);
        Ok(result?)
    }

    fn fresh_engine(&self) -> BattleEngine {
        BattleEngine::new(
            Arc::clone(&self.data),
            Arc::clone(&self.abilities),
            self.config.battle.clone(),
        )
        .with_narration(Arc::clone(&self.narration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::tests::common::{test_data, TestCombatantBuilder};
    use crate::config::BattleConfig;
    use crate::errors::RosterError;
    use pretty_assertions::assert_eq;
    use schema::BattlePhase;
    use std::time::Duration;
    use tempfile::TempDir;

    fn session_in(dir: &TempDir) -> GameSession {
        let config = GameConfig {
            battle: BattleConfig::instant(),
            save_dir: dir.path().to_path_buf(),
            ..GameConfig::default()
        };
        GameSession::from_parts(config, test_data(), Narration::default()).unwrap()
    }

    #[test]
    fn test_builtin_session_loads() {
        let session = GameSession::new(GameConfig::default()).unwrap();
        assert!(session.data().creature_names().len() >= 3);
        assert!(session.player().is_none());
    }

    #[test]
    fn test_actions_need_a_game() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);

        assert!(matches!(session.save_game(), Err(GameError::NoActiveGame)));
        assert!(matches!(session.revitalize_roster(), Err(GameError::NoActiveGame)));
        assert!(matches!(
            session.start_battle(PolicyKind::Random),
            Err(GameError::NoActiveGame)
        ));
    }

    #[test]
    fn test_save_then_continue_restores_profile() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        session.start_new_game("Ash");
        session.add_starter("Sprout", TrainerAbility::Rich).unwrap();

        // Act
        session.save_game().unwrap();
        let mut resumed = session_in(&dir);
        let found = resumed.continue_game().unwrap();

        // Assert
        assert!(found);
        assert_eq!(resumed.player(), session.player());
        assert_eq!(resumed.player().unwrap().inventory.coins(), 1000);
    }

    #[test]
    fn test_continue_without_save_is_false() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        assert!(!session.has_save());
        assert!(!session.continue_game().unwrap());
        assert!(session.player().is_none());
    }

    #[test]
    fn test_opponent_is_a_random_autonomous_creature() {
        let dir = tempfile::tempdir().unwrap();
        // Names sort as Brute, Sprout
        let mut session = session_in(&dir).with_rng(TurnRng::new_for_test(vec![1]));

        let opponent = session.pick_opponent(PolicyKind::Attrition).unwrap();

        assert_eq!(opponent.name(), "Sprout");
        assert_eq!(opponent.decision(), Decision::Autonomous(PolicyKind::Attrition));
    }

    #[test]
    fn test_fainted_roster_cannot_battle_and_can_be_revitalized() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        session.start_new_game("Ash");
        session.add_starter("Sprout", TrainerAbility::Climber).unwrap();
        session.player_mut().unwrap().roster[0].kill_immediately();

        assert!(matches!(
            session.start_battle(PolicyKind::Random),
            Err(GameError::Battle(BattleError::NoConsciousMember))
        ));
        assert!(session.player().is_some());

        session.revitalize_roster().unwrap();
        assert!(!session.player().unwrap().roster.all_fainted());
    }

    #[test]
    fn test_last_creature_cannot_be_released() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        session.start_new_game("Ash");
        session.add_starter("Sprout", TrainerAbility::Swimmer).unwrap();

        assert!(matches!(
            session.remove_creature(0),
            Err(GameError::Roster(RosterError::LastMember))
        ));
    }

    #[tokio::test]
    async fn test_battle_lends_and_returns_player_and_engine() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        session.start_new_game("Ash");
        session.add_starter("Sprout", TrainerAbility::Climber).unwrap();
        let opponent = TestCombatantBuilder::new("Wildling").autonomous().build();

        // Act
        let handle = session.start_battle_against(opponent).unwrap();
        assert!(session.is_battling());
        assert!(session.player().is_none());
        assert!(matches!(
            session.start_battle(PolicyKind::Random),
            Err(GameError::BattleInProgress)
        ));

        let input = handle.input();
        tokio::time::timeout(Duration::from_secs(5), input.awaiting())
            .await
            .unwrap();
        assert!(input.select_flee());
        let report = session.finish_battle(handle).await.unwrap();

        // Assert
        assert_eq!(report.outcome, BattlePhase::Draw);
        assert_eq!(report.opponent, "Wildling");
        assert!(!session.is_battling());
        assert_eq!(session.player().unwrap().name, "Ash");
        assert!(session.engine_mut().is_ok());
    }
}
