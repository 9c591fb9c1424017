use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use schema::Side;

use crate::combatant::Combatant;
use crate::errors::{BattleError, BattleResult};
use crate::player::Player;

/// Source of every random roll made during a battle.
///
/// Production battles draw from a seeded or OS-seeded generator. Tests
/// script the exact outcomes instead, and the generator panics if a test
/// consumes more rolls than it scripted.
#[derive(Debug, Clone)]
pub struct TurnRng {
    source: RngSource,
}

#[derive(Debug, Clone)]
enum RngSource {
    Generated(StdRng),
    Scripted { outcomes: Vec<u8>, index: usize },
}

impl TurnRng {
    pub fn new_for_test(outcomes: Vec<u8>) -> Self {
        Self {
            source: RngSource::Scripted { outcomes, index: 0 },
        }
    }

    pub fn new_random() -> Self {
        Self {
            source: RngSource::Generated(StdRng::from_os_rng()),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            source: RngSource::Generated(StdRng::seed_from_u64(seed)),
        }
    }

    /// Seeded when a seed is configured, OS-seeded otherwise.
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::new_random, Self::from_seed)
    }

    fn next_outcome(&mut self, reason: &str) -> u8 {
        match &mut self.source {
            RngSource::Generated(rng) => rng.random_range(0..100),
            RngSource::Scripted { outcomes, index } => {
                if *index >= outcomes.len() {
                    panic!(
                        "TurnRng exhausted! Tried to get a value for: '{}'. Need more random values.",
                        reason
                    );
                }
                let outcome = outcomes[*index];

                #[cfg(test)]
                println!("[RNG] Consumed {} for: {}", outcome, reason);

                *index += 1;
                outcome
            }
        }
    }

    /// A roll in `[0, 100)`. Compare with `roll < chance` for a percent check.
    pub fn roll_percent(&mut self, reason: &str) -> u8 {
        self.next_outcome(reason).min(99)
    }

    /// An index in `[0, len)`. `len` must be non-zero.
    pub fn pick_index(&mut self, len: usize, reason: &str) -> usize {
        if let RngSource::Generated(rng) = &mut self.source {
            return rng.random_range(0..len);
        }
        self.next_outcome(reason) as usize % len
    }
}

/// The mutable state of one battle: the player's side, the opponent and
/// the turn counter.
///
/// The turn counter's parity decides who acts: even turns belong to the
/// player's active combatant, odd turns to the opponent.
pub struct BattleSession<'a> {
    pub player: &'a mut Player,
    pub opponent: Combatant,
    pub active: usize,
    pub turn: u32,
    pub captured: bool,
}

impl<'a> BattleSession<'a> {
    /// Opens a session with the first conscious roster member active.
    pub fn new(player: &'a mut Player, opponent: Combatant) -> BattleResult<Self> {
        let active = player
            .roster
            .first_alive()
            .ok_or(BattleError::NoConsciousMember)?;
        Ok(Self {
            player,
            opponent,
            active,
            turn: 0,
            captured: false,
        })
    }

    pub fn acting_side(&self) -> Side {
        if self.turn % 2 == 0 {
            Side::Player
        } else {
            Side::Opponent
        }
    }

    pub fn active(&self) -> &Combatant {
        &self.player.roster[self.active]
    }

    pub fn combatant(&self, side: Side) -> &Combatant {
        match side {
            Side::Player => self.active(),
            Side::Opponent => &self.opponent,
        }
    }

    /// The acting combatant and its target, both mutable.
    pub fn actor_and_target(&mut self, actor: Side) -> (&mut Combatant, &mut Combatant) {
        let active = &mut self.player.roster[self.active];
        let opponent = &mut self.opponent;
        match actor {
            Side::Player => (active, opponent),
            Side::Opponent => (opponent, active),
        }
    }

    pub fn is_over(&self) -> bool {
        self.opponent.hp() <= 0 || self.player.roster.all_fainted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::tests::common::{test_player, TestCombatantBuilder};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scripted_rolls_are_replayed_in_order() {
        let mut rng = TurnRng::new_for_test(vec![5, 150, 7]);
        assert_eq!(rng.roll_percent("first"), 5);
        assert_eq!(rng.roll_percent("clamped"), 99);
        assert_eq!(rng.pick_index(4, "index"), 3);
    }

    #[test]
    #[should_panic(expected = "TurnRng exhausted")]
    fn test_scripted_rng_panics_when_exhausted() {
        let mut rng = TurnRng::new_for_test(vec![]);
        rng.roll_percent("nothing left");
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = TurnRng::from_seed(42);
        let mut b = TurnRng::from_seed(42);
        let rolls_a: Vec<u8> = (0..20).map(|_| a.roll_percent("a")).collect();
        let rolls_b: Vec<u8> = (0..20).map(|_| b.roll_percent("b")).collect();
        assert_eq!(rolls_a, rolls_b);
        assert!(rolls_a.iter().all(|roll| *roll < 100));
    }

    #[test]
    fn test_session_starts_with_first_conscious_member() {
        let mut fainted = TestCombatantBuilder::new("Down").build();
        fainted.kill_immediately();
        let mut player = test_player(vec![fainted, TestCombatantBuilder::new("Up").build()]);

        let session =
            BattleSession::new(&mut player, TestCombatantBuilder::new("Wild").build()).unwrap();

        assert_eq!(session.active, 1);
        assert_eq!(session.active().name(), "Up");
        assert_eq!(session.acting_side(), Side::Player);
    }

    #[test]
    fn test_session_requires_conscious_member() {
        let mut fainted = TestCombatantBuilder::new("Down").build();
        fainted.kill_immediately();
        let mut player = test_player(vec![fainted]);

        let result = BattleSession::new(&mut player, TestCombatantBuilder::new("Wild").build());
        assert!(matches!(result, Err(BattleError::NoConsciousMember)));
    }
}
