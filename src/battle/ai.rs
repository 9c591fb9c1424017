//! Decision policies for autonomous combatants.

use ordered_float::OrderedFloat;
use schema::{MoveCategory, PolicyKind};

use crate::ability::{Ability, AbilityBook};
use crate::battle::action::ActionToken;
use crate::battle::state::TurnRng;
use crate::combatant::Combatant;
use crate::stats::StatBlock;

/// Below this HP percentage an attrition fighter prefers to heal.
const ATTRITION_HEAL_THRESHOLD: i32 = 40;

/// A trait for any system that can pick an autonomous combatant's action.
pub trait Behavior: Send + Sync {
    /// Inspects the actor and its opponent and decides on the next action.
    fn decide_action(
        &self,
        actor: &Combatant,
        opponent: &StatBlock,
        abilities: &AbilityBook,
        rng: &mut TurnRng,
    ) -> ActionToken;
}

/// Picks uniformly among the moves the actor can pay for.
pub struct RandomAI;

/// Always goes for the highest expected damage.
pub struct RecklessAI;

/// Heals when hurt; otherwise gets the most damage out of each MP point.
pub struct AttritionAI;

static RANDOM_AI: RandomAI = RandomAI;
static RECKLESS_AI: RecklessAI = RecklessAI;
static ATTRITION_AI: AttritionAI = AttritionAI;

pub fn behavior_for(policy: PolicyKind) -> &'static dyn Behavior {
    match policy {
        PolicyKind::Random => &RANDOM_AI,
        PolicyKind::Reckless => &RECKLESS_AI,
        PolicyKind::Attrition => &ATTRITION_AI,
    }
}

/// The actor's moves that exist in the book, paired with their definitions.
fn known_abilities<'a>(
    actor: &'a Combatant,
    abilities: &'a AbilityBook,
) -> impl Iterator<Item = &'a Ability> + 'a {
    actor
        .moves()
        .iter()
        .filter_map(move |move_id| abilities.get(move_id).ok())
}

fn attack(ability: &Ability) -> ActionToken {
    ActionToken::Attack {
        move_id: ability.name.clone(),
    }
}

/// When nothing is affordable the first move is used anyway; the resolver
/// will report the MP shortfall.
fn fallback(actor: &Combatant) -> ActionToken {
    ActionToken::Attack {
        move_id: actor.moves().first().cloned().unwrap_or_default(),
    }
}

impl Behavior for RandomAI {
    fn decide_action(
        &self,
        actor: &Combatant,
        _opponent: &StatBlock,
        abilities: &AbilityBook,
        rng: &mut TurnRng,
    ) -> ActionToken {
        let affordable: Vec<&Ability> = known_abilities(actor, abilities)
            .filter(|ability| ability.is_affordable(actor))
            .collect();
        if affordable.is_empty() {
            return fallback(actor);
        }
        let choice = rng.pick_index(affordable.len(), "random policy move");
        attack(affordable[choice])
    }
}

impl Behavior for RecklessAI {
    fn decide_action(
        &self,
        actor: &Combatant,
        opponent: &StatBlock,
        abilities: &AbilityBook,
        rng: &mut TurnRng,
    ) -> ActionToken {
        known_abilities(actor, abilities)
            .filter(|ability| ability.is_affordable(actor))
            .filter(|ability| ability.category == MoveCategory::Damage)
            .max_by_key(|ability| OrderedFloat(ability.expected_damage(actor.stats(), opponent)))
            .map(attack)
            // Nothing to hit with: behave like the random policy
            .unwrap_or_else(|| RANDOM_AI.decide_action(actor, opponent, abilities, rng))
    }
}

impl AttritionAI {
    fn score(&self, ability: &Ability, actor: &Combatant, opponent: &StatBlock) -> f64 {
        let damage = ability.expected_damage(actor.stats(), opponent);
        // One extra point keeps free moves from dividing by zero
        damage / (ability.mp_cost as f64 + 1.0)
    }
}

impl Behavior for AttritionAI {
    fn decide_action(
        &self,
        actor: &Combatant,
        opponent: &StatBlock,
        abilities: &AbilityBook,
        rng: &mut TurnRng,
    ) -> ActionToken {
        let affordable: Vec<&Ability> = known_abilities(actor, abilities)
            .filter(|ability| ability.is_affordable(actor))
            .collect();

        if actor.stats().hp_percent() < ATTRITION_HEAL_THRESHOLD {
            let heal = affordable
                .iter()
                .filter(|ability| ability.category == MoveCategory::Heal)
                .max_by_key(|ability| ability.heal_amount(actor.stats()));
            if let Some(heal) = heal {
                return attack(heal);
            }
        }

        affordable
            .iter()
            .filter(|ability| ability.category == MoveCategory::Damage)
            .max_by_key(|ability| OrderedFloat(self.score(ability, actor, opponent)))
            .map(|ability| attack(ability))
            .unwrap_or_else(|| RANDOM_AI.decide_action(actor, opponent, abilities, rng))
    }
}
