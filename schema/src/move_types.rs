use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// What a move does when it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum MoveCategory {
    Damage,
    Heal,
    Status,
}

/// Who receives a move's effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum MoveTarget {
    #[strum(serialize = "Self")]
    #[serde(rename = "Self")]
    User,
    Enemy,
}

/// The use-effect column of the item table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum ItemEffectKind {
    Heal,
    Capture,
    Boost,
    Revive,
}
