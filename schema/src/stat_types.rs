use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// The numeric stats every combatant carries.
///
/// The serialized form is the column header used in the creature table, so
/// `"MaxHP".parse::<StatKind>()` yields `StatKind::MaxHp`. Any other numeric
/// column in a table is kept as an overflow stat keyed by its raw name.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum StatKind {
    #[strum(serialize = "HP")]
    #[serde(rename = "HP")]
    Hp,
    #[strum(serialize = "MaxHP")]
    #[serde(rename = "MaxHP")]
    MaxHp,
    #[strum(serialize = "MP")]
    #[serde(rename = "MP")]
    Mp,
    #[strum(serialize = "MaxMP")]
    #[serde(rename = "MaxMP")]
    MaxMp,
    Atk,
    Def,
    Agi,
    Coins,
}

impl StatKind {
    /// Stats that track a current value against a ceiling.
    pub fn ceiling(self) -> Option<StatKind> {
        match self {
            StatKind::Hp => Some(StatKind::MaxHp),
            StatKind::Mp => Some(StatKind::MaxMp),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        self.into()
    }
}
