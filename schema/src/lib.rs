// creature-arena schema - shared vocabulary
// The data tables, the engine and any presentation layer all agree on these
// names. Each enum parses from (and prints as) the exact string used in the
// table files.

pub use battle_data::*;
pub use move_types::*;
pub use stat_types::*;

pub mod battle_data;
pub mod move_types;
pub mod stat_types;
