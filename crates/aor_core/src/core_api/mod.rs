mod engine;
mod error;
mod lookup;
mod types;
mod views;

pub use engine::{Engine, Session};
pub use error::{CoreError, CoreErrorCode};
pub use lookup::{LookupKind, LookupTable, LookupTables};
pub use types::{
    AddonEntry, CharacterSearch, CharacterSheet, CharacterSummary, CounterEntry, GameBar,
    GaugeEntry, ItemEntry, LeveledEntry, StatEntry, TraitEntry, WeaponMasteryEntry,
};
