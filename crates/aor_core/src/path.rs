//! Identifiers for edited locations in a save document.
//!
//! Paths are plain values ordered and compared structurally; the dotted string
//! form only exists for display and export.

use std::fmt;

use crate::schema::{CharacterList, NestedObject, PositionalArray};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldPath {
    Game {
        key: String,
    },
    GameTime {
        key: String,
    },
    Character {
        npc_id: i64,
        path: CharacterPath,
    },
    Party {
        change: ListChange,
        member_id: i64,
        stamp: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CharacterPath {
    Field(CharacterField),
    List {
        list: CharacterList,
        change: ListChange,
        entity_id: Option<i64>,
        stamp: u64,
    },
}

/// A single settable location on a character record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CharacterField {
    Scalar {
        key: String,
    },
    Nested {
        parent: NestedObject,
        key: String,
    },
    Positional {
        array: PositionalArray,
        index: usize,
    },
    Record {
        list: CharacterList,
        index: usize,
        key: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ListChange {
    Add,
    Remove,
}

impl ListChange {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

impl FieldPath {
    pub fn game(key: impl Into<String>) -> Self {
        Self::Game { key: key.into() }
    }

    pub fn game_time(key: impl Into<String>) -> Self {
        Self::GameTime { key: key.into() }
    }

    pub fn character(npc_id: i64, field: CharacterField) -> Self {
        Self::Character {
            npc_id,
            path: CharacterPath::Field(field),
        }
    }

    /// Structural entries are never reconciled back to clean.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Party { .. }
                | Self::Character {
                    path: CharacterPath::List { .. },
                    ..
                }
        )
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Game { key } => write!(f, "game.{key}"),
            Self::GameTime { key } => write!(f, "gameTime.{key}"),
            Self::Character { npc_id, path } => write!(f, "npc.{npc_id}.{path}"),
            Self::Party {
                change,
                member_id,
                stamp,
            } => write!(f, "party.{}.{member_id}.{stamp}", change.as_str()),
        }
    }
}

impl fmt::Display for CharacterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(field) => fmt::Display::fmt(field, f),
            Self::List {
                list,
                change,
                entity_id,
                stamp,
            } => {
                write!(f, "{}.{}.", list.key(), change.as_str())?;
                match entity_id {
                    Some(id) => write!(f, "{id}")?,
                    None => f.write_str("?")?,
                }
                write!(f, ".{stamp}")
            }
        }
    }
}

impl fmt::Display for CharacterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar { key } => f.write_str(key),
            Self::Nested { parent, key } => write!(f, "{}.{key}", parent.key()),
            Self::Positional { array, index } => write!(f, "{}.{index}", array.key()),
            Self::Record { list, index, key } => write!(f, "{}.{index}.{key}", list.key()),
        }
    }
}
