//! Field writes against a save document, reported to the dirty tracker.
//!
//! Every write goes through [`FieldMutator`] so the tracker sees the old and
//! new value of each location. Missing nested objects make a write a no-op
//! (`EditOutcome::Skipped`); missing arrays are created on demand.

use tracing::trace;

use crate::core_api::{CoreError, CoreErrorCode};
use crate::path::{CharacterField, CharacterPath, FieldPath, ListChange};
use crate::schema::{
    self, CharacterList, FieldKind, MAX_POSITIONAL_LEN, NestedObject, PositionalArray, coerce_flag,
    coerce_number,
};
use crate::tracker::DirtyTracker;
use crate::value::{Fields, SaveValue};

const NPCS_KEY: &str = "npcs";
const ID_KEY: &str = "id";
const GAME_TIME_KEY: &str = "gameTime";
const PARTY_KEY: &str = "party";
const PARTY_MEMBERS_KEY: &str = "membersID";
const TOP_LEVEL_KEYS: [&str; 2] = ["wealth", "reputation"];

/// Where a scalar write lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldTarget {
    Game { key: String },
    GameTime { key: String },
    /// A field on the character at `index` in `npcs`.
    Character { index: usize, field: CharacterField },
}

impl FieldTarget {
    pub fn game(key: impl Into<String>) -> Self {
        Self::Game { key: key.into() }
    }

    pub fn game_time(key: impl Into<String>) -> Self {
        Self::GameTime { key: key.into() }
    }

    pub fn scalar(index: usize, key: impl Into<String>) -> Self {
        Self::Character {
            index,
            field: CharacterField::Scalar { key: key.into() },
        }
    }

    pub fn nested(index: usize, parent: NestedObject, key: impl Into<String>) -> Self {
        Self::Character {
            index,
            field: CharacterField::Nested {
                parent,
                key: key.into(),
            },
        }
    }

    pub fn positional(index: usize, array: PositionalArray, position: usize) -> Self {
        Self::Character {
            index,
            field: CharacterField::Positional {
                array,
                index: position,
            },
        }
    }

    pub fn record(
        index: usize,
        list: CharacterList,
        position: usize,
        key: impl Into<String>,
    ) -> Self {
        Self::Character {
            index,
            field: CharacterField::Record {
                list,
                index: position,
                key: key.into(),
            },
        }
    }

    /// Parses a dotted field spec such as `wealth`, `gameTime.day`, `level`,
    /// `humanAttribute.BSstrength`, `weaponMastery.2` or `spells.0.lv`.
    /// Character fields need `character` to be the target's npc index.
    pub fn parse_spec(spec: &str, character: Option<usize>) -> Result<Self, CoreError> {
        let spec = spec.trim();
        let parts: Vec<&str> = spec.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(invalid_spec(spec, "empty path segment"));
        }

        match parts.as_slice() {
            ["game", key] => return Ok(Self::game(*key)),
            [key] if TOP_LEVEL_KEYS.contains(key) => return Ok(Self::game(*key)),
            ["gameTime", key] => return Ok(Self::game_time(*key)),
            _ => {}
        }

        let index = character.ok_or_else(|| {
            CoreError::new(
                CoreErrorCode::NotFound,
                format!("field '{spec}' needs a selected character"),
            )
        })?;

        let field = match parts.as_slice() {
            [key] => CharacterField::Scalar {
                key: (*key).to_string(),
            },
            [head, tail] => {
                if let Some(parent) = NestedObject::from_key(head) {
                    CharacterField::Nested {
                        parent,
                        key: (*tail).to_string(),
                    }
                } else if let Some(array) = PositionalArray::from_key(head) {
                    CharacterField::Positional {
                        array,
                        index: parse_position(spec, tail)?,
                    }
                } else {
                    return Err(invalid_spec(spec, "unknown nested object or array"));
                }
            }
            [head, position, key] => {
                let list = CharacterList::from_key(head)
                    .filter(|list| *list != CharacterList::Traits)
                    .ok_or_else(|| invalid_spec(spec, "unknown record list"))?;
                CharacterField::Record {
                    list,
                    index: parse_position(spec, position)?,
                    key: (*key).to_string(),
                }
            }
            _ => return Err(invalid_spec(spec, "too many path segments")),
        };

        Ok(Self::Character { index, field })
    }

    /// How raw text input for this target is coerced.
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Game { key } | Self::GameTime { key } => schema::field_kind(key),
            Self::Character { field, .. } => match field {
                CharacterField::Scalar { key }
                | CharacterField::Nested { key, .. }
                | CharacterField::Record { key, .. } => schema::field_kind(key),
                CharacterField::Positional { .. } => FieldKind::Number,
            },
        }
    }

    /// Converts raw form text into the value this target stores.
    pub fn coerce(&self, raw: &str) -> SaveValue {
        match self.kind() {
            FieldKind::Number => SaveValue::Number(coerce_number(raw)),
            FieldKind::Text => SaveValue::String(raw.to_string()),
            FieldKind::Flag => SaveValue::Bool(coerce_flag(raw)),
        }
    }
}

fn parse_position(spec: &str, raw: &str) -> Result<usize, CoreError> {
    raw.parse::<usize>()
        .map_err(|_| invalid_spec(spec, "array index must be a non-negative integer"))
}

fn invalid_spec(spec: &str, reason: &str) -> CoreError {
    CoreError::new(
        CoreErrorCode::UnsupportedOperation,
        format!("invalid field '{spec}': {reason}"),
    )
}

/// A completed scalar write.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEdit {
    pub path: FieldPath,
    pub old: SaveValue,
    pub new: SaveValue,
    /// Whether the path is pending after this write.
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    Applied(FieldEdit),
    /// A list or party change, tracked under this path.
    Structural(FieldPath),
    /// The location does not exist in this save; nothing was written.
    Skipped,
}

impl EditOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Self::Applied(edit) => Some(&edit.path),
            Self::Structural(path) => Some(path),
            Self::Skipped => None,
        }
    }
}

/// Inventory slot to append with [`FieldMutator::add_item`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewItem {
    pub id: i64,
    pub stack_num: f64,
    pub quality: f64,
    pub durability: f64,
}

impl NewItem {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            stack_num: 1.0,
            quality: 0.0,
            durability: 100.0,
        }
    }
}

pub struct FieldMutator<'a> {
    document: &'a mut SaveValue,
    tracker: &'a mut DirtyTracker,
}

impl<'a> FieldMutator<'a> {
    pub fn new(document: &'a mut SaveValue, tracker: &'a mut DirtyTracker) -> Self {
        Self { document, tracker }
    }

    pub fn set_text(&mut self, target: &FieldTarget, raw: &str) -> Result<EditOutcome, CoreError> {
        let value = target.coerce(raw);
        self.set(target, value)
    }

    pub fn set(&mut self, target: &FieldTarget, value: SaveValue) -> Result<EditOutcome, CoreError> {
        match target {
            FieldTarget::Game { key } => {
                let Some(root) = self.document.as_object_mut() else {
                    return Ok(EditOutcome::Skipped);
                };
                let old = replace_scalar(root, key, value.clone())?;
                Ok(self.commit(FieldPath::game(key.as_str()), old, value))
            }
            FieldTarget::GameTime { key } => {
                let Some(game_time) = self
                    .document
                    .get_mut(GAME_TIME_KEY)
                    .and_then(SaveValue::as_object_mut)
                else {
                    return Ok(EditOutcome::Skipped);
                };
                let old = replace_scalar(game_time, key, value.clone())?;
                Ok(self.commit(FieldPath::game_time(key.as_str()), old, value))
            }
            FieldTarget::Character { index, field } => {
                let (record, npc_id) = character_mut(self.document, *index)?;
                let Some(old) = write_character_field(record, field, value.clone())? else {
                    return Ok(EditOutcome::Skipped);
                };
                Ok(self.commit(FieldPath::character(npc_id, field.clone()), old, value))
            }
        }
    }

    pub fn add_spell(&mut self, index: usize, spell_id: i64) -> Result<EditOutcome, CoreError> {
        self.append(index, CharacterList::Spells, leveled_record(spell_id))
    }

    pub fn add_talent(&mut self, index: usize, talent_id: i64) -> Result<EditOutcome, CoreError> {
        self.append(index, CharacterList::Talents, leveled_record(talent_id))
    }

    pub fn add_trait(&mut self, index: usize, trait_id: i64) -> Result<EditOutcome, CoreError> {
        self.append(index, CharacterList::Traits, SaveValue::from(trait_id))
    }

    pub fn add_item(&mut self, index: usize, item: NewItem) -> Result<EditOutcome, CoreError> {
        let (record, _) = character_mut(self.document, index)?;
        let next_slot = list_mut(record, CharacterList::Items)
            .iter()
            .filter_map(|slot| slot.get("slotIndex").and_then(SaveValue::as_i64))
            .max()
            .map_or(0, |highest| highest + 1);

        let mut entry = Fields::new();
        entry.insert(ID_KEY, SaveValue::from(item.id));
        entry.insert("slotIndex", SaveValue::from(next_slot));
        entry.insert("stackNum", SaveValue::Number(item.stack_num));
        entry.insert("quality", SaveValue::Number(item.quality));
        entry.insert("durability", SaveValue::Number(item.durability));
        entry.insert("addAttrs", SaveValue::Array(Vec::new()));
        self.append(index, CharacterList::Items, SaveValue::Object(entry))
    }

    /// Appends `entry` to a character list, creating the list when absent.
    pub fn append(
        &mut self,
        index: usize,
        list: CharacterList,
        entry: SaveValue,
    ) -> Result<EditOutcome, CoreError> {
        let (record, npc_id) = character_mut(self.document, index)?;
        let entity_id = entity_id(&entry);
        list_mut(record, list).push(entry);

        let stamp = self.tracker.next_stamp();
        Ok(self.commit_structural(FieldPath::Character {
            npc_id,
            path: CharacterPath::List {
                list,
                change: ListChange::Add,
                entity_id,
                stamp,
            },
        }))
    }

    /// Splices out the entry at `position`; later entries shift down by one.
    pub fn remove(
        &mut self,
        index: usize,
        list: CharacterList,
        position: usize,
    ) -> Result<EditOutcome, CoreError> {
        let (record, npc_id) = character_mut(self.document, index)?;
        let entries = list_mut(record, list);
        if position >= entries.len() {
            return Ok(EditOutcome::Skipped);
        }
        let removed = entries.remove(position);

        let stamp = self.tracker.next_stamp();
        Ok(self.commit_structural(FieldPath::Character {
            npc_id,
            path: CharacterPath::List {
                list,
                change: ListChange::Remove,
                entity_id: entity_id(&removed),
                stamp,
            },
        }))
    }

    pub fn add_party_member(&mut self, member_id: i64) -> Result<EditOutcome, CoreError> {
        let Some(members) = party_members_mut(self.document) else {
            return Ok(EditOutcome::Skipped);
        };
        if members.iter().any(|m| m.as_i64() == Some(member_id)) {
            return Ok(EditOutcome::Skipped);
        }
        members.push(SaveValue::from(member_id));

        let stamp = self.tracker.next_stamp();
        Ok(self.commit_structural(FieldPath::Party {
            change: ListChange::Add,
            member_id,
            stamp,
        }))
    }

    pub fn remove_party_member(&mut self, member_id: i64) -> Result<EditOutcome, CoreError> {
        let Some(members) = self
            .document
            .get_mut(PARTY_KEY)
            .and_then(|party| party.get_mut(PARTY_MEMBERS_KEY))
            .and_then(SaveValue::as_array_mut)
        else {
            return Ok(EditOutcome::Skipped);
        };
        let Some(position) = members.iter().position(|m| m.as_i64() == Some(member_id)) else {
            return Ok(EditOutcome::Skipped);
        };
        members.remove(position);

        let stamp = self.tracker.next_stamp();
        Ok(self.commit_structural(FieldPath::Party {
            change: ListChange::Remove,
            member_id,
            stamp,
        }))
    }

    fn commit(&mut self, path: FieldPath, old: SaveValue, new: SaveValue) -> EditOutcome {
        self.tracker.record_change(path.clone(), old.clone(), &new);
        let dirty = self.tracker.is_dirty(&path);
        trace!(path = %path, old = %old, new = %new, dirty, "field edited");
        EditOutcome::Applied(FieldEdit {
            path,
            old,
            new,
            dirty,
        })
    }

    fn commit_structural(&mut self, path: FieldPath) -> EditOutcome {
        self.tracker.record_structural_change(path.clone());
        EditOutcome::Structural(path)
    }
}

/// Locates the character record at `index` and its id.
fn character_mut(document: &mut SaveValue, index: usize) -> Result<(&mut Fields, i64), CoreError> {
    let record = document
        .get_mut(NPCS_KEY)
        .and_then(SaveValue::as_array_mut)
        .and_then(|npcs| npcs.get_mut(index))
        .and_then(SaveValue::as_object_mut)
        .ok_or_else(|| {
            CoreError::new(
                CoreErrorCode::NotFound,
                format!("no character record at index {index}"),
            )
        })?;
    let npc_id = record
        .get(ID_KEY)
        .and_then(SaveValue::as_i64)
        .ok_or_else(|| {
            CoreError::new(
                CoreErrorCode::UnsupportedOperation,
                format!("character record at index {index} has no integer id"),
            )
        })?;
    Ok((record, npc_id))
}

/// Writes `value` and returns the previous value, or `None` when the location
/// cannot exist in this record.
fn write_character_field(
    record: &mut Fields,
    field: &CharacterField,
    value: SaveValue,
) -> Result<Option<SaveValue>, CoreError> {
    match field {
        CharacterField::Scalar { key } => replace_scalar(record, key, value).map(Some),
        CharacterField::Nested { parent, key } => {
            let Some(nested) = record
                .get_mut(parent.key())
                .and_then(SaveValue::as_object_mut)
            else {
                return Ok(None);
            };
            replace_scalar(nested, key, value).map(Some)
        }
        CharacterField::Positional { array, index } => {
            if *index >= MAX_POSITIONAL_LEN {
                return Err(CoreError::new(
                    CoreErrorCode::UnsupportedOperation,
                    format!(
                        "{} index {index} is out of range (limit {MAX_POSITIONAL_LEN})",
                        array.key()
                    ),
                ));
            }
            let container = match array.parent() {
                Some(parent) => {
                    let Some(nested) = record
                        .get_mut(parent.key())
                        .and_then(SaveValue::as_object_mut)
                    else {
                        return Ok(None);
                    };
                    nested
                }
                None => record,
            };
            let slots = array_mut(container, array.key());
            if slots.len() <= *index {
                slots.resize(*index + 1, SaveValue::Number(0.0));
            }
            Ok(Some(std::mem::replace(&mut slots[*index], value)))
        }
        CharacterField::Record { list, index, key } => {
            let Some(entry) = record
                .get_mut(list.key())
                .and_then(SaveValue::as_array_mut)
                .and_then(|entries| entries.get_mut(*index))
                .and_then(SaveValue::as_object_mut)
            else {
                return Ok(None);
            };
            replace_scalar(entry, key, value).map(Some)
        }
    }
}

/// Replaces a scalar member. Objects and arrays are only changed through
/// their own locations, never overwritten wholesale.
fn replace_scalar(fields: &mut Fields, key: &str, value: SaveValue) -> Result<SaveValue, CoreError> {
    let shape = match fields.get(key) {
        Some(SaveValue::Array(_)) => Some("an array"),
        Some(SaveValue::Object(_)) => Some("an object"),
        _ => None,
    };
    if let Some(shape) = shape {
        return Err(CoreError::new(
            CoreErrorCode::UnsupportedOperation,
            format!("'{key}' holds {shape}, not a scalar field"),
        ));
    }
    Ok(fields.insert(key, value).unwrap_or_default())
}

fn list_mut(record: &mut Fields, list: CharacterList) -> &mut Vec<SaveValue> {
    array_mut(record, list.key())
}

/// The array under `key`, replacing a missing or non-array value with `[]`.
fn array_mut<'f>(fields: &'f mut Fields, key: &str) -> &'f mut Vec<SaveValue> {
    let slot = fields.get_or_insert_with(key, || SaveValue::Array(Vec::new()));
    if slot.as_array().is_none() {
        *slot = SaveValue::Array(Vec::new());
    }
    match slot {
        SaveValue::Array(items) => items,
        _ => unreachable!("slot was just set to an array"),
    }
}

fn party_members_mut(document: &mut SaveValue) -> Option<&mut Vec<SaveValue>> {
    let root = document.as_object_mut()?;
    let party = root.get_or_insert_with(PARTY_KEY, SaveValue::object);
    if party.as_object().is_none() {
        *party = SaveValue::object();
    }
    let party = party.as_object_mut()?;
    Some(array_mut(party, PARTY_MEMBERS_KEY))
}

fn leveled_record(id: i64) -> SaveValue {
    let mut entry = Fields::new();
    entry.insert(ID_KEY, SaveValue::from(id));
    entry.insert("lv", SaveValue::Number(1.0));
    SaveValue::Object(entry)
}

/// Id of a list entry: bare numbers are ids themselves.
fn entity_id(entry: &SaveValue) -> Option<i64> {
    match entry {
        SaveValue::Number(_) => entry.as_i64(),
        _ => entry.get(ID_KEY).and_then(SaveValue::as_i64),
    }
}
