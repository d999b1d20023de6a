use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use super::error::{CoreError, CoreErrorCode};

const NAME_FIELDS: [&str; 2] = ["name", "Name"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LookupKind {
    Items,
    Traits,
    AddonAttributes,
}

impl LookupKind {
    pub const ALL: [LookupKind; 3] = [Self::Items, Self::Traits, Self::AddonAttributes];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Items => "items.json",
            Self::Traits => "traits.json",
            Self::AddonAttributes => "addon_attributes.json",
        }
    }
}

/// Id to display-name map from the external data files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    entries: BTreeMap<i64, String>,
}

impl LookupTable {
    /// Accepts an object keyed by id or an array of records carrying an `id`.
    /// Values are a bare name or an object with a `name`/`Name` field; entries
    /// of any other shape are ignored.
    pub fn from_json_str(text: &str) -> Result<Self, CoreError> {
        let root: JsonValue = serde_json::from_str(text).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Parse,
                format!("failed to parse lookup table: {e}"),
            )
        })?;

        let mut entries = BTreeMap::new();
        match root {
            JsonValue::Object(map) => {
                for (key, value) in map {
                    let Ok(id) = key.trim().parse::<i64>() else {
                        continue;
                    };
                    if let Some(name) = entry_name(&value) {
                        entries.insert(id, name);
                    }
                }
            }
            JsonValue::Array(records) => {
                for record in records {
                    let Some(id) = record.get("id").and_then(JsonValue::as_i64) else {
                        continue;
                    };
                    if let Some(name) = entry_name(&record) {
                        entries.insert(id, name);
                    }
                }
            }
            _ => {
                return Err(CoreError::new(
                    CoreErrorCode::Parse,
                    "lookup table must be a JSON object or array",
                ));
            }
        }

        Ok(Self { entries })
    }

    pub fn get(&self, id: i64) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn entry_name(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(name) => Some(name.clone()),
        JsonValue::Object(fields) => NAME_FIELDS
            .iter()
            .find_map(|key| fields.get(*key).and_then(JsonValue::as_str))
            .map(str::to_string),
        _ => None,
    }
}

/// The three optional display tables. Any id without a name renders as `#<id>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTables {
    items: Option<LookupTable>,
    traits: Option<LookupTable>,
    addon_attributes: Option<LookupTable>,
}

impl LookupTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads whichever table files exist under `dir`. Absent files are
    /// skipped; unreadable or malformed ones are errors.
    pub fn load_from_dir(dir: &Path) -> Result<Self, CoreError> {
        let mut tables = Self::new();
        for kind in LookupKind::ALL {
            let path = dir.join(kind.file_name());
            if !path.is_file() {
                warn!(path = %path.display(), "lookup table not found, ids will show as numbers");
                continue;
            }
            let text = fs::read_to_string(&path).map_err(|e| {
                CoreError::new(
                    CoreErrorCode::Io,
                    format!("failed to read {}: {e}", path.display()),
                )
            })?;
            let table = LookupTable::from_json_str(&text).map_err(|e| {
                CoreError::new(e.code, format!("{}: {}", path.display(), e.message))
            })?;
            debug!(path = %path.display(), entries = table.len(), "lookup table loaded");
            tables.set(kind, table);
        }
        Ok(tables)
    }

    pub fn set(&mut self, kind: LookupKind, table: LookupTable) {
        *self.slot_mut(kind) = Some(table);
    }

    pub fn table(&self, kind: LookupKind) -> Option<&LookupTable> {
        match kind {
            LookupKind::Items => self.items.as_ref(),
            LookupKind::Traits => self.traits.as_ref(),
            LookupKind::AddonAttributes => self.addon_attributes.as_ref(),
        }
    }

    pub fn resolve(&self, kind: LookupKind, id: i64) -> String {
        self.table(kind)
            .and_then(|table| table.get(id))
            .map_or_else(|| format!("#{id}"), str::to_string)
    }

    fn slot_mut(&mut self, kind: LookupKind) -> &mut Option<LookupTable> {
        match kind {
            LookupKind::Items => &mut self.items,
            LookupKind::Traits => &mut self.traits,
            LookupKind::AddonAttributes => &mut self.addon_attributes,
        }
    }
}
