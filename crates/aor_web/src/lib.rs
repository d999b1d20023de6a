use aor_core::core_api::{
    CharacterSearch, CharacterSheet, CharacterSummary, CoreError, Engine, GameBar, LookupKind,
    LookupTable, LookupTables, Session,
};
use aor_core::mutator::{EditOutcome, FieldTarget, NewItem};
use aor_core::schema::CharacterList;
use aor_render::{
    JsonStyle, SEARCH_LIMIT, TextRenderOptions, render_character_sheet_with_options,
    render_json_full,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

const DISCLAIMER_KEY: &str = "aor-disclaimer-accepted";
const DISCLAIMER_ACCEPTED: &str = "1";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WebRenderOptions {
    pub json_output: bool,
    pub verbose: bool,
}

#[derive(Debug, Clone)]
struct WebError {
    code: &'static str,
    message: String,
}

#[derive(Debug, Clone, Serialize)]
struct WebErrorPayload {
    code: String,
    message: String,
}

impl WebError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn to_js_value(&self) -> JsValue {
        let payload = WebErrorPayload {
            code: self.code.to_string(),
            message: self.message.clone(),
        };
        serde_wasm_bindgen::to_value(&payload).unwrap_or_else(|_| {
            JsValue::from_str(&format!("{}: {}", payload.code, payload.message))
        })
    }
}

/// Browser-side editing session. One per page; a new upload replaces the
/// loaded save only when it parses.
#[wasm_bindgen]
pub struct Editor {
    state: EditorState,
}

#[wasm_bindgen]
impl Editor {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Editor {
        Editor {
            state: EditorState::new(read_disclaimer_flag()),
        }
    }

    #[wasm_bindgen(js_name = disclaimerAccepted)]
    pub fn disclaimer_accepted(&self) -> bool {
        self.state.disclaimer_accepted
    }

    #[wasm_bindgen(js_name = acceptDisclaimer)]
    pub fn accept_disclaimer(&mut self) -> Result<(), JsValue> {
        write_disclaimer_flag().map_err(|err| err.to_js_value())?;
        self.state.disclaimer_accepted = true;
        Ok(())
    }

    /// Loads a `.dat` upload and returns the game bar for it.
    pub fn load(&mut self, save_bytes: &[u8]) -> Result<JsValue, JsValue> {
        let bar = self.state.load(save_bytes).map_err(|err| err.to_js_value())?;
        to_js(&bar)
    }

    pub fn reset(&mut self) -> Result<(), JsValue> {
        self.state.reset().map_err(|err| err.to_js_value())
    }

    #[wasm_bindgen(js_name = pendingCount)]
    pub fn pending_count(&self) -> usize {
        self.state.pending_count()
    }

    #[wasm_bindgen(js_name = pendingPaths)]
    pub fn pending_paths(&self) -> Result<JsValue, JsValue> {
        let paths = self.state.pending_paths().map_err(|err| err.to_js_value())?;
        to_js(&paths)
    }

    #[wasm_bindgen(js_name = gameBar)]
    pub fn game_bar(&self) -> Result<JsValue, JsValue> {
        let bar = self.state.game_bar().map_err(|err| err.to_js_value())?;
        to_js(&bar)
    }

    pub fn party(&self) -> Result<JsValue, JsValue> {
        let party = self.state.party().map_err(|err| err.to_js_value())?;
        to_js(&party)
    }

    pub fn search(&self, query: &str) -> Result<JsValue, JsValue> {
        let found = self.state.search(query).map_err(|err| err.to_js_value())?;
        to_js(&found)
    }

    #[wasm_bindgen(js_name = defaultCharacterId)]
    pub fn default_character_id(&self) -> Option<f64> {
        self.state.default_character_id().map(|id| id as f64)
    }

    #[wasm_bindgen(js_name = characterSheet)]
    pub fn character_sheet(&self, character_id: f64) -> Result<JsValue, JsValue> {
        let sheet = self
            .state
            .character_sheet(character_id as i64)
            .map_err(|err| err.to_js_value())?;
        to_js(&sheet)
    }

    /// Text sheet, or canonical JSON when `options.json_output` is set.
    pub fn render(&self, character_id: Option<f64>, options: JsValue) -> Result<String, JsValue> {
        let parsed_options = parse_options(options).map_err(|err| err.to_js_value())?;
        self.state
            .render(character_id.map(|id| id as i64), &parsed_options)
            .map_err(|err| err.to_js_value())
    }

    /// Applies raw input text to a field spec such as `wealth`, `level` or
    /// `weaponMastery.2`. Returns false when the save has no such location.
    #[wasm_bindgen(js_name = setField)]
    pub fn set_field(
        &mut self,
        character_id: Option<f64>,
        spec: &str,
        raw: &str,
    ) -> Result<bool, JsValue> {
        self.state
            .set_field(character_id.map(|id| id as i64), spec, raw)
            .map_err(|err| err.to_js_value())
    }

    #[wasm_bindgen(js_name = addListEntry)]
    pub fn add_list_entry(
        &mut self,
        character_id: f64,
        list: &str,
        entry_id: f64,
    ) -> Result<bool, JsValue> {
        self.state
            .add_list_entry(character_id as i64, list, entry_id as i64)
            .map_err(|err| err.to_js_value())
    }

    #[wasm_bindgen(js_name = removeListEntry)]
    pub fn remove_list_entry(
        &mut self,
        character_id: f64,
        list: &str,
        position: usize,
    ) -> Result<bool, JsValue> {
        self.state
            .remove_list_entry(character_id as i64, list, position)
            .map_err(|err| err.to_js_value())
    }

    #[wasm_bindgen(js_name = addPartyMember)]
    pub fn add_party_member(&mut self, member_id: f64) -> Result<bool, JsValue> {
        self.state
            .set_party_member(member_id as i64, true)
            .map_err(|err| err.to_js_value())
    }

    #[wasm_bindgen(js_name = removePartyMember)]
    pub fn remove_party_member(&mut self, member_id: f64) -> Result<bool, JsValue> {
        self.state
            .set_party_member(member_id as i64, false)
            .map_err(|err| err.to_js_value())
    }

    #[wasm_bindgen(js_name = exportModified)]
    pub fn export_modified(&self) -> Result<String, JsValue> {
        self.state.export_modified().map_err(|err| err.to_js_value())
    }

    #[wasm_bindgen(js_name = exportBackup)]
    pub fn export_backup(&self) -> Result<String, JsValue> {
        self.state.export_backup().map_err(|err| err.to_js_value())
    }

    /// Installs a fetched lookup table: `items`, `traits` or `addon_attributes`.
    #[wasm_bindgen(js_name = setLookupTable)]
    pub fn set_lookup_table(&mut self, kind: &str, json_text: &str) -> Result<usize, JsValue> {
        self.state
            .set_lookup_table(kind, json_text)
            .map_err(|err| err.to_js_value())
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

struct EditorState {
    session: Option<Session>,
    lookups: LookupTables,
    disclaimer_accepted: bool,
}

impl EditorState {
    fn new(disclaimer_accepted: bool) -> Self {
        Self {
            session: None,
            lookups: LookupTables::new(),
            disclaimer_accepted,
        }
    }

    fn load(&mut self, save_bytes: &[u8]) -> Result<GameBar, WebError> {
        if !self.disclaimer_accepted {
            return Err(WebError::new(
                "disclaimer_required",
                "Accept the disclaimer before loading a save file.",
            ));
        }
        if save_bytes.is_empty() {
            return Err(WebError::new(
                "unsupported_file",
                "The uploaded file is empty. Please provide a .dat save file.",
            ));
        }

        match self.session.as_mut() {
            Some(session) => session
                .load_bytes(save_bytes)
                .map_err(|err| WebError::new("parse_failed", err.to_string()))?,
            None => {
                let session = Engine::new()
                    .open_bytes(save_bytes)
                    .map_err(|err| WebError::new("parse_failed", err.to_string()))?;
                self.session = Some(session);
            }
        }
        self.game_bar()
    }

    fn session(&self) -> Result<&Session, WebError> {
        self.session
            .as_ref()
            .ok_or_else(|| WebError::new("no_session", "No save file is loaded."))
    }

    fn session_mut(&mut self) -> Result<&mut Session, WebError> {
        self.session
            .as_mut()
            .ok_or_else(|| WebError::new("no_session", "No save file is loaded."))
    }

    fn reset(&mut self) -> Result<(), WebError> {
        self.session_mut()?
            .reset()
            .map_err(|err| WebError::new("parse_failed", err.to_string()))
    }

    fn pending_count(&self) -> usize {
        self.session.as_ref().map_or(0, Session::pending_count)
    }

    fn pending_paths(&self) -> Result<Vec<String>, WebError> {
        Ok(self.session()?.pending_paths())
    }

    fn game_bar(&self) -> Result<GameBar, WebError> {
        Ok(self.session()?.game_bar())
    }

    fn party(&self) -> Result<Vec<CharacterSummary>, WebError> {
        Ok(self.session()?.party_members())
    }

    fn search(&self, query: &str) -> Result<CharacterSearch, WebError> {
        Ok(self.session()?.search_characters(query, SEARCH_LIMIT))
    }

    fn default_character_id(&self) -> Option<i64> {
        self.session.as_ref()?.default_character_id()
    }

    fn character_index(&self, character_id: i64) -> Result<usize, WebError> {
        self.session()?
            .character_index(character_id)
            .ok_or_else(|| {
                WebError::new(
                    "invalid_field",
                    format!("No character with id {character_id} in this save."),
                )
            })
    }

    fn character_sheet(&self, character_id: i64) -> Result<CharacterSheet, WebError> {
        let index = self.character_index(character_id)?;
        self.session()?
            .character_sheet(index, &self.lookups)
            .ok_or_else(|| {
                WebError::new(
                    "invalid_field",
                    format!("No character with id {character_id} in this save."),
                )
            })
    }

    fn render(
        &self,
        character_id: Option<i64>,
        options: &WebRenderOptions,
    ) -> Result<String, WebError> {
        let session = self.session()?;
        let index = match character_id {
            Some(id) => Some(self.character_index(id)?),
            None => session
                .default_character_id()
                .and_then(|id| session.character_index(id)),
        };

        if options.json_output {
            let value = render_json_full(session, &self.lookups, index, JsonStyle::CanonicalV1);
            return serde_json::to_string_pretty(&value).map_err(|err| {
                WebError::new(
                    "render_failed",
                    format!("failed to serialize rendered JSON output: {err}"),
                )
            });
        }

        Ok(render_character_sheet_with_options(
            session,
            &self.lookups,
            index,
            TextRenderOptions {
                verbose: options.verbose,
            },
        ))
    }

    fn set_field(
        &mut self,
        character_id: Option<i64>,
        spec: &str,
        raw: &str,
    ) -> Result<bool, WebError> {
        let index = character_id
            .map(|id| self.character_index(id))
            .transpose()?;
        let target = FieldTarget::parse_spec(spec, index)
            .map_err(|err| WebError::new("invalid_field", err.message))?;
        let outcome = self.session_mut()?.set_field_text(&target, raw);
        applied(outcome)
    }

    fn add_list_entry(
        &mut self,
        character_id: i64,
        list: &str,
        entry_id: i64,
    ) -> Result<bool, WebError> {
        let index = self.character_index(character_id)?;
        let list = parse_list(list)?;
        let session = self.session_mut()?;
        let outcome = match list {
            CharacterList::Spells => session.add_spell(index, entry_id),
            CharacterList::Talents => session.add_talent(index, entry_id),
            CharacterList::Traits => session.add_trait(index, entry_id),
            CharacterList::Items => session.add_item(index, NewItem::new(entry_id)),
        };
        applied(outcome)
    }

    fn remove_list_entry(
        &mut self,
        character_id: i64,
        list: &str,
        position: usize,
    ) -> Result<bool, WebError> {
        let index = self.character_index(character_id)?;
        let list = parse_list(list)?;
        let outcome = self.session_mut()?.remove_from_list(index, list, position);
        applied(outcome)
    }

    fn set_party_member(&mut self, member_id: i64, in_party: bool) -> Result<bool, WebError> {
        let session = self.session_mut()?;
        let outcome = if in_party {
            session.add_party_member(member_id)
        } else {
            session.remove_party_member(member_id)
        };
        applied(outcome)
    }

    fn export_modified(&self) -> Result<String, WebError> {
        self.session()?
            .serialize()
            .map_err(|err| WebError::new("edit_failed", err.to_string()))
    }

    fn export_backup(&self) -> Result<String, WebError> {
        Ok(self.session()?.original_text().to_string())
    }

    fn set_lookup_table(&mut self, kind: &str, json_text: &str) -> Result<usize, WebError> {
        let kind = parse_lookup_kind(kind)?;
        let table = LookupTable::from_json_str(json_text)
            .map_err(|err| WebError::new("lookup_failed", err.message))?;
        let len = table.len();
        self.lookups.set(kind, table);
        Ok(len)
    }
}

fn applied(outcome: Result<EditOutcome, CoreError>) -> Result<bool, WebError> {
    outcome
        .map(|outcome| !outcome.is_skipped())
        .map_err(|err| WebError::new("edit_failed", err.to_string()))
}

fn parse_list(raw: &str) -> Result<CharacterList, WebError> {
    CharacterList::from_key(raw.trim()).ok_or_else(|| {
        WebError::new(
            "invalid_field",
            format!("Invalid list '{raw}'. Expected one of: spells, talents, traits, items"),
        )
    })
}

fn parse_lookup_kind(raw: &str) -> Result<LookupKind, WebError> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "items" | "items.json" => Ok(LookupKind::Items),
        "traits" | "traits.json" => Ok(LookupKind::Traits),
        "addon_attributes" | "addon_attributes.json" | "addons" => {
            Ok(LookupKind::AddonAttributes)
        }
        _ => Err(WebError::new(
            "lookup_failed",
            format!("Invalid lookup table '{raw}'. Expected one of: items, traits, addon_attributes"),
        )),
    }
}

fn parse_options(options: JsValue) -> Result<WebRenderOptions, WebError> {
    if options.is_null() || options.is_undefined() {
        return Ok(WebRenderOptions::default());
    }

    serde_wasm_bindgen::from_value(options).map_err(|err| {
        WebError::new(
            "invalid_options",
            format!("Failed to parse web render options: {err}"),
        )
    })
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|err| {
        WebError::new("render_failed", format!("failed to convert result: {err}")).to_js_value()
    })
}

fn session_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.session_storage().ok().flatten()
}

fn read_disclaimer_flag() -> bool {
    session_storage()
        .and_then(|storage| storage.get_item(DISCLAIMER_KEY).ok().flatten())
        .is_some_and(|value| value == DISCLAIMER_ACCEPTED)
}

fn write_disclaimer_flag() -> Result<(), WebError> {
    let storage = session_storage().ok_or_else(|| {
        WebError::new("disclaimer_required", "Session storage is not available.")
    })?;
    storage
        .set_item(DISCLAIMER_KEY, DISCLAIMER_ACCEPTED)
        .map_err(|_| WebError::new("disclaimer_required", "Could not record the disclaimer."))
}
