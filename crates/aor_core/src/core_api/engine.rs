use tracing::debug;

use crate::document::DocumentStore;
use crate::mutator::{EditOutcome, FieldMutator, FieldTarget, NewItem};
use crate::schema::CharacterList;
use crate::tracker::DirtyTracker;
use crate::value::SaveValue;

use super::error::{CoreError, CoreErrorCode};

#[derive(Debug, Default, Clone, Copy)]
pub struct Engine;

/// One editing session: the loaded save and its pending changes.
#[derive(Debug, Clone)]
pub struct Session {
    store: DocumentStore,
    tracker: DirtyTracker,
}

impl Engine {
    pub fn new() -> Self {
        Self
    }

    pub fn open_bytes<B: AsRef<[u8]>>(&self, bytes: B) -> Result<Session, CoreError> {
        let text = decode_text(bytes.as_ref())?;
        self.open_str(text)
    }

    pub fn open_str(&self, text: &str) -> Result<Session, CoreError> {
        let store = DocumentStore::load(text)?;
        Ok(Session {
            store,
            tracker: DirtyTracker::new(),
        })
    }
}

fn decode_text(bytes: &[u8]) -> Result<&str, CoreError> {
    if bytes.is_empty() {
        return Err(CoreError::new(CoreErrorCode::Parse, "save file is empty"));
    }
    std::str::from_utf8(bytes).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Parse,
            format!("save file is not valid UTF-8 text: {e}"),
        )
    })
}

impl Session {
    /// Replaces this session's save with another file. The current state is
    /// kept when `bytes` fail to parse.
    pub fn load_bytes<B: AsRef<[u8]>>(&mut self, bytes: B) -> Result<(), CoreError> {
        let text = decode_text(bytes.as_ref())?;
        self.store = DocumentStore::load(text)?;
        self.tracker.clear();
        Ok(())
    }

    /// Discards every edit by re-reading the original text. Irreversible; the
    /// caller is responsible for confirming with the user first.
    pub fn reset(&mut self) -> Result<(), CoreError> {
        self.store.reset()?;
        self.tracker.clear();
        debug!("session reset");
        Ok(())
    }

    pub fn document(&self) -> &SaveValue {
        self.store.document()
    }

    pub fn tracker(&self) -> &DirtyTracker {
        &self.tracker
    }

    pub fn pending_count(&self) -> usize {
        self.tracker.pending_count()
    }

    pub fn pending_paths(&self) -> Vec<String> {
        self.tracker.pending_paths()
    }

    pub fn original_text(&self) -> &str {
        self.store.original_text()
    }

    pub fn serialize(&self) -> Result<String, CoreError> {
        self.store.serialize()
    }

    /// Bytes of the input file, for the backup export.
    pub fn to_bytes_unmodified(&self) -> Vec<u8> {
        self.store.original_text().as_bytes().to_vec()
    }

    /// Bytes of the edited document, for the modified-save export.
    pub fn to_bytes_modified(&self) -> Result<Vec<u8>, CoreError> {
        let text = self.store.serialize()?;
        debug!(
            bytes = text.len(),
            pending = self.pending_count(),
            "serialized modified save"
        );
        Ok(text.into_bytes())
    }

    pub fn set_field(
        &mut self,
        target: &FieldTarget,
        value: SaveValue,
    ) -> Result<EditOutcome, CoreError> {
        self.mutator().set(target, value)
    }

    /// Writes raw form input, coerced by the target's field kind.
    pub fn set_field_text(
        &mut self,
        target: &FieldTarget,
        raw: &str,
    ) -> Result<EditOutcome, CoreError> {
        self.mutator().set_text(target, raw)
    }

    pub fn set_wealth(&mut self, wealth: f64) -> Result<EditOutcome, CoreError> {
        self.set_field(&FieldTarget::game("wealth"), SaveValue::Number(wealth))
    }

    pub fn set_reputation(&mut self, reputation: f64) -> Result<EditOutcome, CoreError> {
        self.set_field(
            &FieldTarget::game("reputation"),
            SaveValue::Number(reputation),
        )
    }

    pub fn set_character_name(
        &mut self,
        index: usize,
        name: &str,
    ) -> Result<EditOutcome, CoreError> {
        self.set_field(
            &FieldTarget::scalar(index, crate::schema::NAME_KEY),
            SaveValue::from(name),
        )
    }

    pub fn add_spell(&mut self, index: usize, spell_id: i64) -> Result<EditOutcome, CoreError> {
        self.mutator().add_spell(index, spell_id)
    }

    pub fn add_talent(&mut self, index: usize, talent_id: i64) -> Result<EditOutcome, CoreError> {
        self.mutator().add_talent(index, talent_id)
    }

    pub fn add_trait(&mut self, index: usize, trait_id: i64) -> Result<EditOutcome, CoreError> {
        self.mutator().add_trait(index, trait_id)
    }

    pub fn add_item(&mut self, index: usize, item: NewItem) -> Result<EditOutcome, CoreError> {
        self.mutator().add_item(index, item)
    }

    pub fn remove_from_list(
        &mut self,
        index: usize,
        list: CharacterList,
        position: usize,
    ) -> Result<EditOutcome, CoreError> {
        self.mutator().remove(index, list, position)
    }

    pub fn add_party_member(&mut self, member_id: i64) -> Result<EditOutcome, CoreError> {
        self.mutator().add_party_member(member_id)
    }

    pub fn remove_party_member(&mut self, member_id: i64) -> Result<EditOutcome, CoreError> {
        self.mutator().remove_party_member(member_id)
    }

    fn mutator(&mut self) -> FieldMutator<'_> {
        FieldMutator::new(self.store.document_mut(), &mut self.tracker)
    }
}
