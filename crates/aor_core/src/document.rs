use tracing::debug;

use crate::core_api::{CoreError, CoreErrorCode};
use crate::value::SaveValue;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// The parsed save plus the exact text it came from.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    original: String,
    document: SaveValue,
}

impl DocumentStore {
    pub fn load(text: impl Into<String>) -> Result<Self, CoreError> {
        let original = text.into();
        let document = parse_document(&original)?;
        debug!(bytes = original.len(), "save document loaded");
        Ok(Self { original, document })
    }

    /// Replaces the live document with a fresh parse of the original text.
    pub fn reset(&mut self) -> Result<(), CoreError> {
        self.document = parse_document(&self.original)?;
        debug!("save document reset to original");
        Ok(())
    }

    pub fn document(&self) -> &SaveValue {
        &self.document
    }

    pub(crate) fn document_mut(&mut self) -> &mut SaveValue {
        &mut self.document
    }

    /// Compact JSON of the live document, as written to a modified save.
    pub fn serialize(&self) -> Result<String, CoreError> {
        serde_json::to_string(&self.document).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Serialize,
                format!("failed to serialize save document: {e}"),
            )
        })
    }

    pub fn original_text(&self) -> &str {
        &self.original
    }
}

pub fn parse_document(text: &str) -> Result<SaveValue, CoreError> {
    let body = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);
    serde_json::from_str(body).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Parse,
            format!("failed to parse save document: {e}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::DocumentStore;
    use crate::core_api::CoreErrorCode;
    use crate::value::SaveValue;

    #[test]
    fn keeps_original_text_verbatim() {
        let text = "{ \"wealth\" : 100,\n  \"npcs\": [] }\n";
        let store = DocumentStore::load(text).expect("should parse");
        assert_eq!(store.original_text(), text);
        assert_eq!(
            store.serialize().expect("should serialize"),
            r#"{"wealth":100,"npcs":[]}"#
        );
    }

    #[test]
    fn rejects_malformed_json_with_parser_message() {
        let err = DocumentStore::load("{\"wealth\": }").expect_err("should fail");
        assert_eq!(err.code, CoreErrorCode::Parse);
        assert!(err.message.contains("line 1"));
    }

    #[test]
    fn accepts_leading_byte_order_mark() {
        let text = "\u{feff}{\"wealth\":1}";
        let store = DocumentStore::load(text).expect("should parse");
        assert_eq!(store.document().get("wealth"), Some(&SaveValue::Number(1.0)));
        assert_eq!(store.original_text(), text);
    }

    #[test]
    fn reset_discards_in_memory_changes() {
        let mut store = DocumentStore::load(r#"{"wealth":1}"#).expect("should parse");
        if let Some(fields) = store.document_mut().as_object_mut() {
            fields.insert("wealth", SaveValue::Number(9.0));
        }
        store.reset().expect("reset should succeed");
        assert_eq!(store.document().get("wealth"), Some(&SaveValue::Number(1.0)));
    }
}
