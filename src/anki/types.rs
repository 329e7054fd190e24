//! AnkiConnect wire types

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Protocol version sent with every request
pub const ANKI_CONNECT_VERSION: u32 = 6;

#[derive(Debug, Serialize)]
pub struct ApiRequest<'a> {
    pub action: &'a str,
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub result: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Split the envelope into the result or the error string AnkiConnect sent
    pub fn into_result(self) -> Result<Option<T>, String> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result),
        }
    }
}

/// A note for the `addNote` action
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    pub deck_name: String,
    pub model_name: String,
    pub fields: HashMap<String, String>,
    pub options: NoteOptions,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NoteOptions {
    pub allow_duplicate: bool,
}

/// AnkiConnect error types
#[derive(Debug, thiserror::Error)]
pub enum AnkiError {
    #[error("AnkiConnect unreachable: {0}")]
    Unreachable(String),

    #[error("AnkiConnect timed out during {0}")]
    Timeout(&'static str),

    #[error("AnkiConnect returned status {0}")]
    Status(u16),

    #[error("AnkiConnect error: {0}")]
    Api(String),

    #[error("Malformed AnkiConnect response: {0}")]
    Malformed(String),
}

impl AnkiError {
    /// AnkiConnect reports an existing deck this way on older versions
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::Api(message) if message.to_ascii_lowercase().contains("already exists"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = ApiRequest {
            action: "createDeck",
            version: ANKI_CONNECT_VERSION,
            params: Some(serde_json::json!({ "deck": "Japanese" })),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "action": "createDeck", "version": 6, "params": { "deck": "Japanese" } })
        );

        let bare = ApiRequest { action: "version", version: 6, params: None };
        assert_eq!(
            serde_json::to_value(&bare).unwrap(),
            serde_json::json!({ "action": "version", "version": 6 })
        );
    }

    #[test]
    fn test_response_envelope() {
        let ok: ApiResponse<u64> = serde_json::from_str(r#"{"result": 1496198395707, "error": null}"#).unwrap();
        assert_eq!(ok.into_result().unwrap(), Some(1496198395707));

        let err: ApiResponse<u64> =
            serde_json::from_str(r#"{"result": null, "error": "cannot create note because it is a duplicate"}"#)
                .unwrap();
        assert_eq!(
            err.into_result().unwrap_err(),
            "cannot create note because it is a duplicate"
        );
    }

    #[test]
    fn test_note_serializes_camel_case() {
        let note = NewNote {
            deck_name: "Default".to_string(),
            model_name: "Basic".to_string(),
            fields: HashMap::from([("Front".to_string(), "F".to_string())]),
            options: NoteOptions { allow_duplicate: false },
            tags: vec!["image-import".to_string()],
        };
        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(value["deckName"], "Default");
        assert_eq!(value["modelName"], "Basic");
        assert_eq!(value["options"]["allowDuplicate"], false);
    }

    #[test]
    fn test_already_exists_detection() {
        assert!(AnkiError::Api("Deck already exists".to_string()).is_already_exists());
        assert!(!AnkiError::Api("collection is not available".to_string()).is_already_exists());
        assert!(!AnkiError::Status(500).is_already_exists());
    }
}
