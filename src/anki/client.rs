//! AnkiConnect HTTP client

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::config::AnkiConfig;

use super::types::{AnkiError, ApiRequest, ApiResponse, NewNote, NoteOptions, ANKI_CONNECT_VERSION};
use super::NoteService;

#[derive(Clone)]
pub struct AnkiConnectClient {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    media_timeout: Duration,
    model_name: String,
    tags: Vec<String>,
    allow_duplicate: bool,
}

impl AnkiConnectClient {
    pub fn new(config: &AnkiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.url.clone(),
            timeout: config.timeout(),
            media_timeout: config.media_timeout(),
            model_name: config.model_name.clone(),
            tags: config.tags.clone(),
            allow_duplicate: config.allow_duplicate,
        }
    }

    async fn make_request<T: DeserializeOwned>(
        &self,
        action: &'static str,
        params: Option<serde_json::Value>,
        timeout: Duration,
    ) -> Result<Option<T>, AnkiError> {
        let body = ApiRequest {
            action,
            version: ANKI_CONNECT_VERSION,
            params,
        };

        let response = self
            .client
            .post(&self.url)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(action, e))?;

        if !response.status().is_success() {
            return Err(AnkiError::Status(response.status().as_u16()));
        }

        let response: ApiResponse<T> = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AnkiError::Timeout(action)
            } else {
                AnkiError::Malformed(e.to_string())
            }
        })?;

        response.into_result().map_err(AnkiError::Api)
    }
}

fn request_error(action: &'static str, error: reqwest::Error) -> AnkiError {
    if error.is_timeout() {
        AnkiError::Timeout(action)
    } else {
        AnkiError::Unreachable(error.to_string())
    }
}

#[async_trait]
impl NoteService for AnkiConnectClient {
    async fn version(&self) -> Result<u32, AnkiError> {
        self.make_request("version", None, self.timeout)
            .await?
            .ok_or_else(|| AnkiError::Malformed("version missing from response".to_string()))
    }

    async fn deck_names(&self) -> Result<Vec<String>, AnkiError> {
        Ok(self
            .make_request("deckNames", None, self.timeout)
            .await?
            .unwrap_or_default())
    }

    async fn create_deck(&self, deck_name: &str) -> Result<(), AnkiError> {
        let params = serde_json::json!({ "deck": deck_name });
        self.make_request::<serde_json::Value>("createDeck", Some(params), self.timeout)
            .await?;
        Ok(())
    }

    async fn store_media_file(&self, filename: &str, base64_data: &str) -> Result<String, AnkiError> {
        let params = serde_json::json!({ "filename": filename, "data": base64_data });
        let stored: Option<String> = self
            .make_request("storeMediaFile", Some(params), self.media_timeout)
            .await?;
        Ok(stored.unwrap_or_else(|| filename.to_string()))
    }

    async fn add_note(&self, deck_name: &str, front: &str, back: &str) -> Result<u64, AnkiError> {
        let note = NewNote {
            deck_name: deck_name.to_string(),
            model_name: self.model_name.clone(),
            fields: HashMap::from([
                ("Front".to_string(), front.to_string()),
                ("Back".to_string(), back.to_string()),
            ]),
            options: NoteOptions {
                allow_duplicate: self.allow_duplicate,
            },
            tags: self.tags.clone(),
        };

        let params = serde_json::json!({ "note": note });
        self.make_request("addNote", Some(params), self.timeout)
            .await?
            .ok_or_else(|| AnkiError::Api("note was not created".to_string()))
    }
}
