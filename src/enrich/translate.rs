//! Translation against a MyMemory-compatible API

use async_trait::async_trait;
use serde::Deserialize;

use super::types::EnrichError;

/// Translates text between two ISO 639-1 languages
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, EnrichError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    response_data: Option<ResponseData>,
    /// MyMemory reports errors in-band, as a number or a string
    response_status: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseData {
    translated_text: Option<String>,
}

/// Client for `GET <url>?q=<text>&langpair=<source>|<target>`
pub struct MyMemoryTranslator {
    client: reqwest::Client,
    url: String,
}

impl MyMemoryTranslator {
    pub fn new(url: &str, timeout: std::time::Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl Translator for MyMemoryTranslator {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, EnrichError> {
        let langpair = format!("{}|{}", source, target);
        let response = self
            .client
            .get(&self.url)
            .query(&[("q", text), ("langpair", langpair.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EnrichError::Status(response.status().as_u16()));
        }

        let body: TranslateResponse = response
            .json()
            .await
            .map_err(|e| EnrichError::Malformed(e.to_string()))?;

        if let Some(status) = body.response_status.as_ref().and_then(in_band_status) {
            if status != 200 {
                return Err(EnrichError::Status(status));
            }
        }

        body.response_data
            .and_then(|data| data.translated_text)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(EnrichError::EmptyTranslation)
    }
}

fn in_band_status(value: &serde_json::Value) -> Option<u16> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
