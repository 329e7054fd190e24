//! Reading (furigana) lookup against a Jisho-compatible dictionary API

use async_trait::async_trait;
use serde::Deserialize;

use super::types::EnrichError;

/// Looks up the reading of a piece of Japanese text
#[async_trait]
pub trait ReadingLookup: Send + Sync {
    /// Return the furigana-annotated form of `text`, or `EnrichError::NoMatch`
    async fn lookup(&self, text: &str) -> Result<String, EnrichError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<WordEntry>,
}

#[derive(Debug, Deserialize)]
struct WordEntry {
    #[serde(default)]
    japanese: Vec<JapaneseForm>,
}

#[derive(Debug, Deserialize)]
struct JapaneseForm {
    word: Option<String>,
    reading: Option<String>,
}

/// Client for `GET <url>?keyword=<text>`
pub struct JishoReadingLookup {
    client: reqwest::Client,
    url: String,
}

impl JishoReadingLookup {
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
impl ReadingLookup for JishoReadingLookup {
    async fn lookup(&self, text: &str) -> Result<String, EnrichError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("keyword", text)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EnrichError::Status(response.status().as_u16()));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| EnrichError::Malformed(e.to_string()))?;

        annotate(text, &body.data).ok_or(EnrichError::NoMatch)
    }
}

/// Find the dictionary form that spells exactly `text` and render it in
/// Anki furigana notation (`漢字[かんじ]`).
fn annotate(text: &str, entries: &[WordEntry]) -> Option<String> {
    let forms = entries.iter().flat_map(|entry| entry.japanese.iter());

    for form in forms {
        let reading = form.reading.as_deref().filter(|r| !r.is_empty());

        match (form.word.as_deref(), reading) {
            (Some(word), Some(reading)) if word == text && reading != text => {
                return Some(format!("{}[{}]", word, reading));
            }
            // Kana-only input: the reading is the text itself
            (_, Some(reading)) if reading == text => return Some(text.to_string()),
            (Some(word), None) if word == text => return Some(text.to_string()),
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, routing::get, Json, Router};
    use std::collections::HashMap;
    use std::time::Duration;

    fn entries(forms: &[(Option<&str>, Option<&str>)]) -> Vec<WordEntry> {
        vec![WordEntry {
            japanese: forms
                .iter()
                .map(|(w, r)| JapaneseForm {
                    word: w.map(str::to_string),
                    reading: r.map(str::to_string),
                })
                .collect(),
        }]
    }

    #[test]
    fn test_annotate_exact_word() {
        let data = entries(&[(Some("猫"), Some("ねこ"))]);
        assert_eq!(annotate("猫", &data).as_deref(), Some("猫[ねこ]"));
    }

    #[test]
    fn test_annotate_kana_input() {
        let data = entries(&[(None, Some("ねこ"))]);
        assert_eq!(annotate("ねこ", &data).as_deref(), Some("ねこ"));
    }

    #[test]
    fn test_annotate_partial_match_is_no_match() {
        // A sentence key only matches its first word in the dictionary
        let data = entries(&[(Some("猫"), Some("ねこ"))]);
        assert_eq!(annotate("猫が好きです", &data), None);
        assert_eq!(annotate("猫", &[]), None);
    }

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/api/v1/search/words", addr)
    }

    #[tokio::test]
    async fn test_lookup_against_local_service() {
        let router = Router::new().route(
            "/api/v1/search/words",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let keyword = params.get("keyword").cloned().unwrap_or_default();
                Json(serde_json::json!({
                    "meta": { "status": 200 },
                    "data": [{ "japanese": [{ "word": keyword, "reading": "にほんご" }] }]
                }))
            }),
        );
        let url = spawn(router).await;

        let lookup = JishoReadingLookup::new(&url, Duration::from_secs(5));
        assert_eq!(lookup.lookup("日本語").await.unwrap(), "日本語[にほんご]");
    }

    #[tokio::test]
    async fn test_lookup_non_success_status() {
        let router = Router::new().route(
            "/api/v1/search/words",
            get(|| async { (axum::http::StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let url = spawn(router).await;

        let lookup = JishoReadingLookup::new(&url, Duration::from_secs(5));
        assert!(matches!(lookup.lookup("猫").await, Err(EnrichError::Status(503))));
    }
}
