//! Best-effort text enrichment
//!
//! Every call here returns usable text. A failing or slow service degrades
//! to the unmodified input and is only reported through logging.

use std::sync::Arc;
use std::time::Duration;

use crate::config::EnrichmentConfig;

use super::{
    reading::{JishoReadingLookup, ReadingLookup},
    translate::{MyMemoryTranslator, Translator},
    types::{EnrichError, EnrichedText},
};

pub struct TextEnricher {
    reading: Arc<dyn ReadingLookup>,
    translator: Arc<dyn Translator>,
    timeout: Duration,
}

impl TextEnricher {
    pub fn new(config: &EnrichmentConfig) -> Self {
        let timeout = config.timeout();
        Self::with_services(
            Arc::new(JishoReadingLookup::new(&config.reading_url, timeout)),
            Arc::new(MyMemoryTranslator::new(&config.translate_url, timeout)),
            timeout,
        )
    }

    pub fn with_services(
        reading: Arc<dyn ReadingLookup>,
        translator: Arc<dyn Translator>,
        timeout: Duration,
    ) -> Self {
        Self {
            reading,
            translator,
            timeout,
        }
    }

    /// Furigana-annotated form of `text`, or `text` itself
    pub async fn lookup_reading(&self, text: &str) -> String {
        let result = tokio::time::timeout(self.timeout, self.reading.lookup(text))
            .await
            .unwrap_or(Err(EnrichError::Timeout(self.timeout.as_secs())));

        match result {
            Ok(reading) if !reading.trim().is_empty() => reading,
            Ok(_) | Err(EnrichError::NoMatch) => {
                tracing::debug!("No reading found, keeping original text");
                text.to_string()
            }
            Err(e) => {
                tracing::warn!(service = "reading", error = %e, "Enrichment degraded");
                text.to_string()
            }
        }
    }

    /// Translation of `text`, or `text` itself
    pub async fn translate(&self, text: &str, source: &str, target: &str) -> String {
        if source.eq_ignore_ascii_case(target) {
            return text.to_string();
        }

        let result = tokio::time::timeout(
            self.timeout,
            self.translator.translate(text, source, target),
        )
        .await
        .unwrap_or(Err(EnrichError::Timeout(self.timeout.as_secs())));

        match result {
            Ok(translation) if !translation.trim().is_empty() => translation,
            Ok(_) => {
                tracing::warn!(service = "translate", "Enrichment degraded: empty translation");
                text.to_string()
            }
            Err(e) => {
                tracing::warn!(
                    service = "translate",
                    source_lang = source,
                    target_lang = target,
                    error = %e,
                    "Enrichment degraded"
                );
                text.to_string()
            }
        }
    }

    /// Reading and translation of Japanese text, looked up concurrently
    pub async fn enrich_japanese(&self, text: &str, target: &str) -> EnrichedText {
        let (reading, translation) =
            tokio::join!(self.lookup_reading(text), self.translate(text, "ja", target));

        EnrichedText {
            original: text.to_string(),
            reading,
            translation,
        }
    }
}
