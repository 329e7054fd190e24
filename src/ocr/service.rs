//! OCR Service
//!
//! Wraps the configured OCR provider with a language parameter and a bounded wait.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{OcrBackend, OcrConfig};

use super::{
    provider::{OcrProviderTrait, OllamaProvider, TesseractProvider},
    types::{OcrError, OcrLanguage, OcrProvider},
};

/// OCR service used by the card pipeline
pub struct OcrService {
    provider: Arc<dyn OcrProviderTrait>,
    timeout: Duration,
    default_language: OcrLanguage,
}

impl OcrService {
    /// Create a new OCR service from configuration
    pub fn new(config: &OcrConfig) -> Self {
        let provider: Arc<dyn OcrProviderTrait> = match config.backend {
            OcrBackend::Tesseract => Arc::new(TesseractProvider::new(&config.tesseract_bin)),
            OcrBackend::Ollama => {
                Arc::new(OllamaProvider::new(&config.ollama_url, &config.ollama_model))
            }
        };

        Self::with_provider(provider, config)
    }

    /// Create a service around an explicit provider
    pub fn with_provider(provider: Arc<dyn OcrProviderTrait>, config: &OcrConfig) -> Self {
        Self {
            provider,
            timeout: config.timeout(),
            default_language: OcrLanguage::from_code(&config.default_language),
        }
    }

    pub fn provider_type(&self) -> OcrProvider {
        self.provider.provider_type()
    }

    pub async fn is_available(&self) -> bool {
        self.provider.is_available().await
    }

    pub fn default_language(&self) -> &OcrLanguage {
        &self.default_language
    }

    /// Extract raw text from an image.
    ///
    /// The language code is handed to the engine unvalidated. An empty result
    /// is not an error.
    pub async fn extract_text(
        &self,
        image_data: &[u8],
        language: &OcrLanguage,
    ) -> Result<String, OcrError> {
        let started = Instant::now();
        tracing::debug!(
            provider = ?self.provider.provider_type(),
            language = %language,
            bytes = image_data.len(),
            "OCR started"
        );

        let result = tokio::time::timeout(
            self.timeout,
            self.provider.recognize(image_data, language.code()),
        )
        .await
        .map_err(|_| OcrError::Timeout(self.timeout.as_secs()))??;

        tracing::debug!(
            provider = ?result.provider,
            chars = result.text.chars().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "OCR finished"
        );

        Ok(result.text)
    }
}
