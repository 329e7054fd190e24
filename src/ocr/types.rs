//! OCR Types
//!
//! Defines types for recognizing text in uploaded card images.

use serde::Serialize;
use std::fmt;

/// OCR provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrProvider {
    /// Tesseract OCR (local CLI)
    Tesseract,
    /// Ollama vision model (local LLM)
    Ollama,
}

/// Language the OCR engine is asked to read.
///
/// Codes follow Tesseract's traineddata names. Unknown codes are kept
/// verbatim and handed to the engine as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OcrLanguage {
    #[default]
    English,
    Japanese,
    /// Japanese set in vertical columns (`jpn_vert` traineddata)
    JapaneseVertical,
    Other(String),
}

impl OcrLanguage {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "eng" => Self::English,
            "jpn" => Self::Japanese,
            "jpn_vert" => Self::JapaneseVertical,
            other => Self::Other(other.to_string()),
        }
    }

    /// Code passed to the OCR engine
    pub fn code(&self) -> &str {
        match self {
            Self::English => "eng",
            Self::Japanese => "jpn",
            Self::JapaneseVertical => "jpn_vert",
            Self::Other(code) => code,
        }
    }

    /// ISO 639-1 code used by the translation service
    pub fn iso639_1(&self) -> String {
        match self {
            Self::English => "en".to_string(),
            Self::Japanese | Self::JapaneseVertical => "ja".to_string(),
            Self::Other(code) => {
                // Multi-language codes such as "spa+eng" translate from the first one
                let primary = code.split('+').next().unwrap_or(code);
                match primary {
                    "spa" => "es",
                    "fra" => "fr",
                    "deu" => "de",
                    "ita" => "it",
                    "por" => "pt",
                    "kor" => "ko",
                    "rus" => "ru",
                    "chi_sim" | "chi_tra" => "zh",
                    "eng" => "en",
                    "jpn" => "ja",
                    other => return other.chars().take(2).collect(),
                }
                .to_string()
            }
        }
    }

    pub fn is_japanese(&self) -> bool {
        matches!(self, Self::Japanese | Self::JapaneseVertical)
    }
}

impl fmt::Display for OcrLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// OCR result
#[derive(Debug, Clone)]
pub struct OcrResult {
    /// Recognized text, possibly empty
    pub text: String,
    /// Provider used
    pub provider: OcrProvider,
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR provider not available: {0}")]
    ProviderNotAvailable(String),

    #[error("OCR processing failed: {0}")]
    ProcessingError(String),

    #[error("OCR timed out after {0}s")]
    Timeout(u64),

    #[error("API error: {0}")]
    ApiError(String),
}
