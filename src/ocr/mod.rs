//! OCR Module
//!
//! Provides OCR (Optical Character Recognition) for uploaded card images.
//!
//! Supports multiple backends:
//! - Tesseract (local, requires installation)
//! - Ollama vision models (local LLM)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kioku_server::ocr::{OcrLanguage, OcrService};
//!
//! let service = OcrService::new(&config.ocr);
//! let text = service.extract_text(&image_bytes, &OcrLanguage::Japanese).await?;
//! ```

mod provider;
mod service;
mod types;

pub use provider::{OcrProviderTrait, OllamaProvider, TesseractProvider};
pub use service::OcrService;
pub use types::{OcrError, OcrLanguage, OcrProvider, OcrResult};

#[cfg(test)]
pub use provider::MockProvider;
