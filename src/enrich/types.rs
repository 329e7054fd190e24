//! Enrichment types

/// Japanese text with its best-effort enrichments.
///
/// Either enrichment equals `original` when its service could not help.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedText {
    pub original: String,
    pub reading: String,
    pub translation: String,
}

/// Enrichment error types.
///
/// These never leave the enricher: every variant degrades to the original text.
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned status {0}")]
    Status(u16),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("No match for lookup")]
    NoMatch,

    #[error("Empty translation")]
    EmptyTranslation,

    #[error("Timed out after {0}s")]
    Timeout(u64),
}
