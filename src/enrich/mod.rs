//! Text enrichment: furigana readings and translation
//!
//! Both lookups are cosmetic. They are bounded by a timeout and fall back to
//! the original text on any failure.

mod reading;
mod service;
mod translate;
mod types;

pub use reading::{JishoReadingLookup, ReadingLookup};
pub use service::TextEnricher;
pub use translate::{MyMemoryTranslator, Translator};
pub use types::{EnrichError, EnrichedText};

#[cfg(test)]
pub use service::fakes;
