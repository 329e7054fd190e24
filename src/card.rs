//! Card field synthesis
//!
//! Turns OCR output into the front/back pair of a Basic note. All lines are
//! joined into one text and the whole text is enriched; the front always
//! carries the text as recognized.

use crate::enrich::TextEnricher;
use crate::ocr::OcrLanguage;

/// Front used when OCR found nothing
pub const FALLBACK_FRONT: &str = "What does this image show?";
/// Back used when OCR found nothing
pub const FALLBACK_BACK: &str = "See image";

/// Fields of one note. Anki stores both as HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardFields {
    pub front: String,
    pub back: String,
}

impl CardFields {
    fn fallback() -> Self {
        Self {
            front: FALLBACK_FRONT.to_string(),
            back: FALLBACK_BACK.to_string(),
        }
    }
}

pub struct CardSynthesizer<'a> {
    enricher: &'a TextEnricher,
    target_lang: &'a str,
}

impl<'a> CardSynthesizer<'a> {
    pub fn new(enricher: &'a TextEnricher, target_lang: &'a str) -> Self {
        Self {
            enricher,
            target_lang,
        }
    }

    /// Build card fields from raw OCR text. Never fails and never returns an
    /// empty field.
    pub async fn synthesize(&self, raw_text: &str, language: &OcrLanguage) -> CardFields {
        let Some(full_text) = join_lines(raw_text) else {
            tracing::debug!("OCR produced no text, using fallback fields");
            return CardFields::fallback();
        };

        let front = html_escape::encode_text(&full_text).into_owned();

        let back = if language.is_japanese() {
            let enriched = self.enricher.enrich_japanese(&full_text, self.target_lang).await;
            format!(
                "{}{}",
                section("reading", "Reading", &enriched.reading),
                section("translation", "Translation", &enriched.translation),
            )
        } else {
            let translation = self
                .enricher
                .translate(&full_text, &language.iso639_1(), self.target_lang)
                .await;
            section("translation", "Translation", &translation)
        };

        CardFields { front, back }
    }

    /// User-supplied fields are stored exactly as given
    pub fn synthesize_manual(front: &str, back: &str) -> CardFields {
        CardFields {
            front: front.to_string(),
            back: back.to_string(),
        }
    }
}

/// Non-empty trimmed lines joined by single spaces, or `None` if there are none
fn join_lines(raw_text: &str) -> Option<String> {
    let lines: Vec<&str> = raw_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join(" "))
    }
}

fn section(class: &str, label: &str, content: &str) -> String {
    format!(
        "<div class=\"{}\"><b>{}:</b> {}</div>",
        class,
        label,
        html_escape::encode_text(content)
    )
}
