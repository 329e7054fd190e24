//! Card pipeline orchestration
//!
//! `received → extracting → synthesizing → optimizing → storing → completed`,
//! where manual cards skip straight from `received` to `optimizing`. OCR and
//! Anki storage failures end the request; enrichment and optimization
//! failures never do. The uploaded file is removed on every exit path.

use std::sync::Arc;

use base64::Engine;
use tracing::Instrument;

use crate::anki::{AnkiConnectClient, NoteService};
use crate::card::{CardFields, CardSynthesizer};
use crate::config::Config;
use crate::enrich::TextEnricher;
use crate::imaging::ImageOptimizer;
use crate::ocr::OcrService;
use crate::upload::TempUpload;

use super::types::{CardMode, CardRequest, ErrorKind, NoteResult, PipelineError, PipelineStage};

pub struct CardPipeline {
    ocr: OcrService,
    enricher: TextEnricher,
    optimizer: ImageOptimizer,
    notes: Arc<dyn NoteService>,
    target_lang: String,
}

impl CardPipeline {
    /// Build the production pipeline from configuration
    pub fn new(config: &Config) -> Self {
        Self::from_parts(
            OcrService::new(&config.ocr),
            TextEnricher::new(&config.enrichment),
            ImageOptimizer::new(config.image.clone()),
            Arc::new(AnkiConnectClient::new(&config.anki)),
            &config.enrichment.target_lang,
        )
    }

    pub fn from_parts(
        ocr: OcrService,
        enricher: TextEnricher,
        optimizer: ImageOptimizer,
        notes: Arc<dyn NoteService>,
        target_lang: &str,
    ) -> Self {
        Self {
            ocr,
            enricher,
            optimizer,
            notes,
            target_lang: target_lang.to_string(),
        }
    }

    pub fn notes(&self) -> &Arc<dyn NoteService> {
        &self.notes
    }

    pub fn ocr(&self) -> &OcrService {
        &self.ocr
    }

    /// Run one request to completion and delete its upload
    pub async fn create_card(&self, request: CardRequest) -> Result<NoteResult, PipelineError> {
        let CardRequest {
            upload,
            deck_name,
            mode,
        } = request;

        let span = tracing::info_span!("create_card", deck = %deck_name, mode = mode.label());

        async move {
            let result = self.run(&upload, &deck_name, mode).await;
            upload.cleanup().await;

            match &result {
                Ok(note) => tracing::info!(
                    note_id = note.note_id,
                    image = %note.image_filename,
                    "Card created"
                ),
                Err(e) => tracing::warn!(
                    kind = %e.kind,
                    stage = %e.stage,
                    error = %e.message,
                    "Card creation failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        upload: &TempUpload,
        deck_name: &str,
        mode: CardMode,
    ) -> Result<NoteResult, PipelineError> {
        let stage = enter(PipelineStage::Received);

        if deck_name.trim().is_empty() {
            return Err(PipelineError::new(
                ErrorKind::InvalidRequest,
                stage,
                "Deck name must not be empty",
            ));
        }
        if let CardMode::Manual { front, back } = &mode {
            if front.trim().is_empty() || back.trim().is_empty() {
                return Err(PipelineError::new(
                    ErrorKind::InvalidRequest,
                    stage,
                    "Manual cards need both a front and a back",
                ));
            }
        }

        let image = upload
            .read()
            .await
            .map_err(|e| PipelineError::new(ErrorKind::UploadFailure, stage, e))?;

        let fields = match mode {
            CardMode::Manual { front, back } => CardSynthesizer::synthesize_manual(&front, &back),
            CardMode::Ocr { language } => {
                let stage = enter(PipelineStage::Extracting);
                let text = self
                    .ocr
                    .extract_text(&image, &language)
                    .await
                    .map_err(|e| PipelineError::new(ErrorKind::OcrFailure, stage, e))?;

                enter(PipelineStage::Synthesizing);
                CardSynthesizer::new(&self.enricher, &self.target_lang)
                    .synthesize(&text, &language)
                    .await
            }
        };

        enter(PipelineStage::Optimizing);
        let optimized = self
            .optimizer
            .optimize(image, Some(upload.original_name()))
            .await;

        enter(PipelineStage::Storing);
        let result = self.store(deck_name, fields, &optimized.bytes, &optimized.extension).await?;

        enter(PipelineStage::Completed);
        Ok(result)
    }

    async fn store(
        &self,
        deck_name: &str,
        fields: CardFields,
        image: &[u8],
        extension: &str,
    ) -> Result<NoteResult, PipelineError> {
        let stage = PipelineStage::Storing;

        if let Err(e) = self.notes.create_deck(deck_name).await {
            if e.is_already_exists() {
                tracing::debug!(deck = deck_name, "Deck already exists");
            } else {
                tracing::warn!(deck = deck_name, error = %e, "Could not ensure deck, continuing");
            }
        }

        let filename = media_filename(extension);
        let data = base64::engine::general_purpose::STANDARD.encode(image);
        let stored = self
            .notes
            .store_media_file(&filename, &data)
            .await
            .map_err(|e| PipelineError::new(ErrorKind::StorageFailure, stage, e))?;

        let front_html = format!(
            "{}<br><img src=\"{}\">",
            fields.front,
            html_escape::encode_double_quoted_attribute(&stored)
        );

        let note_id = self
            .notes
            .add_note(deck_name, &front_html, &fields.back)
            .await
            .map_err(|e| PipelineError::new(ErrorKind::NoteCreationFailure, stage, e))?;

        Ok(NoteResult {
            note_id,
            deck_name: deck_name.to_string(),
            front: fields.front,
            back: fields.back,
            image_filename: stored,
        })
    }
}

fn enter(stage: PipelineStage) -> PipelineStage {
    tracing::debug!(stage = %stage, "Pipeline stage");
    stage
}

/// `anki_<unix-millis>_<random>.<ext>`; the suffix keeps concurrent requests apart
fn media_filename(extension: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "anki_{}_{}.{}",
        chrono::Utc::now().timestamp_millis(),
        &suffix[..8],
        extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anki::fakes::FakeNoteService;
    use crate::card::{FALLBACK_BACK, FALLBACK_FRONT};
    use crate::enrich::fakes::{Behavior, FakeReading, FakeTranslator};
    use crate::ocr::{MockProvider, OcrLanguage};
    use crate::upload::UploadStore;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Harness {
        pipeline: CardPipeline,
        notes: Arc<FakeNoteService>,
        store: UploadStore,
        _dir: TempDir,
    }

    fn harness(ocr: MockProvider, enrichment: (Behavior, Behavior), notes: FakeNoteService) -> Harness {
        let config = Config::default();
        let notes = Arc::new(notes);
        let dir = TempDir::new().unwrap();

        let pipeline = CardPipeline::from_parts(
            OcrService::with_provider(Arc::new(ocr), &config.ocr),
            TextEnricher::with_services(
                FakeReading::new(enrichment.0),
                FakeTranslator::new(enrichment.1),
                Duration::from_millis(200),
            ),
            ImageOptimizer::new(config.image.clone()),
            notes.clone(),
            "es",
        );

        Harness {
            pipeline,
            notes,
            store: UploadStore::new(dir.path()),
            _dir: dir,
        }
    }

    fn jpeg() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(80, 60, Rgb([10, 120, 200])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Jpeg).unwrap();
        buf.into_inner()
    }

    async fn request(h: &Harness, mode: CardMode, bytes: &[u8]) -> (CardRequest, PathBuf) {
        let upload = h.store.persist("photo.jpg", bytes).await.unwrap();
        let path = upload.path().to_path_buf();
        (
            CardRequest {
                upload,
                deck_name: "Test Deck".to_string(),
                mode,
            },
            path,
        )
    }

    fn ocr(language: &str) -> CardMode {
        CardMode::Ocr {
            language: OcrLanguage::from_code(language),
        }
    }

    fn manual(front: &str, back: &str) -> CardMode {
        CardMode::Manual {
            front: front.to_string(),
            back: back.to_string(),
        }
    }

    fn no_enrichment() -> (Behavior, Behavior) {
        (Behavior::Fail, Behavior::Fail)
    }

    #[tokio::test]
    async fn test_manual_card_end_to_end() {
        let h = harness(MockProvider::failing(), no_enrichment(), FakeNoteService::default());
        let (req, path) = request(&h, manual("Capital of France", "Paris"), &jpeg()).await;

        let note = h.pipeline.create_card(req).await.unwrap();

        assert_eq!(note.front, "Capital of France");
        assert_eq!(note.back, "Paris");
        assert_eq!(note.deck_name, "Test Deck");
        assert!(note.image_filename.starts_with("anki_"));
        assert!(note.image_filename.ends_with(".jpg"));
        assert!(!path.exists());

        let stored = h.notes.notes.lock().unwrap()[0].clone();
        assert_eq!(
            stored.front,
            format!("Capital of France<br><img src=\"{}\">", note.image_filename)
        );
        assert_eq!(stored.back, "Paris");
        assert_eq!(h.notes.calls(), vec!["createDeck", "storeMediaFile", "addNote"]);

        let media = h.notes.media.lock().unwrap();
        assert_eq!(media[0].0, note.image_filename);
        let decoded = base64::engine::general_purpose::STANDARD.decode(&media[0].1).unwrap();
        assert!(image::load_from_memory(&decoded).is_ok());
    }

    #[tokio::test]
    async fn test_ocr_without_text_uses_fallback_fields() {
        let h = harness(MockProvider::returning("  \n\n "), no_enrichment(), FakeNoteService::default());
        let (req, path) = request(&h, ocr("eng"), &jpeg()).await;

        let note = h.pipeline.create_card(req).await.unwrap();

        assert_eq!(note.front, FALLBACK_FRONT);
        assert_eq!(note.back, FALLBACK_BACK);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_japanese_with_unreachable_enrichment_degrades() {
        let h = harness(
            MockProvider::returning("日本語の本"),
            (Behavior::Fail, Behavior::Hang),
            FakeNoteService::default(),
        );
        let (req, _) = request(&h, ocr("jpn"), &jpeg()).await;

        let note = h.pipeline.create_card(req).await.unwrap();

        assert_eq!(note.front, "日本語の本");
        assert_eq!(
            note.back,
            "<div class=\"reading\"><b>Reading:</b> 日本語の本</div>\
             <div class=\"translation\"><b>Translation:</b> 日本語の本</div>"
        );
    }

    #[tokio::test]
    async fn test_existing_deck_does_not_block_completion() {
        let notes = FakeNoteService {
            deck_exists: true,
            ..Default::default()
        };
        let h = harness(MockProvider::failing(), no_enrichment(), notes);
        let (req, _) = request(&h, manual("front", "back"), &jpeg()).await;

        assert!(h.pipeline.create_card(req).await.is_ok());
        assert_eq!(h.notes.notes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_other_deck_errors_are_ignored_too() {
        let notes = FakeNoteService {
            fail_create_deck: true,
            ..Default::default()
        };
        let h = harness(MockProvider::failing(), no_enrichment(), notes);
        let (req, _) = request(&h, manual("front", "back"), &jpeg()).await;

        assert!(h.pipeline.create_card(req).await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_manual_fields_are_rejected() {
        let h = harness(MockProvider::failing(), no_enrichment(), FakeNoteService::default());
        let (req, path) = request(&h, manual("Capital of France", "   "), &jpeg()).await;

        let err = h.pipeline.create_card(req).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::InvalidRequest);
        assert_eq!(err.stage, PipelineStage::Received);
        assert!(!path.exists());
        assert!(h.notes.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_upload_fails_cleanly() {
        let h = harness(MockProvider::failing(), no_enrichment(), FakeNoteService::default());
        let (req, path) = request(&h, manual("front", "back"), &jpeg()).await;
        std::fs::remove_file(&path).unwrap();

        let err = h.pipeline.create_card(req).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::UploadFailure);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_ocr_failure_aborts_and_cleans_up() {
        let h = harness(MockProvider::failing(), no_enrichment(), FakeNoteService::default());
        let (req, path) = request(&h, ocr("eng"), &jpeg()).await;

        let err = h.pipeline.create_card(req).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::OcrFailure);
        assert_eq!(err.stage, PipelineStage::Extracting);
        assert!(!path.exists());
        assert!(h.notes.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_image_is_stored_as_is() {
        let h = harness(MockProvider::returning("hello"), no_enrichment(), FakeNoteService::default());
        let (req, path) = request(&h, ocr("eng"), b"not really a jpeg").await;

        let note = h.pipeline.create_card(req).await.unwrap();

        assert!(note.image_filename.ends_with(".jpg"));
        assert!(!path.exists());
        let media = h.notes.media.lock().unwrap();
        let decoded = base64::engine::general_purpose::STANDARD.decode(&media[0].1).unwrap();
        assert_eq!(decoded, b"not really a jpeg");
    }

    #[tokio::test]
    async fn test_media_failure_is_storage_failure() {
        let notes = FakeNoteService {
            fail_store_media: true,
            ..Default::default()
        };
        let h = harness(MockProvider::failing(), no_enrichment(), notes);
        let (req, path) = request(&h, manual("front", "back"), &jpeg()).await;

        let err = h.pipeline.create_card(req).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::StorageFailure);
        assert_eq!(err.stage, PipelineStage::Storing);
        assert!(!path.exists());
        assert_eq!(h.notes.calls(), vec!["createDeck", "storeMediaFile"]);
    }

    #[tokio::test]
    async fn test_rejected_note_is_note_creation_failure() {
        let notes = FakeNoteService {
            fail_add_note: true,
            ..Default::default()
        };
        let h = harness(MockProvider::returning("text"), no_enrichment(), notes);
        let (req, path) = request(&h, ocr("eng"), &jpeg()).await;

        let err = h.pipeline.create_card(req).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::NoteCreationFailure);
        assert!(err.message.contains("duplicate"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_unreachable_anki_fails_at_storage() {
        let notes = FakeNoteService {
            unreachable: true,
            ..Default::default()
        };
        let h = harness(MockProvider::failing(), no_enrichment(), notes);
        let (req, path) = request(&h, manual("front", "back"), &jpeg()).await;

        let err = h.pipeline.create_card(req).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::StorageFailure);
        assert!(!path.exists());
    }

    #[test]
    fn test_media_filename_shape() {
        let a = media_filename("png");
        let b = media_filename("png");
        assert!(a.starts_with("anki_") && a.ends_with(".png"));
        assert_ne!(a, b);
    }
}
