//! Card creation endpoint
//!
//! `POST /api/upload-image` takes a multipart form:
//! - `image`: the picture (jpeg, png, gif or bmp)
//! - `deckName`: target deck, `Default` when absent
//! - `useOCR`: `"true"` to read the card text from the image
//! - `ocrLanguage`: Tesseract language code for OCR mode
//! - `front` / `back`: card text for manual mode

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::ocr::OcrLanguage;
use crate::pipeline::{CardMode, CardRequest};
use crate::state::AppState;
use crate::upload::{is_allowed_image, UploadError};

const DEFAULT_DECK: &str = "Default";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub note_id: u64,
    pub preview: CardPreview,
}

#[derive(Serialize)]
pub struct CardPreview {
    pub front: String,
    pub back: String,
    pub image: String,
}

struct ImageField {
    file_name: String,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct UploadForm {
    image: Option<ImageField>,
    deck_name: Option<String>,
    use_ocr: bool,
    ocr_language: Option<String>,
    front: Option<String>,
    back: Option<String>,
}

impl UploadForm {
    async fn parse(mut multipart: Multipart) -> Result<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();

            if name == "image" {
                let file_name = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().map(|s| s.to_string());

                if !is_allowed_image(&file_name, content_type.as_deref()) {
                    return Err(UploadError::InvalidFileType(file_name).into());
                }

                let bytes = field.bytes().await?;
                tracing::debug!("Received image '{}' ({} bytes)", file_name, bytes.len());

                form.image = Some(ImageField {
                    file_name,
                    bytes: bytes.to_vec(),
                });
                continue;
            }

            let value = field.text().await?;

            match name.as_str() {
                "deckName" => form.deck_name = Some(value),
                "useOCR" => form.use_ocr = value.trim() == "true",
                "ocrLanguage" => form.ocr_language = Some(value),
                "front" => form.front = Some(value),
                "back" => form.back = Some(value),
                other => tracing::debug!("Ignoring unknown field '{}'", other),
            }
        }

        Ok(form)
    }

    fn mode(&self, default_language: &OcrLanguage) -> CardMode {
        if self.use_ocr {
            let language = self
                .ocr_language
                .as_deref()
                .filter(|code| !code.trim().is_empty())
                .map(OcrLanguage::from_code)
                .unwrap_or_else(|| default_language.clone());
            CardMode::Ocr { language }
        } else {
            CardMode::Manual {
                front: self.front.clone().unwrap_or_default(),
                back: self.back.clone().unwrap_or_default(),
            }
        }
    }
}

/// POST /api/upload-image
async fn upload_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let form = UploadForm::parse(multipart).await?;
    let mode = form.mode(state.pipeline().ocr().default_language());

    let image = form
        .image
        .ok_or_else(|| AppError::BadRequest("No image uploaded".to_string()))?;

    let deck_name = form
        .deck_name
        .filter(|deck| !deck.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DECK.to_string());

    let upload = state.uploads().persist(&image.file_name, &image.bytes).await?;

    let note = state
        .pipeline()
        .create_card(CardRequest {
            upload,
            deck_name,
            mode,
        })
        .await?;

    Ok(Json(UploadResponse {
        success: true,
        message: "Card created successfully".to_string(),
        note_id: note.note_id,
        preview: CardPreview {
            front: note.front,
            back: note.back,
            image: note.image_filename,
        },
    }))
}

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/upload-image", post(upload_image))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
