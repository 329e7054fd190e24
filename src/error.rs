//! Error types for the Kioku server

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::anki::AnkiError;
use crate::pipeline::{ErrorKind, PipelineError};
use crate::upload::UploadError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Malformed upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Anki(#[from] AnkiError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}

/// Error response body
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    success: bool,
    error: String,
    error_kind: &'static str,
    message: String,
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorKind::OcrFailure => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::StorageFailure | ErrorKind::NoteCreationFailure => StatusCode::BAD_GATEWAY,
        ErrorKind::UploadFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_kind, error) = match &self {
            AppError::BadRequest(_) => (
                StatusCode::BAD_REQUEST,
                ErrorKind::InvalidRequest.as_str(),
                "Invalid request",
            ),
            AppError::Multipart(e) => {
                tracing::warn!("Failed to read multipart body: {}", e);
                (e.status(), ErrorKind::InvalidRequest.as_str(), "Could not read the upload")
            }
            AppError::Pipeline(e) => {
                let summary = match e.kind {
                    ErrorKind::InvalidRequest => "Invalid request",
                    ErrorKind::UploadFailure => "Could not process the upload",
                    ErrorKind::OcrFailure => "Could not read text from the image",
                    ErrorKind::StorageFailure => "Could not store the image in Anki",
                    ErrorKind::NoteCreationFailure => "Anki rejected the note",
                };
                (status_for(e.kind), e.kind.as_str(), summary)
            }
            AppError::Anki(e @ (AnkiError::Unreachable(_) | AnkiError::Timeout(_))) => {
                tracing::warn!("AnkiConnect unavailable: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "AnkiUnavailable",
                    "Could not connect to AnkiConnect",
                )
            }
            AppError::Anki(e) => {
                tracing::error!("AnkiConnect error: {}", e);
                (StatusCode::BAD_GATEWAY, "AnkiError", "AnkiConnect request failed")
            }
            AppError::Upload(UploadError::InvalidFileType(_)) => (
                StatusCode::BAD_REQUEST,
                ErrorKind::InvalidRequest.as_str(),
                "Invalid file type",
            ),
            AppError::Upload(e) => {
                tracing::error!("Upload error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorKind::UploadFailure.as_str(),
                    "Could not process the upload",
                )
            }
        };

        let message = match &self {
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Pipeline(e) => e.message.clone(),
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            success: false,
            error: error.to_string(),
            error_kind,
            message,
        });

        (status, body).into_response()
    }
}
