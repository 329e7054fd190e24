//! Card pipeline types

use std::fmt;

use crate::ocr::OcrLanguage;
use crate::upload::TempUpload;

/// How the card fields are obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardMode {
    /// Read the image and synthesize the fields
    Ocr { language: OcrLanguage },
    /// Use the fields the user typed
    Manual { front: String, back: String },
}

impl CardMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ocr { .. } => "ocr",
            Self::Manual { .. } => "manual",
        }
    }
}

/// One card-creation request. Owns its uploaded image.
#[derive(Debug)]
pub struct CardRequest {
    pub upload: TempUpload,
    pub deck_name: String,
    pub mode: CardMode,
}

/// A note created in Anki
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteResult {
    pub note_id: u64,
    pub deck_name: String,
    /// Front as synthesized, without the image reference
    pub front: String,
    pub back: String,
    pub image_filename: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Extracting,
    Synthesizing,
    Optimizing,
    Storing,
    Completed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Extracting => "extracting",
            Self::Synthesizing => "synthesizing",
            Self::Optimizing => "optimizing",
            Self::Storing => "storing",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Failure categories reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or empty input
    InvalidRequest,
    /// The temporary upload could not be read
    UploadFailure,
    /// The OCR engine could not read the image
    OcrFailure,
    /// Anki refused or never received the media file
    StorageFailure,
    /// Anki rejected the note
    NoteCreationFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "InvalidRequest",
            Self::UploadFailure => "UploadFailure",
            Self::OcrFailure => "OCRFailure",
            Self::StorageFailure => "StorageFailure",
            Self::NoteCreationFailure => "NoteCreationFailure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a card request
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind} while {stage}: {message}")]
pub struct PipelineError {
    pub kind: ErrorKind,
    pub stage: PipelineStage,
    pub message: String,
}

impl PipelineError {
    pub fn new(kind: ErrorKind, stage: PipelineStage, message: impl fmt::Display) -> Self {
        Self {
            kind,
            stage,
            message: message.to_string(),
        }
    }
}
