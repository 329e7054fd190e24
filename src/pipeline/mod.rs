//! Image-to-flashcard pipeline

mod orchestrator;
mod types;

pub use orchestrator::CardPipeline;
pub use types::{CardMode, CardRequest, ErrorKind, NoteResult, PipelineError, PipelineStage};
