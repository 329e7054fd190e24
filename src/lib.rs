//! Kioku Server
//!
//! Turns a photographed or pasted image into an Anki flashcard: optional OCR,
//! best-effort reading and translation lookups, image optimization, then
//! note creation through AnkiConnect.

pub mod anki;
pub mod card;
pub mod config;
pub mod enrich;
pub mod error;
pub mod imaging;
pub mod ocr;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod upload;
