//! Anki note storage via AnkiConnect
//!
//! The pipeline only talks to [`NoteService`]; [`AnkiConnectClient`] is the
//! production implementation.

mod client;
mod types;

use async_trait::async_trait;

pub use client::AnkiConnectClient;
pub use types::{AnkiError, ApiRequest, ApiResponse, NewNote, NoteOptions, ANKI_CONNECT_VERSION};

/// One method per AnkiConnect action the service uses
#[async_trait]
pub trait NoteService: Send + Sync {
    async fn version(&self) -> Result<u32, AnkiError>;

    async fn deck_names(&self) -> Result<Vec<String>, AnkiError>;

    /// Create the deck if needed. AnkiConnect treats existing decks as success.
    async fn create_deck(&self, deck_name: &str) -> Result<(), AnkiError>;

    /// Store a base64 payload as a media file, returning the stored name
    async fn store_media_file(&self, filename: &str, base64_data: &str) -> Result<String, AnkiError>;

    /// Add a note with the given fields, returning its id
    async fn add_note(&self, deck_name: &str, front: &str, back: &str) -> Result<u64, AnkiError>;
}
