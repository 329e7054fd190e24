//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::CardPipeline;
use crate::upload::UploadStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    pipeline: CardPipeline,
    uploads: UploadStore,
}

impl AppState {
    /// Create the state with the production pipeline
    pub fn new(config: Config) -> Self {
        let pipeline = CardPipeline::new(&config);
        Self::with_pipeline(config, pipeline)
    }

    /// Create the state around an already assembled pipeline
    pub fn with_pipeline(config: Config, pipeline: CardPipeline) -> Self {
        let uploads = UploadStore::new(config.upload.dir.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                uploads,
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn pipeline(&self) -> &CardPipeline {
        &self.inner.pipeline
    }

    /// Get the upload store
    pub fn uploads(&self) -> &UploadStore {
        &self.inner.uploads
    }
}
