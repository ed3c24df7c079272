//! Application state.

use std::sync::Arc;

use chromashot_media::{ConversionPipeline, FrameExtractor, ImageEncoder};
use chromashot_storage::{ArtifactStore, StorageResult};

use crate::config::ApiConfig;

/// Shared application state.
///
/// Nothing here is mutated after startup; requests coordinate only through
/// id-keyed files in the artifact store.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<ArtifactStore>,
    pub pipeline: ConversionPipeline,
}

impl AppState {
    /// Create application state backed by the configured tools and output
    /// directory.
    pub async fn new(config: ApiConfig) -> StorageResult<Self> {
        let store = ArtifactStore::open(&config.output_dir).await?;
        let pipeline = ConversionPipeline::from_tools(
            FrameExtractor::new(&config.extract_tool, config.extract_timeout),
            ImageEncoder::new(&config.encode_tool, config.encode_timeout),
        );

        Ok(Self::with_parts(config, store, pipeline))
    }

    /// Assemble state from already-built parts.
    pub fn with_parts(config: ApiConfig, store: ArtifactStore, pipeline: ConversionPipeline) -> Self {
        Self {
            config,
            store: Arc::new(store),
            pipeline,
        }
    }
}
