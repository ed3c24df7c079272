//! Two-stage video to image conversion.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chromashot_models::{ArtifactPaths, Stage};
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::tools::{ExternalTool, FrameExtractor, ImageEncoder};

/// Runs the extract stage then the encode stage.
///
/// The pipeline only orchestrates. It never deletes files, including the
/// partial ones a failed stage may leave behind; callers own cleanup.
#[derive(Clone)]
pub struct ConversionPipeline {
    extractor: Arc<dyn ExternalTool>,
    encoder: Arc<dyn ExternalTool>,
}

impl ConversionPipeline {
    pub fn new(extractor: Arc<dyn ExternalTool>, encoder: Arc<dyn ExternalTool>) -> Self {
        Self { extractor, encoder }
    }

    /// Pipeline over the real external binaries.
    pub fn from_tools(extractor: FrameExtractor, encoder: ImageEncoder) -> Self {
        Self::new(Arc::new(extractor), Arc::new(encoder))
    }

    pub fn tool(&self, stage: Stage) -> &dyn ExternalTool {
        match stage {
            Stage::Extract => self.extractor.as_ref(),
            Stage::Encode => self.encoder.as_ref(),
        }
    }

    /// Convert `paths.input` into `paths.output` via `paths.intermediate`.
    ///
    /// Encoding only starts if extraction succeeded. Errors are
    /// [`MediaError::Conversion`] tagged with the failing stage.
    pub async fn convert(&self, paths: &ArtifactPaths) -> MediaResult<()> {
        self.run_stage(Stage::Extract, &paths.input, &paths.intermediate)
            .await?;
        self.run_stage(Stage::Encode, &paths.intermediate, &paths.output)
            .await
    }

    async fn run_stage(&self, stage: Stage, input: &Path, output: &Path) -> MediaResult<()> {
        let tool = self.tool(stage);
        let start = Instant::now();

        if let Err(e) = tool.invoke(input, output).await {
            warn!(stage = %stage, program = tool.program(), "Conversion stage failed: {}", e);
            return Err(MediaError::conversion(stage, e));
        }

        debug!(
            stage = %stage,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Conversion stage complete"
        );
        Ok(())
    }
}

impl std::fmt::Debug for ConversionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionPipeline")
            .field("extractor", &self.extractor.program())
            .field("encoder", &self.encoder.program())
            .finish()
    }
}
