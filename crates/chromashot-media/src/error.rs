//! Error types for media operations.

use std::path::PathBuf;
use std::time::Duration;

use chromashot_models::Stage;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while running the conversion tools.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0} not found")]
    ToolNotFound(String),

    #[error("{program} exited with non-zero status (code {exit_code:?})")]
    ToolFailed {
        program: String,
        exit_code: Option<i32>,
        stderr: Option<String>,
    },

    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("Tool produced no output file: {0}")]
    MissingOutput(PathBuf),

    #[error("{stage} stage failed: {source}")]
    Conversion {
        stage: Stage,
        #[source]
        source: Box<MediaError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a tool failure error.
    pub fn tool_failed(
        program: impl Into<String>,
        exit_code: Option<i32>,
        stderr: Option<String>,
    ) -> Self {
        Self::ToolFailed {
            program: program.into(),
            exit_code,
            stderr,
        }
    }

    /// Attribute an error to a pipeline stage.
    pub fn conversion(stage: Stage, source: MediaError) -> Self {
        Self::Conversion {
            stage,
            source: Box::new(source),
        }
    }

    /// Stage that failed, if this is a conversion error.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Conversion { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Conversion { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}
