//! The two external conversion tools.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::command::{OutputMode, ToolCommand, ToolRunner};
use crate::error::MediaResult;

/// Default frame extraction binary.
pub const DEFAULT_EXTRACT_TOOL: &str = "./chromashot_fast";
/// Default image encoding binary.
pub const DEFAULT_ENCODE_TOOL: &str = "ffmpeg";
/// Wall-clock limit for frame extraction.
pub const DEFAULT_EXTRACT_TIMEOUT: Duration = Duration::from_secs(300);

/// A conversion tool, characterised only by its file contract, exit status
/// and timeout.
///
/// `invoke` reads `input` and must leave its result at `output`. Any
/// failure, including a timeout, is an error.
#[async_trait]
pub trait ExternalTool: Send + Sync {
    /// Program name, for logs and readiness checks.
    fn program(&self) -> &str;

    async fn invoke(&self, input: &Path, output: &Path) -> MediaResult<()>;
}

/// Stage one: `tool input output`, video to intermediate frame.
#[derive(Debug, Clone)]
pub struct FrameExtractor {
    program: String,
    runner: ToolRunner,
}

impl FrameExtractor {
    pub fn new(program: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            runner: ToolRunner::new()
                .with_optional_timeout(timeout)
                .with_output(OutputMode::Capture),
        }
    }

    pub fn command(&self, input: &Path, output: &Path) -> ToolCommand {
        ToolCommand::new(&self.program).path_arg(input).path_arg(output)
    }
}

impl Default for FrameExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_EXTRACT_TOOL, Some(DEFAULT_EXTRACT_TIMEOUT))
    }
}

#[async_trait]
impl ExternalTool for FrameExtractor {
    fn program(&self) -> &str {
        &self.program
    }

    async fn invoke(&self, input: &Path, output: &Path) -> MediaResult<()> {
        self.runner.run(&self.command(input, output)).await
    }
}

/// Stage two: `tool -y -i input output`, intermediate frame to final image.
/// Diagnostics are discarded.
#[derive(Debug, Clone)]
pub struct ImageEncoder {
    program: String,
    runner: ToolRunner,
}

impl ImageEncoder {
    pub fn new(program: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            runner: ToolRunner::new()
                .with_optional_timeout(timeout)
                .with_output(OutputMode::Discard),
        }
    }

    pub fn command(&self, input: &Path, output: &Path) -> ToolCommand {
        ToolCommand::new(&self.program)
            .args(["-y", "-i"])
            .path_arg(input)
            .path_arg(output)
    }
}

impl Default for ImageEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_ENCODE_TOOL, None)
    }
}

#[async_trait]
impl ExternalTool for ImageEncoder {
    fn program(&self) -> &str {
        &self.program
    }

    async fn invoke(&self, input: &Path, output: &Path) -> MediaResult<()> {
        self.runner.run(&self.command(input, output)).await
    }
}
