//! External-tool wrapper for turning a video into a still image.
//!
//! This crate provides:
//! - Command building for external conversion tools
//! - A runner with timeout, kill-on-drop and diagnostic capture
//! - The `ExternalTool` capability trait and the two concrete stages
//! - The two-stage `ConversionPipeline`

pub mod command;
pub mod error;
pub mod pipeline;
pub mod tools;

pub use command::{check_tool, OutputMode, ToolCommand, ToolRunner};
pub use error::{MediaError, MediaResult};
pub use pipeline::ConversionPipeline;
pub use tools::{
    ExternalTool, FrameExtractor, ImageEncoder, DEFAULT_ENCODE_TOOL, DEFAULT_EXTRACT_TIMEOUT,
    DEFAULT_EXTRACT_TOOL,
};
