//! Shared models for the chromashot service.
//!
//! This crate provides:
//! - Per-upload job identifiers
//! - Artifact kinds and deterministic artifact path derivation
//! - Conversion stage names

pub mod artifact;
pub mod job;
pub mod stage;

pub use artifact::{parse_artifact_file_name, ArtifactKind, ArtifactPaths};
pub use job::{InvalidJobId, JobId};
pub use stage::Stage;
