//! Background services.

pub mod artifact_sweeper;

pub use artifact_sweeper::ArtifactSweeper;
