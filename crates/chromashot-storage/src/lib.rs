//! Local artifact storage.
//!
//! This crate provides:
//! - Deterministic, id-keyed artifact paths under an injected root
//! - Streaming upload persistence
//! - Idempotent best-effort deletion
//! - Scoped cleanup guards
//! - Single-serve reads that delete the artifact once the stream is dropped
//! - Sweeping of abandoned artifacts

pub mod error;
pub mod guard;
pub mod served;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use guard::ArtifactGuard;
pub use served::{ArtifactStream, ServedArtifact};
pub use store::ArtifactStore;
