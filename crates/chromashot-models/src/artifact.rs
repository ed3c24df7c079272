//! Artifact kinds and path derivation.

use std::path::{Path, PathBuf};

use crate::job::JobId;

/// Kind of transient file produced during one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Uploaded video
    Input,
    /// Frame written by the extract stage
    Intermediate,
    /// Final image served to the client
    Output,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::Input,
        ArtifactKind::Intermediate,
        ArtifactKind::Output,
    ];

    /// Kind whose on-disk extension is `ext`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.extension() == ext)
    }

    /// File extension used on disk.
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Input => "mp4",
            ArtifactKind::Intermediate => "ppm",
            ArtifactKind::Output => "png",
        }
    }

    /// MIME type of the artifact.
    pub fn content_type(&self) -> &'static str {
        match self {
            ArtifactKind::Input => "video/mp4",
            ArtifactKind::Intermediate => "image/x-portable-pixmap",
            ArtifactKind::Output => "image/png",
        }
    }
}

/// On-disk locations of every artifact of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub input: PathBuf,
    pub intermediate: PathBuf,
    pub output: PathBuf,
}

impl ArtifactPaths {
    /// Derive the artifact paths of `id` under `root`. Pure, no I/O.
    pub fn derive(root: impl AsRef<Path>, id: &JobId) -> Self {
        let root = root.as_ref();
        Self {
            input: artifact_path(root, id, ArtifactKind::Input),
            intermediate: artifact_path(root, id, ArtifactKind::Intermediate),
            output: artifact_path(root, id, ArtifactKind::Output),
        }
    }

    /// All paths, in creation order.
    pub fn all(&self) -> [&Path; 3] {
        [&self.input, &self.intermediate, &self.output]
    }
}

/// Path of a single artifact: `<root>/<id>.<ext>`.
pub fn artifact_path(root: &Path, id: &JobId, kind: ArtifactKind) -> PathBuf {
    root.join(format!("{}.{}", id, kind.extension()))
}

/// Inverse of [`artifact_path`] for a bare file name. Anything that is not
/// exactly `<id>.<ext>` yields `None`.
pub fn parse_artifact_file_name(name: &str) -> Option<(JobId, ArtifactKind)> {
    let (stem, ext) = name.split_once('.')?;
    let kind = ArtifactKind::from_extension(ext)?;
    let id = JobId::parse(stem).ok()?;
    Some((id, kind))
}
