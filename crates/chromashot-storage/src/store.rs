//! Directory-backed artifact store.

use std::ffi::{OsStr, OsString};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use futures_util::{pin_mut, Stream, StreamExt};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use chromashot_models::{parse_artifact_file_name, ArtifactKind, ArtifactPaths, JobId};

use crate::error::{StorageError, StorageResult};
use crate::guard::{removal_outcome, ArtifactGuard};
use crate::served::ServedArtifact;

/// Suffix of an output that has been claimed by a serving request.
const CLAIMED_SUFFIX: &str = ".serving";

/// Owns every transient file of every conversion, keyed by job id.
///
/// All artifacts live flat under a single root directory. Filenames are
/// derived from unique job ids, so concurrent jobs never touch the same file
/// and no locking is required.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        info!(root = %root.display(), "Artifact store ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Derive the artifact paths for a job. Pure, no I/O.
    pub fn reserve_paths(&self, id: &JobId) -> ArtifactPaths {
        ArtifactPaths::derive(&self.root, id)
    }

    /// Register deferred deletion of `path`.
    pub fn guard(&self, path: impl Into<PathBuf>) -> ArtifactGuard {
        ArtifactGuard::new(path)
    }

    /// Persist an uploaded byte stream to `path`. Returns the number of bytes
    /// written.
    pub async fn write_input<S, E>(&self, path: &Path, stream: S) -> StorageResult<u64>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        pin_mut!(stream);

        let mut file = File::create(path).await?;
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| StorageError::upload_failed(e.to_string()))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        debug!(path = %path.display(), bytes = written, "Stored upload");
        Ok(written)
    }

    /// Best-effort, idempotent deletion. Never fails; returns whether a file
    /// was removed.
    pub async fn delete(&self, path: &Path) -> bool {
        removal_outcome(path, fs::remove_file(path).await)
    }

    pub async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    /// Claim an artifact for a single read.
    ///
    /// The file is atomically renamed away from `path` before it is opened,
    /// so of several concurrent callers exactly one succeeds and the rest see
    /// [`StorageError::NotFound`].
    pub async fn open_for_read(&self, path: &Path) -> StorageResult<ServedArtifact> {
        let claimed = claimed_path(path);

        match fs::rename(path, &claimed).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::not_found(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        let guard = self.guard(claimed);
        let file = File::open(guard.path()).await?;
        let content_length = file.metadata().await?.len();

        Ok(ServedArtifact::new(file, content_length, guard))
    }

    /// Delete every artifact under the root last modified more than
    /// `max_age` ago. Returns the number of files removed.
    ///
    /// Only files named like artifacts (`<id>.mp4`, `<id>.ppm`, `<id>.png`,
    /// `<id>.png.serving`) are considered; anything else sharing the root is
    /// left alone.
    pub async fn sweep_stale(&self, max_age: Duration) -> StorageResult<usize> {
        let now = SystemTime::now();
        let mut entries = fs::read_dir(&self.root).await?;
        let mut removed = 0usize;

        while let Some(entry) = entries.next_entry().await? {
            if !is_artifact_file_name(&entry.file_name()) {
                continue;
            }
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }

            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok());

            if matches!(age, Some(age) if age >= max_age) && self.delete(&entry.path()).await {
                removed += 1;
            }
        }

        if removed > 0 {
            info!(removed, root = %self.root.display(), "Swept stale artifacts");
        }
        Ok(removed)
    }
}

/// Whether `name` is a file this store creates, claimed outputs included.
fn is_artifact_file_name(name: &OsStr) -> bool {
    let Some(name) = name.to_str() else {
        return false;
    };

    match name.strip_suffix(CLAIMED_SUFFIX) {
        Some(claimed) => {
            matches!(parse_artifact_file_name(claimed), Some((_, ArtifactKind::Output)))
        }
        None => parse_artifact_file_name(name).is_some(),
    }
}

fn claimed_path(path: &Path) -> PathBuf {
    let mut claimed = OsString::from(path.as_os_str());
    claimed.push(CLAIMED_SUFFIX);
    PathBuf::from(claimed)
}
