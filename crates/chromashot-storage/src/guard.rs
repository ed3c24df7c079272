//! Scoped artifact cleanup.

use std::io::{self, ErrorKind};
use std::ops::Deref;
use std::path::{Path, PathBuf};

use scopeguard::ScopeGuard;
use tracing::{debug, warn};

/// Deletes its artifact when dropped.
///
/// Dropping happens on every exit path of the owning scope: normal return,
/// early `?` return, panic unwinding, or cancellation of the enclosing future.
/// Use [`ArtifactGuard::disarm`] to hand the file over instead.
#[must_use = "the artifact is deleted as soon as the guard is dropped"]
pub struct ArtifactGuard(ScopeGuard<PathBuf, fn(PathBuf)>);

impl ArtifactGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(scopeguard::guard(path.into(), remove_on_drop as fn(PathBuf)))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Keep the artifact on disk and return its path.
    pub fn disarm(self) -> PathBuf {
        ScopeGuard::into_inner(self.0)
    }
}

impl Deref for ArtifactGuard {
    type Target = Path;

    fn deref(&self) -> &Path {
        self.path()
    }
}

impl std::fmt::Debug for ArtifactGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ArtifactGuard").field(&self.path()).finish()
    }
}

// Drop cannot await, so the unlink is synchronous. A single unlink does not
// stall the runtime noticeably; bulk removal goes through
// `ArtifactStore::delete` instead.
fn remove_on_drop(path: PathBuf) {
    removal_outcome(&path, std::fs::remove_file(&path));
}

/// Interpret the result of removing `path`: a missing file counts as nothing
/// removed, other failures are logged and swallowed. Returns whether a file
/// was actually removed.
pub(crate) fn removal_outcome(path: &Path, result: io::Result<()>) -> bool {
    match result {
        Ok(()) => {
            debug!(path = %path.display(), "Removed artifact");
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            warn!(path = %path.display(), "Failed to remove artifact: {}", e);
            false
        }
    }
}
