//! Single-serve artifact reads.

use std::io;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::guard::ArtifactGuard;

/// An artifact claimed for serving.
///
/// The file has already been moved out of its public path, so no other
/// request can open it. It is deleted once this value, or the stream made
/// from it, is dropped.
#[derive(Debug)]
pub struct ServedArtifact {
    file: File,
    content_length: u64,
    guard: ArtifactGuard,
}

impl ServedArtifact {
    pub(crate) fn new(file: File, content_length: u64, guard: ArtifactGuard) -> Self {
        Self {
            file,
            content_length,
            guard,
        }
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Path of the claimed file while it is being served.
    pub fn path(&self) -> &Path {
        self.guard.path()
    }

    /// Convert into a byte stream that owns the cleanup guard.
    pub fn into_stream(self) -> ArtifactStream {
        ArtifactStream {
            inner: ReaderStream::new(self.file),
            _guard: self.guard,
        }
    }
}

/// File contents as a stream of chunks.
///
/// Dropping the stream (after the last chunk, or early on a transport error)
/// deletes the file.
pub struct ArtifactStream {
    // Declared before the guard so the handle is closed before deletion.
    inner: ReaderStream<File>,
    _guard: ArtifactGuard,
}

impl Stream for ArtifactStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
