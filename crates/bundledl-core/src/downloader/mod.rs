//! Per-file download-and-verify state machine.
//!
//! A [`FileDownloadUnit`] issues one GET, resolves the on-disk name from the
//! response headers, skips the transfer when an identical file is already in
//! place, otherwise streams the body to disk, verifies it against the
//! published digests, and stamps the server's modification time.
//!
//! ```text
//! START -> NAME_RESOLVED -> SKIPPED
//!                        -> TRANSFERRING -> VERIFIED
//!       (any step)       -> FAILED
//! ```

mod sink;
mod unit;

use std::io;
use std::path::{Path, PathBuf};

use crate::checksum::{ExpectedDigests, FileDigests};

pub use unit::FileDownloadUnit;

/// Immutable descriptor of one remote file, taken from order metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSpec {
    pub url: String,
    pub digests: ExpectedDigests,
    /// Declared size in bytes, when the metadata carries one.
    pub size: Option<u64>,
    /// Declared format name, e.g. `".pdf"` or `"EPUB"`.
    pub format: String,
    /// Platform tag of the download group, e.g. `"ebook"`.
    pub platform: String,
}

/// Successful terminal state of a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    /// An identical file was already on disk; nothing was transferred.
    Skipped { path: PathBuf },
    /// The body was written and matched the published digests.
    Verified { path: PathBuf, bytes: u64 },
}

impl UnitOutcome {
    pub fn path(&self) -> &Path {
        match self {
            UnitOutcome::Skipped { path } | UnitOutcome::Verified { path, .. } => path,
        }
    }

    pub fn was_skipped(&self) -> bool {
        matches!(self, UnitOutcome::Skipped { .. })
    }
}

/// Failed terminal state of a unit. Never aborts sibling units.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: curl::Error,
    },
    #[error("GET {url} returned HTTP {status}")]
    BadStatus { url: String, status: u32 },
    #[error("{action} {}: {source}", .path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("checksum mismatch for {}: expected {expected}, got {actual}", .path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: ExpectedDigests,
        actual: FileDigests,
    },
}

impl DownloadError {
    pub(crate) fn filesystem(action: &'static str, path: &Path, source: io::Error) -> Self {
        DownloadError::Filesystem {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}
