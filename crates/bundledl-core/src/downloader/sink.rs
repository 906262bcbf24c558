//! curl Handler that turns a response into a file on disk.
//!
//! Nothing is decided until the first body chunk arrives: by then the final
//! response headers are known, so the status is checked, the name resolved,
//! and the skip check run before any byte is written. Returning a short
//! count from `write` aborts the transfer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use curl::easy::{Handler, WriteError};

use super::{DownloadError, FileDownloadUnit};
use crate::http::HeaderLines;

/// What to do with the response body, decided once per transfer.
#[derive(Debug)]
pub(crate) enum Decision {
    /// Non-2xx status; body discarded.
    Rejected { status: u32 },
    /// Identical file already present; body discarded.
    Skipped { path: PathBuf },
    /// Streaming the body to `path`.
    Writing {
        file: BufWriter<File>,
        path: PathBuf,
        bytes: u64,
        last_modified: Option<String>,
    },
    /// A filesystem step failed; body discarded, partial file left in place.
    Failed(DownloadError),
}

impl Decision {
    /// Writes a chunk, returning the count to hand back to curl (0 aborts).
    fn write(&mut self, data: &[u8]) -> usize {
        let failure = match self {
            Decision::Writing {
                file, path, bytes, ..
            } => match file.write_all(data) {
                Ok(()) => {
                    *bytes += data.len() as u64;
                    return data.len();
                }
                Err(e) => DownloadError::filesystem("write", path, e),
            },
            _ => return 0,
        };
        *self = Decision::Failed(failure);
        0
    }

    /// True when the transfer was stopped on purpose rather than by the network.
    fn stops_transfer(&self) -> bool {
        !matches!(self, Decision::Writing { .. })
    }
}

pub(crate) struct FileSink {
    unit: FileDownloadUnit,
    headers: HeaderLines,
    decision: Option<Decision>,
}

impl FileSink {
    pub(crate) fn new(unit: FileDownloadUnit) -> Self {
        Self {
            unit,
            headers: HeaderLines::default(),
            decision: None,
        }
    }

    /// True if a write error from curl was caused by this sink's own decision.
    pub(crate) fn aborted_on_purpose(&self) -> bool {
        self.decision
            .as_ref()
            .map(Decision::stops_transfer)
            .unwrap_or(false)
    }

    /// Final decision for a completed transfer. An empty body never reaches
    /// `write`, so the decision is made here from the headers alone.
    pub(crate) fn finish(&mut self) -> Decision {
        match self.decision.take() {
            Some(d) => d,
            None => self.unit.decide(&self.headers.parse()),
        }
    }
}

impl Handler for FileSink {
    fn header(&mut self, data: &[u8]) -> bool {
        self.headers.push(data);
        true
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        if self.decision.is_none() {
            let decision = self.unit.decide(&self.headers.parse());
            self.decision = Some(decision);
        }
        Ok(self
            .decision
            .as_mut()
            .map(|d| d.write(data))
            .unwrap_or(0))
    }
}
