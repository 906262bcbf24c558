use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use filetime::FileTime;

use super::sink::{Decision, FileSink};
use super::{DownloadError, DownloadSpec, UnitOutcome};
use crate::checksum::{self, Verdict};
use crate::http::{self, parse_http_date, HttpOptions, ResponseHead};
use crate::naming;

/// One remote file's full lifecycle: name resolution, skip check, transfer,
/// verification, and timestamp fix-up.
#[derive(Debug, Clone)]
pub struct FileDownloadUnit {
    spec: DownloadSpec,
    dest_dir: PathBuf,
    display_name: String,
    /// Extra stem part keeping fallback names distinct within an order.
    qualifier: Option<String>,
}

impl FileDownloadUnit {
    pub fn new(spec: DownloadSpec, dest_dir: impl Into<PathBuf>, display_name: impl Into<String>) -> Self {
        Self {
            spec,
            dest_dir: dest_dir.into(),
            display_name: display_name.into(),
            qualifier: None,
        }
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn spec(&self) -> &DownloadSpec {
        &self.spec
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Name used when the server sends no usable `Content-Disposition`.
    pub fn fallback_name(&self) -> String {
        naming::qualified_fallback_filename(
            &self.display_name,
            self.qualifier.as_deref(),
            &self.spec.format,
        )
    }

    /// On-disk name for a response carrying `content_disposition`.
    pub fn resolve_name(&self, content_disposition: Option<&str>) -> String {
        content_disposition
            .and_then(naming::disposition_filename)
            .unwrap_or_else(|| self.fallback_name())
    }

    /// Runs the unit to a terminal state.
    ///
    /// Always issues a GET first, since the on-disk name may come from the
    /// response headers. Retrying means calling this again: a completed file
    /// is recognized and skipped.
    pub fn download(&self, opts: &HttpOptions) -> Result<UnitOutcome, DownloadError> {
        let url = self.spec.url.as_str();
        let transport = |source| DownloadError::Transport {
            url: url.to_string(),
            source,
        };

        tracing::debug!("GET {}", url);
        let mut easy = http::prepare_get(FileSink::new(self.clone()), url, opts).map_err(transport)?;
        let performed = easy.perform();
        let sink = easy.get_mut();
        if let Err(e) = performed {
            if !(e.is_write_error() && sink.aborted_on_purpose()) {
                return Err(transport(e));
            }
        }

        match sink.finish() {
            Decision::Rejected { status } => Err(DownloadError::BadStatus {
                url: url.to_string(),
                status,
            }),
            Decision::Failed(err) => Err(err),
            Decision::Skipped { path } => Ok(UnitOutcome::Skipped { path }),
            Decision::Writing {
                file,
                path,
                bytes,
                last_modified,
            } => self.complete(file, path, bytes, last_modified.as_deref()),
        }
    }

    /// Status check, name resolution, skip check, and file creation, in that order.
    /// A response without a status line is rejected with status 0.
    pub(crate) fn decide(&self, head: &ResponseHead) -> Decision {
        if !head.is_success() {
            return Decision::Rejected {
                status: head.status.unwrap_or(0),
            };
        }

        let name = self.resolve_name(head.content_disposition.as_deref());
        let path = self.dest_dir.join(&name);
        tracing::debug!(url = %self.spec.url, name = %name, "resolved file name");

        if self.is_current(&path) {
            tracing::info!("skipping already downloaded file: {}", path.display());
            return Decision::Skipped { path };
        }

        if let Err(e) = fs::create_dir_all(&self.dest_dir) {
            return Decision::Failed(DownloadError::filesystem(
                "create directory",
                &self.dest_dir,
                e,
            ));
        }
        match File::create(&path) {
            Ok(file) => {
                tracing::info!("starting download: {}", path.display());
                Decision::Writing {
                    file: BufWriter::new(file),
                    path,
                    bytes: 0,
                    last_modified: head.last_modified.clone(),
                }
            }
            Err(e) => Decision::Failed(DownloadError::filesystem("create", &path, e)),
        }
    }

    /// True if `path` already holds this file: declared size and digests match.
    pub fn is_current(&self, path: &Path) -> bool {
        let meta = match fs::metadata(path) {
            Ok(m) if m.is_file() => m,
            _ => return false,
        };
        if let Some(size) = self.spec.size {
            if meta.len() != size {
                tracing::debug!(
                    "{} has {} bytes, expected {}",
                    path.display(),
                    meta.len(),
                    size
                );
                return false;
            }
        }
        match checksum::verify_path(path, &self.spec.digests) {
            Ok(verdict) => {
                log_verdict(path, &verdict);
                verdict.is_match()
            }
            Err(e) => {
                tracing::warn!("could not hash {}: {}", path.display(), e);
                false
            }
        }
    }

    fn complete(
        &self,
        file: BufWriter<File>,
        path: PathBuf,
        bytes: u64,
        last_modified: Option<&str>,
    ) -> Result<UnitOutcome, DownloadError> {
        let file = file
            .into_inner()
            .map_err(|e| DownloadError::filesystem("write", &path, e.into_error()))?;
        drop(file);
        tracing::info!("finished saving file {} ({} bytes)", path.display(), bytes);

        let verdict = checksum::verify_path(&path, &self.spec.digests)
            .map_err(|e| DownloadError::filesystem("read", &path, e))?;
        log_verdict(&path, &verdict);
        if let Verdict::Mismatch { expected, actual } = verdict {
            return Err(DownloadError::ChecksumMismatch {
                path,
                expected,
                actual,
            });
        }

        stamp_last_modified(&path, last_modified);
        Ok(UnitOutcome::Verified { path, bytes })
    }
}

fn log_verdict(path: &Path, verdict: &Verdict) {
    match verdict {
        Verdict::Md5Match {
            sha1_mismatch: true,
        } => tracing::warn!("sha1 mismatch for {}, accepted on md5", path.display()),
        Verdict::Unverified => {
            tracing::debug!("no published digest for {}", path.display())
        }
        _ => {}
    }
}

/// Sets access and modification time from a `Last-Modified` value.
/// A missing or unparsable header only skips the fix-up.
fn stamp_last_modified(path: &Path, last_modified: Option<&str>) {
    let Some(raw) = last_modified else {
        tracing::debug!("no Last-Modified header for {}", path.display());
        return;
    };
    match parse_http_date(raw) {
        Ok(time) => {
            let ft = FileTime::from_system_time(time);
            if let Err(e) = filetime::set_file_times(path, ft, ft) {
                tracing::warn!("could not set times on {}: {}", path.display(), e);
            }
        }
        Err(e) => tracing::warn!(
            "error reading Last-Modified header {:?} for {}: {}",
            raw,
            path.display(),
            e
        ),
    }
}
