//! Integrity verification against the MD5/SHA1 digests published in order metadata.
//!
//! Files are hashed in a single streaming pass; when a SHA1 is expected both
//! digests are computed together so an inconclusive SHA1 can fall back to MD5
//! without a second read.

use sha1::{Digest, Sha1};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// Digests a format entry is expected to have. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedDigests {
    pub md5: Option<String>,
    pub sha1: Option<String>,
}

impl ExpectedDigests {
    pub fn new(md5: Option<&str>, sha1: Option<&str>) -> Self {
        let clean = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_ascii_lowercase)
        };
        Self {
            md5: clean(md5),
            sha1: clean(sha1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.md5.is_none() && self.sha1.is_none()
    }
}

/// Lowercase hex digests of a file. `sha1` is only filled when requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigests {
    pub md5: String,
    pub sha1: Option<String>,
}

impl fmt::Display for ExpectedDigests {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_pair(f, self.md5.as_deref(), self.sha1.as_deref())
    }
}

impl fmt::Display for FileDigests {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_pair(f, Some(&self.md5), self.sha1.as_deref())
    }
}

fn write_pair(f: &mut fmt::Formatter<'_>, md5: Option<&str>, sha1: Option<&str>) -> fmt::Result {
    match (md5, sha1) {
        (Some(m), Some(s)) => write!(f, "md5 {} / sha1 {}", m, s),
        (Some(m), None) => write!(f, "md5 {}", m),
        (None, Some(s)) => write!(f, "sha1 {}", s),
        (None, None) => write!(f, "no digest"),
    }
}

/// Result of comparing a file against its expected digests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// SHA1 matched.
    Sha1Match,
    /// MD5 matched. `sha1_mismatch` is set when an expected SHA1 disagreed first.
    Md5Match { sha1_mismatch: bool },
    /// Neither digest matched.
    Mismatch {
        expected: ExpectedDigests,
        actual: FileDigests,
    },
    /// Metadata carried no digest at all.
    Unverified,
}

impl Verdict {
    pub fn is_match(&self) -> bool {
        !matches!(self, Verdict::Mismatch { .. })
    }
}

/// Hash a file with MD5, and with SHA1 too when `with_sha1` is set.
pub fn digest_path(path: &Path, with_sha1: bool) -> io::Result<FileDigests> {
    let mut f = File::open(path)?;
    let mut md5_ctx = md5::Context::new();
    let mut sha1 = with_sha1.then(Sha1::new);
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f.read(&mut buf)?;
        if n == 0 {
            break;
        }
        md5_ctx.consume(&buf[..n]);
        if let Some(h) = sha1.as_mut() {
            h.update(&buf[..n]);
        }
    }
    Ok(FileDigests {
        md5: format!("{:x}", md5_ctx.compute()),
        sha1: sha1.map(|h| hex::encode(h.finalize())),
    })
}

/// Compare a file on disk against `expected`.
///
/// With an expected SHA1, a SHA1 match wins outright; a SHA1 mismatch is
/// inconclusive because vendor metadata is not always consistent, so the MD5
/// decides. Without a SHA1 only the MD5 is checked.
pub fn verify_path(path: &Path, expected: &ExpectedDigests) -> io::Result<Verdict> {
    if expected.is_empty() {
        return Ok(Verdict::Unverified);
    }
    let actual = digest_path(path, expected.sha1.is_some())?;
    Ok(judge(expected, actual))
}

fn judge(expected: &ExpectedDigests, actual: FileDigests) -> Verdict {
    let mut sha1_mismatch = false;
    if let (Some(want), Some(got)) = (&expected.sha1, &actual.sha1) {
        if want.eq_ignore_ascii_case(got) {
            return Verdict::Sha1Match;
        }
        sha1_mismatch = true;
    }
    match &expected.md5 {
        Some(want) if want.eq_ignore_ascii_case(&actual.md5) => Verdict::Md5Match { sha1_mismatch },
        _ => Verdict::Mismatch {
            expected: expected.clone(),
            actual,
        },
    }
}
