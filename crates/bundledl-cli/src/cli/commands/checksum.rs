//! Checksum command: MD5 and SHA1 of a file, to compare with order metadata.

use anyhow::{Context, Result};
use bundledl_core::checksum;
use std::path::Path;

pub fn run_checksum(path: &Path) -> Result<()> {
    let digests = checksum::digest_path(path, true)
        .with_context(|| format!("hashing {}", path.display()))?;
    println!("md5   {}  {}", digests.md5, path.display());
    if let Some(sha1) = digests.sha1 {
        println!("sha1  {}  {}", sha1, path.display());
    }
    Ok(())
}
