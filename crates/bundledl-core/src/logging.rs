//! Tracing setup for the CLI.
//!
//! Events go to an append-only file in the XDG state directory. When that
//! file cannot be opened the caller falls back to [`init_logging_stderr`].

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
const DEFAULT_FILTER: &str = "info,bundledl=debug,bundledl_core=debug";

const LOG_FILE: &str = "bundledl.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// `$XDG_STATE_HOME/bundledl/bundledl.log`, creating the directory.
pub fn log_path() -> Result<PathBuf> {
    let dirs = xdg::BaseDirectories::with_prefix("bundledl")?;
    let state = dirs.get_state_home();
    fs::create_dir_all(&state).with_context(|| format!("creating {}", state.display()))?;
    Ok(state.join(LOG_FILE))
}

/// Installs the global subscriber writing to [`log_path`]. Returns the path.
pub fn init_logging() -> Result<PathBuf> {
    let path = log_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {}", e))?;

    tracing::info!("logging to {}", path.display());
    Ok(path)
}

/// Installs a stderr subscriber. A subscriber installed earlier wins.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_valid() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
