use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::coordinator::DownloadFilters;

/// Default storefront API root.
pub const DEFAULT_API_BASE_URL: &str = "https://www.humblebundle.com/api/v1";

/// Global configuration loaded from `~/.config/bundledl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleConfig {
    /// Number of files downloaded concurrently within one order.
    pub concurrency: usize,
    /// Failures logged individually per order before the report stops early.
    pub max_reported_failures: usize,
    /// Connect timeout for every HTTP request, in seconds.
    pub connect_timeout_secs: u64,
    /// Optional User-Agent override.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Storefront API root, without trailing slash.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Default download filters; command-line flags override individual fields.
    #[serde(default)]
    pub filters: DownloadFilters,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            max_reported_failures: 10,
            connect_timeout_secs: 30,
            user_agent: None,
            api_base_url: default_api_base_url(),
            filters: DownloadFilters::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("bundledl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<BundleConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = BundleConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: BundleConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = BundleConfig::default();
        assert_eq!(cfg.concurrency, 4);
        assert_eq!(cfg.max_reported_failures, 10);
        assert_eq!(cfg.connect_timeout_secs, 30);
        assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(cfg.filters, DownloadFilters::default());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = BundleConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: BundleConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.concurrency, cfg.concurrency);
        assert_eq!(parsed.max_reported_failures, cfg.max_reported_failures);
        assert_eq!(parsed.api_base_url, cfg.api_base_url);
    }

    #[test]
    fn config_toml_minimal() {
        let toml = r#"
            concurrency = 8
            max_reported_failures = 3
            connect_timeout_secs = 5
        "#;
        let cfg: BundleConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.concurrency, 8);
        assert_eq!(cfg.max_reported_failures, 3);
        assert!(cfg.user_agent.is_none());
        assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(cfg.filters, DownloadFilters::default());
    }

    #[test]
    fn config_toml_filters_section() {
        let toml = r#"
            concurrency = 2
            max_reported_failures = 10
            connect_timeout_secs = 30
            user_agent = "custom/1.0"

            [filters]
            platform = "ebook"
            only = "epub"
            if_only = true
        "#;
        let cfg: BundleConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.user_agent.as_deref(), Some("custom/1.0"));
        assert_eq!(cfg.filters.platform.as_deref(), Some("ebook"));
        assert_eq!(cfg.filters.only.as_deref(), Some("epub"));
        assert!(cfg.filters.exclude.is_none());
        assert!(cfg.filters.if_only);
    }
}
