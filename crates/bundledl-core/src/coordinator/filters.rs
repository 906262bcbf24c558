//! Platform and format filters applied while expanding an order.

use serde::{Deserialize, Serialize};

use crate::naming::format_extension;
use crate::store::FormatEntry;

/// Which downloads of an order to fetch. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadFilters {
    /// Keep only download groups with this platform tag (e.g. `ebook`, `audio`).
    #[serde(default)]
    pub platform: Option<String>,
    /// Drop formats with this extension.
    #[serde(default)]
    pub exclude: Option<String>,
    /// Keep only formats with this extension.
    #[serde(default)]
    pub only: Option<String>,
    /// Apply `only` to a group only when the group offers that extension.
    #[serde(default)]
    pub if_only: bool,
}

impl DownloadFilters {
    pub fn accepts_platform(&self, platform: &str) -> bool {
        match normalized(&self.platform) {
            Some(want) => platform.trim().eq_ignore_ascii_case(&want),
            None => true,
        }
    }

    /// Formats of one download group that survive the exclude and only filters.
    pub fn select<'a>(&self, formats: &'a [FormatEntry]) -> Vec<&'a FormatEntry> {
        let exclude = normalized(&self.exclude).map(|e| format_extension(&e));
        let mut kept: Vec<&FormatEntry> = formats
            .iter()
            .filter(|f| exclude.as_deref() != Some(f.extension().as_str()))
            .collect();

        if let Some(only) = normalized(&self.only).map(|o| format_extension(&o)) {
            let offered = kept.iter().any(|f| f.extension() == only);
            if offered || !self.if_only {
                kept.retain(|f| f.extension() == only);
            }
        }
        kept
    }
}

fn normalized(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
