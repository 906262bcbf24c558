//! Typed order metadata as served by the storefront API.
//!
//! Every field tolerates absence and `null`, since vendor metadata is often
//! incomplete for older purchases.

use serde::{Deserialize, Deserializer, Serialize};

use crate::checksum::ExpectedDigests;
use crate::downloader::DownloadSpec;
use crate::naming;

fn null_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// Entry of the order list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderKey {
    #[serde(default, deserialize_with = "null_default")]
    pub gamekey: String,
}

/// One purchase record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, deserialize_with = "null_default")]
    pub gamekey: String,
    #[serde(default, deserialize_with = "null_default")]
    pub product: OrderProduct,
    #[serde(default, deserialize_with = "null_default")]
    pub subproducts: Vec<SubProduct>,
}

impl Order {
    /// Name of the order's directory: human name, machine name, or key.
    pub fn display_name(&self) -> &str {
        [
            self.product.human_name.as_str(),
            self.product.machine_name.as_str(),
            self.gamekey.as_str(),
        ]
        .into_iter()
        .find(|s| !s.trim().is_empty())
        .unwrap_or("order")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderProduct {
    #[serde(default, deserialize_with = "null_default")]
    pub human_name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub machine_name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub category: String,
}

/// A purchasable item inside an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubProduct {
    #[serde(default, deserialize_with = "null_default")]
    pub machine_name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub human_name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_default")]
    pub downloads: Vec<DownloadGroup>,
}

impl SubProduct {
    pub fn display_name(&self) -> &str {
        if self.human_name.trim().is_empty() {
            &self.machine_name
        } else {
            &self.human_name
        }
    }
}

/// Format variants of a product under one platform tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadGroup {
    #[serde(default, deserialize_with = "null_default")]
    pub machine_name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub human_name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub platform: String,
    #[serde(rename = "download_struct", default, deserialize_with = "null_default")]
    pub formats: Vec<FormatEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatUrls {
    #[serde(default)]
    pub web: Option<String>,
    #[serde(default)]
    pub bittorrent: Option<String>,
}

/// One concrete downloadable file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatEntry {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub url: FormatUrls,
    #[serde(default)]
    pub human_size: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub md5: Option<String>,
    #[serde(default)]
    pub sha1: Option<String>,
}

impl FormatEntry {
    /// Normalized extension, e.g. `"pdf"` for a format named `".PDF"`.
    pub fn extension(&self) -> String {
        naming::format_extension(&self.name)
    }

    pub fn web_url(&self) -> Option<&str> {
        self.url
            .web
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    /// Download descriptor for this entry, or `None` without a web URL.
    pub fn to_spec(&self, platform: &str) -> Option<DownloadSpec> {
        Some(DownloadSpec {
            url: self.web_url()?.to_string(),
            digests: ExpectedDigests::new(self.md5.as_deref(), self.sha1.as_deref()),
            size: self.file_size,
            format: self.name.clone(),
            platform: platform.to_string(),
        })
    }
}
