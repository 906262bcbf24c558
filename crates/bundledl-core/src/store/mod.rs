//! Storefront API: order listing and per-order metadata.

mod client;
mod types;

pub use client::{HttpStoreClient, SESSION_COOKIE};
pub use types::{DownloadGroup, FormatEntry, FormatUrls, Order, OrderKey, OrderProduct, SubProduct};

/// Source of order metadata. Implemented over HTTP by [`HttpStoreClient`].
pub trait OrderSource {
    /// Keys of every order visible to the account.
    fn order_keys(&self) -> Result<Vec<String>, StoreError>;

    /// Full metadata of one order.
    fn order(&self, key: &str) -> Result<Order, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid API base URL {0:?}")]
    BaseUrl(String),
    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: curl::Error,
    },
    #[error("GET {url} returned HTTP {status}")]
    BadStatus { url: String, status: u32 },
    #[error("decoding response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}
