//! Authenticated JSON client for the storefront API.

use curl::easy::{Handler, WriteError};
use serde::de::DeserializeOwned;
use url::Url;

use super::{Order, OrderKey, OrderSource, StoreError};
use crate::http::{self, HttpOptions};

/// Name of the session cookie the API authenticates with.
pub const SESSION_COOKIE: &str = "_simpleauth_sess";

/// Collects a response body in memory.
#[derive(Default)]
struct Collect(Vec<u8>);

impl Handler for Collect {
    fn write(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        self.0.extend_from_slice(data);
        Ok(data.len())
    }
}

pub struct HttpStoreClient {
    base: Url,
    http: HttpOptions,
}

impl HttpStoreClient {
    /// Client for the API rooted at `base_url`, authenticated by `session`.
    pub fn new(base_url: &str, session: &str, http: HttpOptions) -> Result<Self, StoreError> {
        let base = Url::parse(base_url).map_err(|_| StoreError::BaseUrl(base_url.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(StoreError::BaseUrl(base_url.to_string()));
        }
        let http = http.with_header("Cookie", &format!("{}={}", SESSION_COOKIE, session.trim()));
        Ok(Self { base, http })
    }

    /// `base` with `segments` appended as percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, StoreError> {
        let url_s = url.as_str();
        let transport = |source| StoreError::Transport {
            url: url_s.to_string(),
            source,
        };

        let mut easy = http::prepare_get(Collect::default(), url_s, &self.http).map_err(transport)?;
        easy.perform().map_err(transport)?;
        let status = easy.response_code().map_err(transport)?;
        if !(200..300).contains(&status) {
            return Err(StoreError::BadStatus {
                url: url_s.to_string(),
                status,
            });
        }

        serde_json::from_slice(&easy.get_ref().0).map_err(|source| StoreError::Decode {
            url: url_s.to_string(),
            source,
        })
    }
}

impl OrderSource for HttpStoreClient {
    fn order_keys(&self) -> Result<Vec<String>, StoreError> {
        let keys: Vec<OrderKey> = self.get_json(&self.endpoint(&["user", "order"]))?;
        tracing::debug!("account has {} order(s)", keys.len());
        Ok(keys
            .into_iter()
            .map(|k| k.gamekey)
            .filter(|k| !k.is_empty())
            .collect())
    }

    fn order(&self, key: &str) -> Result<Order, StoreError> {
        let mut order: Order = self.get_json(&self.endpoint(&["order", key]))?;
        if order.gamekey.is_empty() {
            order.gamekey = key.to_string();
        }
        Ok(order)
    }
}
