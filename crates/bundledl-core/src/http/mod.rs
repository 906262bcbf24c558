//! libcurl plumbing shared by file downloads and the storefront API client.
//!
//! Every request is a blocking `curl::easy::Easy` transfer on the calling
//! thread; callers parallelize by running requests on pool workers.

mod head;

pub use head::{parse_http_date, HeaderLines, ResponseHead};

use curl::easy::{Easy2, Handler, List};
use std::time::Duration;

use crate::config::BundleConfig;

/// Transport settings applied to every request.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    pub user_agent: String,
    /// Extra request headers as (name, value).
    pub headers: Vec<(String, String)>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            user_agent: default_user_agent(),
            headers: Vec::new(),
        }
    }
}

impl HttpOptions {
    pub fn from_config(cfg: &BundleConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            user_agent: cfg
                .user_agent
                .clone()
                .unwrap_or_else(default_user_agent),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

fn default_user_agent() -> String {
    concat!("bundledl/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Prepares an Easy2 handle for a GET of `url`: redirects, connect timeout,
/// user agent, and custom headers. No total transfer timeout is set.
pub(crate) fn prepare_get<H: Handler>(
    handler: H,
    url: &str,
    opts: &HttpOptions,
) -> Result<Easy2<H>, curl::Error> {
    let mut easy = Easy2::new(handler);
    easy.url(url)?;
    easy.get(true)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.useragent(&opts.user_agent)?;

    if !opts.headers.is_empty() {
        let mut list = List::new();
        for (k, v) in &opts.headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        easy.http_headers(list)?;
    }
    Ok(easy)
}
