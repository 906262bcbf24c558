//! `bundledl orders` – list the account's order keys.

use anyhow::{Context, Result};
use bundledl_core::config::BundleConfig;
use bundledl_core::http::HttpOptions;
use bundledl_core::store::{HttpStoreClient, OrderSource};

pub fn run_orders(cfg: &BundleConfig, auth: &str) -> Result<()> {
    let client = HttpStoreClient::new(&cfg.api_base_url, auth, HttpOptions::from_config(cfg))?;
    let keys = client.order_keys().context("listing orders")?;
    for key in &keys {
        println!("{}", key);
    }
    tracing::info!("{} order(s)", keys.len());
    Ok(())
}
