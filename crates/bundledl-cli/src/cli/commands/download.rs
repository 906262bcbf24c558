//! `bundledl download` – fetch and verify orders into a directory.

use anyhow::{bail, Context, Result};
use bundledl_core::config::BundleConfig;
use bundledl_core::coordinator::Coordinator;
use bundledl_core::http::HttpOptions;
use bundledl_core::store::HttpStoreClient;

use crate::cli::DownloadArgs;

pub fn run_download(mut cfg: BundleConfig, args: &DownloadArgs) -> Result<()> {
    if let Some(jobs) = args.jobs {
        cfg.concurrency = jobs;
    }
    let client = HttpStoreClient::new(&cfg.api_base_url, &args.auth, HttpOptions::from_config(&cfg))?;
    let filters = args.filters(&cfg.filters);
    let coordinator = Coordinator::new(cfg).with_filters(filters);

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;

    let library = if args.all {
        coordinator.download_all(&client, &args.out)?
    } else {
        coordinator.download_keys(&client, &args.keys, &args.out)
    };

    for report in &library.orders {
        println!(
            "{}: {} downloaded, {} already present ({})",
            report.order,
            report.verified,
            report.skipped,
            report.dir.display()
        );
    }
    if !library.is_success() {
        bail!(
            "{} order(s) failed: {}",
            library.failed_orders.len(),
            library.failed_orders.join(", ")
        );
    }
    Ok(())
}
