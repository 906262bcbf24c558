//! Order-level driver: expands order metadata into download units, runs them
//! on a [`TaskPool`], and summarizes the outcome.

mod filters;

pub use filters::DownloadFilters;

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::BundleConfig;
use crate::downloader::{DownloadError, FileDownloadUnit, UnitOutcome};
use crate::http::HttpOptions;
use crate::naming::sanitize_filename;
use crate::pool::{Task, TaskPool};
use crate::store::{Order, OrderSource, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("creating output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("order {order:?}: {failed} of {total} file(s) failed")]
    FilesFailed {
        order: String,
        failed: usize,
        total: usize,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome counts of one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleReport {
    pub order: String,
    pub dir: PathBuf,
    pub total: usize,
    pub verified: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BundleReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Outcome of a multi-order run.
#[derive(Debug, Default)]
pub struct LibraryReport {
    pub orders: Vec<BundleReport>,
    /// Keys of orders that failed, in processing order.
    pub failed_orders: Vec<String>,
}

impl LibraryReport {
    pub fn is_success(&self) -> bool {
        self.failed_orders.is_empty()
    }
}

/// Downloads orders with an explicit configuration; holds no other state.
#[derive(Debug, Clone)]
pub struct Coordinator {
    config: BundleConfig,
    filters: DownloadFilters,
    http: HttpOptions,
}

impl Coordinator {
    /// Filters and transport settings start from `config`.
    pub fn new(config: BundleConfig) -> Self {
        let filters = config.filters.clone();
        let http = HttpOptions::from_config(&config);
        Self {
            config,
            filters,
            http,
        }
    }

    pub fn with_filters(mut self, filters: DownloadFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Directory an order is downloaded into, below `out`.
    pub fn order_dir(&self, order: &Order, out: &Path) -> PathBuf {
        let mut name = sanitize_filename(order.display_name());
        if name.is_empty() {
            name = sanitize_filename(&order.gamekey);
        }
        if name.is_empty() {
            name = "order".to_string();
        }
        out.join(name)
    }

    /// Expands `order` into units writing under `dir`, in metadata order.
    ///
    /// Entries without a web URL are skipped; a URL listed twice is planned
    /// once. Fallback names are unique within the plan.
    pub fn plan(&self, order: &Order, dir: &Path) -> Vec<FileDownloadUnit> {
        let mut units = Vec::new();
        let mut seen_urls = HashSet::new();

        for product in &order.subproducts {
            for group in &product.downloads {
                if !self.filters.accepts_platform(&group.platform) {
                    tracing::debug!(
                        "skipping {} for platform {:?}",
                        product.display_name(),
                        group.platform
                    );
                    continue;
                }
                for entry in self.filters.select(&group.formats) {
                    let Some(spec) = entry.to_spec(&group.platform) else {
                        tracing::debug!(
                            "no web download for {} ({})",
                            product.display_name(),
                            entry.name
                        );
                        continue;
                    };
                    if !seen_urls.insert(spec.url.clone()) {
                        continue;
                    }
                    units.push(FileDownloadUnit::new(spec, dir, product.display_name()));
                }
            }
        }
        disambiguate(units)
    }

    /// Downloads every planned file of `order` into its directory below `out`.
    ///
    /// Files that downloaded fine stay on disk even when siblings fail; any
    /// failure makes the whole order fail.
    pub fn download(&self, order: &Order, out: &Path) -> Result<BundleReport, BundleError> {
        let dir = self.order_dir(order, out);
        fs::create_dir_all(&dir).map_err(|source| BundleError::OutputDir {
            path: dir.clone(),
            source,
        })?;

        let units = self.plan(order, &dir);
        tracing::info!(
            "order {}: {} file(s) into {}",
            order.display_name(),
            units.len(),
            dir.display()
        );

        let http = &self.http;
        let tasks: Vec<Task<'_, UnitOutcome, DownloadError>> = units
            .iter()
            .map(|unit| Task::new(unit.fallback_name(), move || unit.download(http)))
            .collect();
        let results = TaskPool::new(self.config.concurrency).run(tasks);

        let mut report = BundleReport {
            order: order.display_name().to_string(),
            dir,
            total: results.len(),
            verified: 0,
            skipped: 0,
            failed: 0,
        };
        let ceiling = self.config.max_reported_failures;
        for result in &results {
            match &result.outcome {
                Ok(UnitOutcome::Skipped { .. }) => report.skipped += 1,
                Ok(UnitOutcome::Verified { .. }) => report.verified += 1,
                Err(err) => {
                    report.failed += 1;
                    if report.failed <= ceiling {
                        tracing::error!("download failed: {}: {}", result.label, err);
                    } else if report.failed == ceiling + 1 {
                        tracing::error!("too many errors, not listing further failures");
                    }
                }
            }
        }

        tracing::info!(
            "order {}: {} downloaded, {} skipped, {} failed",
            report.order,
            report.verified,
            report.skipped,
            report.failed
        );
        if report.failed > 0 {
            return Err(BundleError::FilesFailed {
                order: report.order,
                failed: report.failed,
                total: report.total,
            });
        }
        Ok(report)
    }

    /// Downloads the given orders one after another. A failed order is
    /// logged and recorded; the remaining orders still run.
    pub fn download_keys<S: OrderSource + ?Sized>(
        &self,
        source: &S,
        keys: &[String],
        out: &Path,
    ) -> LibraryReport {
        let mut library = LibraryReport::default();
        for key in keys {
            let result = source
                .order(key)
                .map_err(BundleError::from)
                .and_then(|order| self.download(&order, out));
            match result {
                Ok(report) => library.orders.push(report),
                Err(e) => {
                    tracing::error!("order {}: {}", key, e);
                    library.failed_orders.push(key.clone());
                }
            }
        }
        library
    }

    /// Downloads every order of the account.
    pub fn download_all<S: OrderSource + ?Sized>(
        &self,
        source: &S,
        out: &Path,
    ) -> Result<LibraryReport, BundleError> {
        let keys = source.order_keys()?;
        tracing::info!("downloading {} order(s)", keys.len());
        Ok(self.download_keys(source, &keys, out))
    }
}

/// Makes fallback names unique. Units sharing a name get their platform tag
/// in the stem; names still shared after that get a counter, in plan order.
fn disambiguate(units: Vec<FileDownloadUnit>) -> Vec<FileDownloadUnit> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for unit in &units {
        *counts.entry(unit.fallback_name()).or_insert(0) += 1;
    }

    let limit = units.len() + 1;
    let mut taken = HashSet::new();
    let mut out = Vec::with_capacity(units.len());
    for mut unit in units {
        if counts.get(&unit.fallback_name()).copied().unwrap_or(0) > 1 {
            let platform = unit.spec().platform.clone();
            unit = unit.with_qualifier(platform);
        }
        let base = unit.qualifier().unwrap_or_default().to_string();
        let mut n = 1;
        while !taken.insert(unit.fallback_name()) && n < limit {
            n += 1;
            let qualifier = if base.is_empty() {
                n.to_string()
            } else {
                format!("{}_{}", base, n)
            };
            unit = unit.with_qualifier(qualifier);
        }
        if unit.qualifier().is_some() {
            tracing::debug!(
                "renamed colliding download {} to {}",
                unit.spec().url,
                unit.fallback_name()
            );
        }
        out.push(unit);
    }
    out
}
