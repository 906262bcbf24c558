//! CLI for the bundledl storefront downloader.

mod commands;

use anyhow::Result;
use bundledl_core::config::{self, BundleConfig};
use bundledl_core::coordinator::DownloadFilters;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_checksum, run_download, run_orders};

/// Top-level CLI for bundledl.
#[derive(Debug, Parser)]
#[command(name = "bundledl")]
#[command(about = "bundledl: bulk downloader for purchased storefront bundles", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download and verify the files of one or more orders.
    Download(DownloadArgs),

    /// List the order keys of the account.
    Orders {
        /// Value of the `_simpleauth_sess` session cookie.
        #[arg(long, value_name = "COOKIE")]
        auth: String,
    },

    /// Print MD5 and SHA1 of a file.
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Value of the `_simpleauth_sess` session cookie.
    #[arg(long, value_name = "COOKIE")]
    pub auth: String,

    /// Order key to download (repeatable).
    #[arg(long = "key", value_name = "KEY", required_unless_present = "all")]
    pub keys: Vec<String>,

    /// Download every order of the account.
    #[arg(long, conflicts_with = "keys")]
    pub all: bool,

    /// Directory orders are downloaded into (one subdirectory per order).
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub out: PathBuf,

    /// Only download groups for this platform (e.g. ebook, audio, windows).
    #[arg(long)]
    pub platform: Option<String>,

    /// Skip formats with this extension.
    #[arg(long, value_name = "EXT")]
    pub exclude: Option<String>,

    /// Only download formats with this extension.
    #[arg(long, value_name = "EXT")]
    pub only: Option<String>,

    /// Apply --only (or the configured one) only to groups offering that extension.
    #[arg(long)]
    pub if_only: bool,

    /// Apply --only strictly, overriding `if_only = true` in the config.
    #[arg(long, conflicts_with = "if_only")]
    pub no_if_only: bool,

    /// Download up to N files of an order concurrently (default from config).
    #[arg(long, value_name = "N")]
    pub jobs: Option<usize>,
}

impl DownloadArgs {
    /// `base` (from the config file) with every filter flag given on the
    /// command line applied on top.
    pub fn filters(&self, base: &DownloadFilters) -> DownloadFilters {
        let if_only = if self.if_only {
            true
        } else if self.no_if_only {
            false
        } else {
            base.if_only
        };
        DownloadFilters {
            platform: self.platform.clone().or_else(|| base.platform.clone()),
            exclude: self.exclude.clone().or_else(|| base.exclude.clone()),
            only: self.only.clone().or_else(|| base.only.clone()),
            if_only,
        }
    }
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        Cli::parse().command.run()
    }

    /// Runs the command. Only commands talking to the store read the config.
    pub fn run(self) -> Result<()> {
        match self {
            CliCommand::Download(args) => run_download(load_config()?, &args)?,
            CliCommand::Orders { auth } => run_orders(&load_config()?, &auth)?,
            CliCommand::Checksum { path } => run_checksum(&path)?,
        }

        Ok(())
    }
}

fn load_config() -> Result<BundleConfig> {
    let cfg = config::load_or_init()?;
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

#[cfg(test)]
mod tests;
