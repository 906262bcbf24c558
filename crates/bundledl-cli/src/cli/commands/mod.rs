//! CLI command handlers, one per file.

mod checksum;
mod download;
mod orders;

pub use checksum::run_checksum;
pub use download::run_download;
pub use orders::run_orders;
