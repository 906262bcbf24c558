pub mod checksum;
pub mod config;
pub mod coordinator;
pub mod downloader;
pub mod http;
pub mod logging;
pub mod naming;
pub mod pool;
pub mod store;
