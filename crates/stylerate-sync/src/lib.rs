//! stylerate-sync: remote result synchronization.
//!
//! Implements the `RemoteSync` trait over HTTP and loads the tool's
//! configuration file, including the endpoint results are forwarded to.

pub mod config;
pub mod error;
pub mod http;
pub mod mock;

pub use config::{create_sync, load_config, load_config_from, StylerateConfig, SyncConfig};
pub use error::SyncError;
pub use http::HttpSync;
