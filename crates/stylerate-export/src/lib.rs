//! stylerate-export: CSV encoding and delivery of finished sessions.
//!
//! A finished session is written to the local results directory, handed back
//! as a download artifact, and optionally forwarded to a remote endpoint.

pub mod encode;
pub mod error;
pub mod gateway;

pub use encode::{download_filename, encode_rows, local_filename, ExportOptions};
pub use error::ExportError;
pub use gateway::{DownloadArtifact, ExportGateway, ExportReceipt};
