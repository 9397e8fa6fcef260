//! Export error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    /// Nothing to export.
    #[error("no result rows to export")]
    NoRows,

    /// A row could not be encoded as CSV.
    #[error("failed to encode results: {0}")]
    Encode(#[from] csv::Error),

    /// The encoded buffer could not be flushed.
    #[error("failed to finish CSV buffer: {0}")]
    Flush(#[source] std::io::Error),

    /// Writing the local copy failed.
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
