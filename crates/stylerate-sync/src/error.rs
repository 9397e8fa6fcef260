//! Sync backend error types.

use thiserror::Error;

/// Errors raised while setting up a sync backend. Failures of an actual
/// upload are reported as a `SyncOutcome`, not as an error.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The configured endpoint is not an http(s) URL.
    #[error("invalid sync URL `{0}`: expected http:// or https://")]
    InvalidUrl(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}
