//! Trait definitions for remote result synchronization.
//!
//! Implemented by the `stylerate-sync` crate; consumed by the export gateway.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Backend that forwards an exported result file to a remote endpoint.
///
/// Implementations report every failure through [`SyncOutcome`] instead of
/// an error so a failed sync never aborts the other delivery paths.
#[async_trait]
pub trait RemoteSync: Send + Sync {
    /// Human-readable backend name (e.g. "http").
    fn name(&self) -> &str;

    /// Push one exported file.
    async fn push(&self, upload: &SyncUpload) -> SyncOutcome;
}

/// A file to forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncUpload {
    /// Name the remote side should store the file under.
    pub filename: String,
    /// Raw file contents.
    pub content: Vec<u8>,
}

/// Result of a remote synchronization attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The endpoint accepted the upload with a 2xx status.
    Delivered { status: u16 },
    /// The endpoint answered with a non-success status.
    Rejected { status: u16, body: String },
    /// The request never completed (connection, DNS, timeout).
    TransportError { message: String },
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Delivered { .. })
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Delivered { status } => write!(f, "delivered (HTTP {status})"),
            SyncOutcome::Rejected { status, body } if body.is_empty() => {
                write!(f, "rejected (HTTP {status})")
            }
            SyncOutcome::Rejected { status, body } => write!(f, "rejected (HTTP {status}): {body}"),
            SyncOutcome::TransportError { message } => write!(f, "transport error: {message}"),
        }
    }
}
