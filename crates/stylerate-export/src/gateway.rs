//! Delivery of a finished session's rows.
//!
//! The three delivery paths (local file, download artifact, remote sync) are
//! independent: a failed local write or a rejected upload never suppresses
//! the others.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;

use stylerate_core::model::ResultRow;
use stylerate_core::traits::{RemoteSync, SyncOutcome, SyncUpload};

use crate::encode::{download_filename, encode_rows, local_filename, ExportOptions};
use crate::error::ExportError;

pub const CSV_MIME: &str = "text/csv";

/// Bytes handed back to the evaluator for saving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// Outcome of each delivery path.
#[derive(Debug)]
pub struct ExportReceipt {
    /// Where the local copy landed, or why it did not.
    pub local: Result<PathBuf, ExportError>,
    pub download: DownloadArtifact,
    /// `None` when no remote endpoint is configured.
    pub remote: Option<SyncOutcome>,
}

impl ExportReceipt {
    pub fn local_path(&self) -> Option<&Path> {
        self.local.as_ref().ok().map(PathBuf::as_path)
    }

    /// True when the local write succeeded and the remote sync, if any, was
    /// accepted.
    pub fn fully_delivered(&self) -> bool {
        self.local.is_ok() && self.remote.as_ref().map_or(true, SyncOutcome::is_success)
    }
}

/// Writes results locally and forwards them to an optional remote backend.
pub struct ExportGateway {
    output_dir: PathBuf,
    options: ExportOptions,
    remote: Option<Arc<dyn RemoteSync>>,
}

impl ExportGateway {
    pub fn new(output_dir: impl Into<PathBuf>, options: ExportOptions) -> Self {
        Self {
            output_dir: output_dir.into(),
            options,
            remote: None,
        }
    }

    /// Forward every delivery to `remote` as well.
    pub fn with_remote(mut self, remote: Arc<dyn RemoteSync>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Encode `rows` once and deliver them along every path.
    ///
    /// Only an encoding failure is returned as an error; per-path failures
    /// are reported in the receipt.
    pub async fn deliver(
        &self,
        evaluator_id: &str,
        rows: &[ResultRow],
        completed_at: DateTime<Utc>,
    ) -> Result<ExportReceipt, ExportError> {
        let bytes = encode_rows(rows, &self.options)?;

        let filename = local_filename(evaluator_id, completed_at);
        let local = write_local(&self.output_dir, &filename, &bytes).await;
        match &local {
            Ok(path) => tracing::info!(
                evaluator = evaluator_id,
                path = %path.display(),
                rows = rows.len(),
                "results written"
            ),
            Err(e) => tracing::warn!(evaluator = evaluator_id, error = %e, "local write failed"),
        }

        let download = DownloadArtifact {
            filename: download_filename(evaluator_id),
            mime: CSV_MIME,
            bytes,
        };

        let remote = match &self.remote {
            Some(remote) => {
                let filename = local
                    .as_ref()
                    .ok()
                    .and_then(|path| path.file_name())
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or(filename);
                let upload = SyncUpload {
                    filename,
                    content: download.bytes.clone(),
                };
                let outcome = remote.push(&upload).await;
                if outcome.is_success() {
                    tracing::info!(backend = remote.name(), %outcome, "results synced");
                } else {
                    tracing::warn!(backend = remote.name(), %outcome, "remote sync failed");
                }
                Some(outcome)
            }
            None => None,
        };

        Ok(ExportReceipt {
            local,
            download,
            remote,
        })
    }
}

/// Most numbered variants tried before giving up on a free filename.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// `stem.csv`, then `stem_2.csv`, `stem_3.csv`, ...
fn numbered(filename: &str, n: u32) -> String {
    if n == 1 {
        return filename.to_string();
    }
    match filename.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_{n}.{ext}"),
        None => format!("{filename}_{n}"),
    }
}

/// Write into a file that did not exist before. An existing export with the
/// same name is never overwritten; a numbered name is used instead.
async fn write_local(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| ExportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

    for n in 1..=MAX_NAME_ATTEMPTS {
        let path = dir.join(numbered(filename, n));
        let io_err = |source| ExportError::Io {
            path: path.clone(),
            source,
        };

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(io_err(e)),
        };
        file.write_all(bytes).await.map_err(io_err)?;
        file.sync_all().await.map_err(io_err)?;
        return Ok(path);
    }

    Err(ExportError::Io {
        path: dir.join(filename),
        source: std::io::Error::new(ErrorKind::AlreadyExists, "no free file name left"),
    })
}
