//! HTTP form-post sync backend.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::instrument;

use stylerate_core::traits::{RemoteSync, SyncOutcome, SyncUpload};

use crate::error::SyncError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Longest response body kept in a `Rejected` outcome.
const MAX_BODY_CHARS: usize = 500;

/// Posts each result file as `application/x-www-form-urlencoded` fields
/// `filename` and `content`, the latter base64-encoded.
pub struct HttpSync {
    url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpSync {
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self, SyncError> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SyncError::InvalidUrl(url.to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SyncError::Client(e.to_string()))?;

        Ok(Self {
            url: url.to_string(),
            timeout_secs,
            client,
        })
    }
}

#[async_trait]
impl RemoteSync for HttpSync {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, upload), fields(url = %self.url, filename = %upload.filename))]
    async fn push(&self, upload: &SyncUpload) -> SyncOutcome {
        let content = STANDARD.encode(&upload.content);
        let form = [
            ("filename", upload.filename.as_str()),
            ("content", content.as_str()),
        ];

        let response = match self.client.post(&self.url).form(&form).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return SyncOutcome::TransportError {
                    message: format!("request timed out after {}s", self.timeout_secs),
                }
            }
            Err(e) => {
                return SyncOutcome::TransportError {
                    message: e.to_string(),
                }
            }
        };

        let status = response.status().as_u16();
        if response.status().is_success() {
            tracing::debug!(status, "upload accepted");
            return SyncOutcome::Delivered { status };
        }

        let body = response.text().await.unwrap_or_default();
        SyncOutcome::Rejected {
            status,
            body: body.chars().take(MAX_BODY_CHARS).collect(),
        }
    }
}
