//! Mock sync backend for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use stylerate_core::traits::{RemoteSync, SyncOutcome, SyncUpload};

/// Records uploads instead of sending them and answers with a fixed outcome.
pub struct MockSync {
    outcome: SyncOutcome,
    call_count: AtomicU32,
    last_upload: Mutex<Option<SyncUpload>>,
}

impl MockSync {
    /// A backend that accepts every upload with HTTP 200.
    pub fn new() -> Self {
        Self::with_outcome(SyncOutcome::Delivered { status: 200 })
    }

    pub fn with_outcome(outcome: SyncOutcome) -> Self {
        Self {
            outcome,
            call_count: AtomicU32::new(0),
            last_upload: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_upload(&self) -> Option<SyncUpload> {
        self.last_upload
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MockSync {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteSync for MockSync {
    fn name(&self) -> &str {
        "mock"
    }

    async fn push(&self, upload: &SyncUpload) -> SyncOutcome {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_upload
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(upload.clone());
        self.outcome.clone()
    }
}
