//! Mock fee-status client for testing and offline runs.
//!
//! Supports:
//! - Pre-configured statuses per subject
//! - Error injection per subject or for every call
//! - Artificial latency (to exercise timeouts)
//! - Call tracking
//!
//! Subjects with nothing configured answer like the school API does for an
//! unknown student: HTTP 404.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::attendance::{FeeLookupError, FeeStatus};
use crate::ports::FeeStatusClient;

/// Recorded call to the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeCall {
    pub subject_id: String,
}

/// Mock fee-status client.
///
/// # Example
///
/// ```ignore
/// let mock = MockFeeStatusClient::new();
/// mock.set_status(FeeStatus::new("1001", true).with_name("Wangari Maathai"));
/// mock.set_error("1002", FeeLookupError::Api { status: 500 });
///
/// let status = mock.query_status("1001").await?;
/// assert_eq!(mock.call_count(), 1);
/// ```
#[derive(Default, Clone)]
pub struct MockFeeStatusClient {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    statuses: HashMap<String, FeeStatus>,
    errors: HashMap<String, FeeLookupError>,
    fail_all: Option<FeeLookupError>,
    delay: Option<Duration>,
    calls: Vec<FeeCall>,
}

impl MockFeeStatusClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the sample roster used by local runs.
    pub fn with_sample_roster() -> Self {
        let mock = Self::new();
        for status in [
            FeeStatus::new("1001", true)
                .with_name("Wangari Maathai")
                .with_details("Lunch payment confirmed"),
            FeeStatus::new("1002", false)
                .with_name("Jomo Kenyatta")
                .with_details("Outstanding balance"),
            FeeStatus::new("1003", true)
                .with_name("Chinua Achebe")
                .with_details("Lunch payment confirmed"),
            FeeStatus::new("1004", false)
                .with_name("Grace Ogot")
                .with_details("Outstanding balance"),
        ] {
            mock.set_status(status);
        }
        mock
    }

    /// Sets the status returned for `status.subject_id`.
    pub fn set_status(&self, status: FeeStatus) {
        let mut state = self.lock();
        state.errors.remove(&status.subject_id);
        state.statuses.insert(status.subject_id.clone(), status);
    }

    /// Makes lookups of `subject_id` fail with `error`.
    pub fn set_error(&self, subject_id: impl Into<String>, error: FeeLookupError) {
        self.lock().errors.insert(subject_id.into(), error);
    }

    /// Makes every lookup fail with `error`.
    pub fn fail_all(&self, error: FeeLookupError) {
        self.lock().fail_all = Some(error);
    }

    /// Delays every answer by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<FeeCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A poisoned lock only means another test thread panicked mid-update.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl FeeStatusClient for MockFeeStatusClient {
    async fn query_status(&self, subject_id: &str) -> Result<FeeStatus, FeeLookupError> {
        let (delay, answer) = {
            let mut state = self.lock();
            state.calls.push(FeeCall {
                subject_id: subject_id.to_string(),
            });
            let answer = if let Some(err) = &state.fail_all {
                Err(err.clone())
            } else if let Some(err) = state.errors.get(subject_id) {
                Err(err.clone())
            } else {
                state
                    .statuses
                    .get(subject_id)
                    .cloned()
                    .ok_or(FeeLookupError::Api { status: 404 })
            };
            (state.delay, answer)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        answer
    }
}
