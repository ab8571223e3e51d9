//! FeeStatusClient port - Interface to the school fee-status service.
//!
//! One call, one subject, no retries. Implementations bound the call with
//! their own timeout; callers may add an outer bound as well.

use async_trait::async_trait;

use crate::domain::attendance::{FeeLookupError, FeeStatus};

/// Port for fee-status lookups.
///
/// Stateless from the caller's side and safe to share between the
/// reconciliation loop and HTTP handlers.
#[async_trait]
pub trait FeeStatusClient: Send + Sync {
    /// Look up the fee status of `subject_id`.
    ///
    /// Non-success responses map to [`FeeLookupError::Api`]; network
    /// failures and timeouts to the transport variants.
    async fn query_status(&self, subject_id: &str) -> Result<FeeStatus, FeeLookupError>;
}
