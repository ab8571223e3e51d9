//! Dispatcher - Resolves fee status for an event and prints the receipt.
//!
//! Shared by the reconciliation loop and the HTTP façade. Holds no mutable
//! state of its own, so concurrent calls are independent.
//!
//! Every call to the fee service and the printer is bounded by a timeout.
//! Fee failures are folded into a denial (fail-closed); printer failures
//! are reported back to the caller but never retried.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::attendance::{
    ApprovalReceipt, DenialReceipt, FeeLookupError, FeeStatus, ProcessingOutcome, RawEvent,
};
use crate::ports::{FeeStatusClient, ReceiptSink, SinkError};

/// Timeouts applied by the [`Dispatcher`].
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Upper bound for one fee lookup.
    pub fee_timeout: Duration,

    /// Upper bound for one print call.
    pub print_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            fee_timeout: Duration::from_secs(6),
            print_timeout: Duration::from_secs(10),
        }
    }
}

impl DispatcherConfig {
    pub fn with_fee_timeout(mut self, timeout: Duration) -> Self {
        self.fee_timeout = timeout;
        self
    }

    pub fn with_print_timeout(mut self, timeout: Duration) -> Self {
        self.print_timeout = timeout;
        self
    }
}

/// What happened to one dispatched event.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    pub outcome: ProcessingOutcome,
    pub print: Result<(), SinkError>,
}

impl DispatchReport {
    pub fn printed(&self) -> bool {
        self.print.is_ok()
    }
}

/// Fee resolution and receipt dispatch.
pub struct Dispatcher {
    fee_client: Arc<dyn FeeStatusClient>,
    sink: Option<Arc<dyn ReceiptSink>>,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Create a dispatcher with default timeouts.
    ///
    /// `sink` is `None` when no printer could be set up; every print then
    /// fails with `SinkError::Unavailable` and processing carries on.
    pub fn new(fee_client: Arc<dyn FeeStatusClient>, sink: Option<Arc<dyn ReceiptSink>>) -> Self {
        Self::with_config(fee_client, sink, DispatcherConfig::default())
    }

    pub fn with_config(
        fee_client: Arc<dyn FeeStatusClient>,
        sink: Option<Arc<dyn ReceiptSink>>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            fee_client,
            sink,
            config,
        }
    }

    pub fn has_printer(&self) -> bool {
        self.sink.is_some()
    }

    /// One bounded fee lookup. No retries.
    pub async fn lookup(&self, subject_id: &str) -> Result<FeeStatus, FeeLookupError> {
        let timeout = self.config.fee_timeout;
        match tokio::time::timeout(timeout, self.fee_client.query_status(subject_id)).await {
            Ok(result) => result,
            Err(_) => Err(FeeLookupError::Timeout(timeout)),
        }
    }

    /// Looks up the subject's fees and decides the outcome.
    pub async fn resolve(&self, event: &RawEvent) -> ProcessingOutcome {
        let lookup = self.lookup(&event.subject_id).await;
        if let Err(e) = &lookup {
            tracing::warn!(
                subject_id = %event.subject_id,
                error_tag = %e.tag(),
                error = %e,
                "Fee lookup failed, denying"
            );
        }
        ProcessingOutcome::decide(&event.subject_id, event.device_name.as_deref(), lookup)
    }

    /// Resolves and prints. Exactly one print call per event.
    pub async fn dispatch(&self, event: &RawEvent) -> DispatchReport {
        let outcome = self.resolve(event).await;
        let print = self.print(&outcome).await;

        match &print {
            Ok(()) => tracing::info!(
                subject_id = %event.subject_id,
                outcome = outcome.label(),
                "Receipt printed"
            ),
            Err(e) => tracing::warn!(
                subject_id = %event.subject_id,
                outcome = outcome.label(),
                error = %e,
                "Receipt not printed"
            ),
        }

        DispatchReport { outcome, print }
    }

    /// Prints the receipt that belongs to `outcome`.
    pub async fn print(&self, outcome: &ProcessingOutcome) -> Result<(), SinkError> {
        match outcome {
            ProcessingOutcome::Approved(receipt) => self.print_approval(receipt).await,
            ProcessingOutcome::Denied(receipt, _) => self.print_denial(receipt).await,
        }
    }

    pub async fn print_approval(&self, receipt: &ApprovalReceipt) -> Result<(), SinkError> {
        let sink = self.sink.as_ref().ok_or(SinkError::Unavailable)?;
        self.bounded(sink.print_approval(receipt)).await
    }

    pub async fn print_denial(&self, receipt: &DenialReceipt) -> Result<(), SinkError> {
        let sink = self.sink.as_ref().ok_or(SinkError::Unavailable)?;
        self.bounded(sink.print_denial(receipt)).await
    }

    async fn bounded<F>(&self, print: F) -> Result<(), SinkError>
    where
        F: std::future::Future<Output = Result<(), SinkError>>,
    {
        let timeout = self.config.print_timeout;
        tokio::time::timeout(timeout, print)
            .await
            .unwrap_or(Err(SinkError::Timeout(timeout)))
    }
}
