//! Log-only receipt sink, used when no printer is attached.

use async_trait::async_trait;

use crate::domain::attendance::{ApprovalReceipt, DenialReceipt};
use crate::ports::{ReceiptSink, SinkError};

/// Writes receipts to the log at `info` level.
#[derive(Debug, Clone, Default)]
pub struct LogReceiptSink;

impl LogReceiptSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReceiptSink for LogReceiptSink {
    async fn print_approval(&self, receipt: &ApprovalReceipt) -> Result<(), SinkError> {
        tracing::info!(
            subject_id = %receipt.subject_id,
            name = %receipt.name,
            details = %receipt.details,
            photo = receipt.photo_ref.as_deref(),
            "Approval receipt"
        );
        Ok(())
    }

    async fn print_denial(&self, receipt: &DenialReceipt) -> Result<(), SinkError> {
        tracing::info!(
            text = %receipt.message,
            photo = receipt.photo_ref.as_deref(),
            "Denial receipt"
        );
        Ok(())
    }
}
