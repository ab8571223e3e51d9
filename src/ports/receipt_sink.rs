//! ReceiptSink port - Interface to the receipt printer.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::attendance::{ApprovalReceipt, DenialReceipt};

/// Port for printing receipts.
#[async_trait]
pub trait ReceiptSink: Send + Sync {
    /// Print a receipt for a subject whose fees are paid.
    async fn print_approval(&self, receipt: &ApprovalReceipt) -> Result<(), SinkError>;

    /// Print an access-denied receipt.
    async fn print_denial(&self, receipt: &DenialReceipt) -> Result<(), SinkError>;
}

/// Errors raised while printing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("no printer available")]
    Unavailable,

    #[error("printer write failed: {0}")]
    Write(String),

    #[error("printer did not finish within {0:?}")]
    Timeout(std::time::Duration),
}

impl SinkError {
    pub fn write(message: impl Into<String>) -> Self {
        SinkError::Write(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_sink_is_object_safe() {
        fn _accepts_dyn(_sink: &dyn ReceiptSink) {}
    }

    #[test]
    fn sink_error_display() {
        assert_eq!(SinkError::Unavailable.to_string(), "no printer available");
        assert_eq!(
            SinkError::write("paper out").to_string(),
            "printer write failed: paper out"
        );
    }
}
