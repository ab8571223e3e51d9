//! File-backed receipt sink.
//!
//! Appends each receipt to a file. Pointing the path at a line-printer
//! device node (`/dev/usb/lp0`) prints directly; pointing it at a regular
//! file keeps a receipt journal.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::domain::attendance::{ApprovalReceipt, DenialReceipt};
use crate::domain::foundation::Timestamp;
use crate::ports::{ReceiptSink, SinkError};

use super::receipt_text::ReceiptLayout;

/// Configuration for [`TextReceiptSink`].
#[derive(Debug, Clone)]
pub struct TextSinkConfig {
    pub path: PathBuf,
    pub timeout: Duration,
    pub layout: ReceiptLayout,
}

impl TextSinkConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            timeout: Duration::from_secs(10),
            layout: ReceiptLayout::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_layout(mut self, layout: ReceiptLayout) -> Self {
        self.layout = layout;
        self
    }
}

/// Receipt sink that appends plain text to a file.
#[derive(Debug, Clone)]
pub struct TextReceiptSink {
    config: TextSinkConfig,
}

impl TextReceiptSink {
    /// Opens the sink, checking the target can be opened for appending.
    ///
    /// Returns `SinkError::Unavailable` when it cannot; the caller decides
    /// whether to run without a printer.
    pub async fn open(config: TextSinkConfig) -> Result<Self, SinkError> {
        let probe = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)
            .await;
        match probe {
            Ok(_) => Ok(Self { config }),
            Err(e) => {
                tracing::warn!(path = %config.path.display(), error = %e, "Receipt printer not available");
                Err(SinkError::Unavailable)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    async fn append(&self, text: String) -> Result<(), SinkError> {
        let write = async {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.config.path)
                .await?;
            file.write_all(text.as_bytes()).await?;
            file.flush().await
        };

        tokio::time::timeout(self.config.timeout, write)
            .await
            .map_err(|_| SinkError::Timeout(self.config.timeout))?
            .map_err(|e| SinkError::write(e.to_string()))
    }
}

#[async_trait]
impl ReceiptSink for TextReceiptSink {
    async fn print_approval(&self, receipt: &ApprovalReceipt) -> Result<(), SinkError> {
        let text = self.config.layout.approval(receipt, Timestamp::now());
        self.append(text).await
    }

    async fn print_denial(&self, receipt: &DenialReceipt) -> Result<(), SinkError> {
        let text = self.config.layout.denial(receipt, Timestamp::now());
        self.append(text).await
    }
}
