//! Receipt printer configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ValidationError;

/// Receipt printer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PrinterConfig {
    /// Sink implementation
    #[serde(default)]
    pub kind: PrinterKind,

    /// Target file or device node, required for `file`
    pub path: Option<PathBuf>,

    /// Bound on one print call, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Title block of approval receipts, one line per `\n`
    #[serde(default = "default_header")]
    pub header: String,
}

/// Available receipt sinks
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrinterKind {
    /// Append plain text to `path`
    File,
    /// Write receipts to the log
    #[default]
    Log,
}

impl PrinterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate printer configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.kind == PrinterKind::File && self.path.is_none() {
            return Err(ValidationError::MissingRequired("printer.path"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("printer.timeout_secs"));
        }
        Ok(())
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            kind: PrinterKind::default(),
            path: None,
            timeout_secs: default_timeout(),
            header: default_header(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}

fn default_header() -> String {
    "CRAWFORD INTERNATIONAL\nCAFETERIA".to_string()
}
