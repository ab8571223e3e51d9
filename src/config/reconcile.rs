//! Reconciliation loop configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Polling cadence and dedup ledger limits
#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileSettings {
    /// Seconds between device polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Seconds to wait before reconnecting after a failed poll
    #[serde(default = "default_reconnect_backoff")]
    pub reconnect_backoff_secs: u64,

    /// Maximum number of remembered event keys
    #[serde(default = "default_ledger_capacity")]
    pub ledger_capacity: usize,

    /// Age, measured from the event's own time, after which a device record
    /// is skipped and its key pruned; 0 disables age-based skipping
    #[serde(default = "default_ledger_retention")]
    pub ledger_retention_secs: u64,
}

impl ReconcileSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_secs(self.reconnect_backoff_secs)
    }

    pub fn ledger_retention(&self) -> Duration {
        Duration::from_secs(self.ledger_retention_secs)
    }

    /// Validate loop settings
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.poll_interval_secs == 0 {
            return Err(ValidationError::InvalidPollInterval);
        }
        if self.ledger_capacity == 0 {
            return Err(ValidationError::InvalidLedgerCapacity);
        }
        Ok(())
    }
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            reconnect_backoff_secs: default_reconnect_backoff(),
            ledger_capacity: default_ledger_capacity(),
            ledger_retention_secs: default_ledger_retention(),
        }
    }
}

fn default_poll_interval() -> u64 {
    3
}

fn default_reconnect_backoff() -> u64 {
    5
}

fn default_ledger_capacity() -> usize {
    10_000
}

fn default_ledger_retention() -> u64 {
    24 * 60 * 60
}
