//! Attendance device configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Attendance terminal configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// Terminal address
    pub host: String,

    /// Terminal port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bound on every device call, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Gateway implementation
    #[serde(default)]
    pub kind: DeviceKind,
}

/// Available device gateways
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Records are fed in through the HTTP façade
    #[default]
    Queue,
}

impl DeviceConfig {
    /// `host:port`, as shown in logs
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate device configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.host.trim().is_empty() {
            return Err(ValidationError::MissingRequired("device.host"));
        }
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("device.timeout_secs"));
        }
        Ok(())
    }
}

fn default_port() -> u16 {
    4370
}

fn default_timeout() -> u64 {
    10
}
