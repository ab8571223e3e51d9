//! DeviceGateway port - Interface to the biometric attendance terminal.
//!
//! The gateway owns the connection to the terminal. Only the reconciliation
//! loop drives `connect`/`disconnect`; the transport itself (socket
//! protocol, framing) lives entirely in the adapter.
//!
//! `pull_events` returns records in the order the terminal reported them.
//! "No new events" is an empty vector, never an error.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::attendance::DeviceRecord;

/// Port for the attendance terminal.
#[async_trait]
pub trait DeviceGateway: Send + Sync {
    /// Open the connection to the terminal.
    async fn connect(&self) -> Result<(), GatewayError>;

    /// Tear the connection down. Never fails; problems are logged by the adapter.
    async fn disconnect(&self);

    /// Whether the adapter believes the connection is open.
    fn is_connected(&self) -> bool;

    /// Fetch attendance records reported since the previous pull.
    async fn pull_events(&self) -> Result<Vec<DeviceRecord>, GatewayError>;

    /// Show a short message on the terminal display.
    async fn notify(&self, message: &str) -> Result<(), GatewayError>;
}

/// Errors raised by a device gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("device transport failure: {0}")]
    Transport(String),

    #[error("device did not answer within {0:?}")]
    Timeout(std::time::Duration),

    #[error("device is not connected")]
    NotConnected,

    #[error("device does not support {0}")]
    Unsupported(&'static str),
}

impl GatewayError {
    pub fn transport(message: impl Into<String>) -> Self {
        GatewayError::Transport(message.into())
    }
}
