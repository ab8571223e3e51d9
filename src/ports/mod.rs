//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the core and the outside world. Adapters implement these ports.
//!
//! ## External Collaborators
//!
//! - `DeviceGateway` - The biometric attendance terminal
//! - `FeeStatusClient` - The school fee-status API
//! - `ReceiptSink` - The receipt printer
//!
//! ## Loop-owned State
//!
//! - `DedupLedger` - Idempotency tracking for device events

mod dedup_ledger;
mod device_gateway;
mod fee_status_client;
mod receipt_sink;

pub use dedup_ledger::DedupLedger;
pub use device_gateway::{DeviceGateway, GatewayError};
pub use fee_status_client::FeeStatusClient;
pub use receipt_sink::{ReceiptSink, SinkError};
