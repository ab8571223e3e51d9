//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the core to external systems:
//! - `dedup` - Bounded in-memory dedup ledger
//! - `device` - Attendance terminal gateways
//! - `http` - Axum request façade
//! - `printer` - Receipt sinks (text file, log)
//! - `school_api` - Fee-status clients (HTTP, mock)

pub mod dedup;
pub mod device;
pub mod http;
pub mod printer;
pub mod school_api;

pub use dedup::{BoundedDedupLedger, LedgerLimits};
pub use device::QueueDeviceGateway;
pub use http::{attendance_router, AttendanceAppState};
pub use printer::{LogReceiptSink, ReceiptLayout, TextReceiptSink, TextSinkConfig};
pub use school_api::{HttpFeeStatusClient, MockFeeStatusClient, SchoolApiClientConfig};
