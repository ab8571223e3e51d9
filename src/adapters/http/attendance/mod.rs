//! HTTP adapter for the attendance gate.
//!
//! Exposes manual and diagnostic entry points:
//! - `GET /health` - Liveness
//! - `GET /status` - Reconciliation loop counters
//! - `POST /attendance` - Process one attendance event immediately
//! - `POST /device/events` - Queue a device record for the reconciliation loop
//! - `GET /students/:id/fees` - Fee-status passthrough
//! - `POST /test-print` - Print a sample approval receipt
//! - `POST /test-error` - Print a sample denial receipt

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{AttendanceApiError, AttendanceAppState};
pub use routes::attendance_router;
