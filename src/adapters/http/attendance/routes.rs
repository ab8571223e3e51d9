//! Axum router configuration for the attendance endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{
    enqueue_device_event, fee_status, health, loop_status, record_attendance, test_error,
    test_print, AttendanceAppState,
};

/// Create the attendance router.
///
/// # Routes
///
/// ## Diagnostics
/// - `GET /health` - Liveness
/// - `GET /status` - Reconciliation loop counters
///
/// ## Events
/// - `POST /attendance` - Process one event immediately (no dedup, no notify)
/// - `POST /device/events` - Queue a device record for the loop
///
/// ## Fee Service
/// - `GET /students/:id/fees` - Fee-status passthrough
///
/// ## Printer
/// - `POST /test-print` - Sample approval receipt
/// - `POST /test-error` - Sample denial receipt
pub fn attendance_router() -> Router<AttendanceAppState> {
    Router::new()
        // Diagnostics
        .route("/health", get(health))
        .route("/status", get(loop_status))
        // Events
        .route("/attendance", post(record_attendance))
        .route("/device/events", post(enqueue_device_event))
        // Fee service
        .route("/students/:id/fees", get(fee_status))
        // Printer
        .route("/test-print", post(test_print))
        .route("/test-error", post(test_error))
}
