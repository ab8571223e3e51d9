//! HTTP handlers for the attendance endpoints.
//!
//! These handlers connect Axum routes to the dispatcher, the device queue
//! and the loop status channel. None of them touch the dedup ledger.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::Value;
use tokio::sync::watch;

use crate::adapters::device::QueueDeviceGateway;
use crate::application::{Dispatcher, LoopSnapshot};
use crate::domain::attendance::{
    ApprovalReceipt, DenialReceipt, DeviceRecord, FeeLookupError, MalformedEvent, NamedRecord,
    RawEvent,
};
use crate::domain::foundation::Timestamp;

use super::dto::{
    AttendanceRequest, AttendanceResponse, ErrorResponse, FeeLookupFailureResponse,
    HealthResponse, PrintedResponse, QueuedResponse, TestErrorRequest, TestPrintRequest,
    TEST_ERROR_MESSAGE, TEST_PRINT_DETAILS, TEST_PRINT_ID, TEST_PRINT_NAME,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the attendance endpoints.
///
/// Cloned for each request; all dependencies are shared handles.
#[derive(Clone)]
pub struct AttendanceAppState {
    pub dispatcher: Arc<Dispatcher>,
    pub device_queue: Arc<QueueDeviceGateway>,
    pub loop_status: watch::Receiver<LoopSnapshot>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /health - Liveness probe
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse::ok())
}

/// GET /status - Latest reconciliation loop snapshot
pub async fn loop_status(State(state): State<AttendanceAppState>) -> impl IntoResponse {
    let snapshot = state.loop_status.borrow().clone();
    Json(snapshot)
}

/// GET /students/:id/fees - Fee-status passthrough
pub async fn fee_status(
    State(state): State<AttendanceAppState>,
    Path(subject_id): Path<String>,
) -> Result<impl IntoResponse, AttendanceApiError> {
    let status = state.dispatcher.lookup(&subject_id).await.map_err(|e| {
        tracing::warn!(subject_id = %subject_id, error_tag = %e.tag(), error = %e, "Fee lookup failed");
        AttendanceApiError::FeeLookup(e)
    })?;
    Ok(Json(status))
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /attendance - Process one event immediately
///
/// Bypasses the dedup ledger and does not notify the device.
pub async fn record_attendance(
    State(state): State<AttendanceAppState>,
    Json(request): Json<AttendanceRequest>,
) -> Result<impl IntoResponse, AttendanceApiError> {
    let timestamp = request
        .timestamp
        .unwrap_or_else(|| Value::String(Timestamp::now().to_rfc3339()));
    let record = DeviceRecord::Named(NamedRecord {
        user_id: request.student_id,
        timestamp: Some(timestamp),
        ..Default::default()
    });
    let event = RawEvent::try_from(record)?;
    let key = event.key();

    tracing::info!(
        subject_id = %event.subject_id,
        device_id = request.device_id.as_deref(),
        "Manual attendance event"
    );

    let report = state.dispatcher.dispatch(&event).await;
    let response = AttendanceResponse::from_report(event.subject_id, key, &report);

    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /device/events - Queue a device record for the reconciliation loop
pub async fn enqueue_device_event(
    State(state): State<AttendanceAppState>,
    Json(record): Json<DeviceRecord>,
) -> Result<impl IntoResponse, AttendanceApiError> {
    let event = RawEvent::try_from(record.clone())?;
    state.device_queue.push(record);

    let response = QueuedResponse {
        queued: true,
        event_key: event.key(),
    };
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// POST /test-print - Print a sample approval receipt
pub async fn test_print(
    State(state): State<AttendanceAppState>,
    body: Option<Json<TestPrintRequest>>,
) -> impl IntoResponse {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let receipt = ApprovalReceipt {
        name: request.name.unwrap_or_else(|| TEST_PRINT_NAME.to_string()),
        subject_id: request.id.unwrap_or_else(|| TEST_PRINT_ID.to_string()),
        details: request
            .details
            .unwrap_or_else(|| TEST_PRINT_DETAILS.to_string()),
        photo_ref: None,
    };

    let result = state.dispatcher.print_approval(&receipt).await;
    if let Err(e) = &result {
        tracing::warn!(error = %e, "Test print failed");
    }
    Json(PrintedResponse {
        printed: result.is_ok(),
    })
}

/// POST /test-error - Print a sample denial receipt
pub async fn test_error(
    State(state): State<AttendanceAppState>,
    body: Option<Json<TestErrorRequest>>,
) -> impl IntoResponse {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let receipt =
        DenialReceipt::new(request.message.unwrap_or_else(|| TEST_ERROR_MESSAGE.to_string()));

    let result = state.dispatcher.print_denial(&receipt).await;
    if let Err(e) = &result {
        tracing::warn!(error = %e, "Test denial print failed");
    }
    Json(PrintedResponse {
        printed: result.is_ok(),
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error wrapper for attendance endpoints.
#[derive(Debug)]
pub enum AttendanceApiError {
    /// The submitted record cannot be normalized.
    Malformed(MalformedEvent),
    /// The fee service did not produce a status.
    FeeLookup(FeeLookupError),
}

impl From<MalformedEvent> for AttendanceApiError {
    fn from(err: MalformedEvent) -> Self {
        Self::Malformed(err)
    }
}

impl IntoResponse for AttendanceApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AttendanceApiError::Malformed(e) => {
                let body = ErrorResponse::new("MALFORMED_EVENT", e.to_string());
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            AttendanceApiError::FeeLookup(e) => {
                let body = FeeLookupFailureResponse {
                    paid: false,
                    error: e.tag(),
                    message: e.to_string(),
                };
                (StatusCode::BAD_GATEWAY, Json(body)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::attendance::FeeLookupError;
    use crate::domain::foundation::ValidationError;

    #[test]
    fn malformed_event_maps_to_400() {
        let err = AttendanceApiError::from(MalformedEvent::MissingField("user_id"));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_field_maps_to_400() {
        let err = AttendanceApiError::from(MalformedEvent::from(ValidationError::invalid_format(
            "timestamp",
            "bad",
        )));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn fee_lookup_failure_maps_to_502() {
        let err = AttendanceApiError::FeeLookup(FeeLookupError::Api { status: 404 });
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
