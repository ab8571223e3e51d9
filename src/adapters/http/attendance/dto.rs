//! Request and response DTOs for the attendance endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::DispatchReport;
use crate::domain::attendance::{EventKey, FeeErrorTag, ProcessingOutcome};

/// Default name on test receipts.
pub const TEST_PRINT_NAME: &str = "Test Student";

/// Default id on test receipts.
pub const TEST_PRINT_ID: &str = "000";

/// Default details line on test receipts.
pub const TEST_PRINT_DETAILS: &str = "Test printing";

/// Default message on test denial receipts.
pub const TEST_ERROR_MESSAGE: &str = "Test error message";

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

/// POST /attendance body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceRequest {
    #[serde(default, alias = "subject_id", alias = "user_id")]
    pub student_id: Option<Value>,

    /// Device clock reading; the server clock is used when absent.
    #[serde(default)]
    pub timestamp: Option<Value>,

    /// Terminal that produced the event, for logs.
    #[serde(default)]
    pub device_id: Option<String>,
}

/// POST /test-print body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestPrintRequest {
    pub name: Option<String>,
    pub id: Option<String>,
    pub details: Option<String>,
}

/// POST /test-error body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestErrorRequest {
    pub message: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// POST /attendance response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceResponse {
    pub accepted: bool,
    pub subject_id: String,
    pub event_key: EventKey,
    /// `approved` or `denied`.
    pub outcome: String,
    pub printed: bool,
    /// Name printed on the approval receipt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Set when the fee lookup failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FeeErrorTag>,
}

impl AttendanceResponse {
    pub fn from_report(subject_id: String, event_key: EventKey, report: &DispatchReport) -> Self {
        let name = match &report.outcome {
            ProcessingOutcome::Approved(receipt) => Some(receipt.name.clone()),
            ProcessingOutcome::Denied(..) => None,
        };
        Self {
            accepted: true,
            subject_id,
            event_key,
            outcome: report.outcome.label().to_string(),
            printed: report.printed(),
            name,
            error: report.outcome.error_tag(),
        }
    }
}

/// POST /device/events response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedResponse {
    pub queued: bool,
    pub event_key: EventKey,
}

/// Body of a failed fee lookup, mirroring the school API's shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeLookupFailureResponse {
    pub paid: bool,
    pub error: FeeErrorTag,
    pub message: String,
}

/// POST /test-print and /test-error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintedResponse {
    pub printed: bool,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
