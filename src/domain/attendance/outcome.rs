//! The decision made for one attendance event.
//!
//! The decision is fail-closed: only a successful lookup that reports
//! `paid == true` approves. Every lookup failure denies, and is
//! indistinguishable from genuine non-payment at the receipt printer.

use serde::Serialize;

use super::fee::{FeeErrorTag, FeeLookupError, FeeStatus, UNKNOWN_NAME};

/// Details line printed when the fee service approves without one.
pub const DEFAULT_APPROVAL_DETAILS: &str = "Lunch payment confirmed";

/// Message printed on every denial receipt.
pub const DENIAL_MESSAGE: &str = "Fee not paid for today's meal";

/// Message shown on the terminal after an approval receipt prints.
pub const NOTIFY_GRANTED: &str = "Access granted - Ticket printed";

/// Message shown on the terminal after a denial.
pub const NOTIFY_UNPAID: &str = "Fee unpaid. Contact admin.";

/// Content of an approval receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalReceipt {
    pub name: String,
    pub subject_id: String,
    pub details: String,
    pub photo_ref: Option<String>,
}

/// Content of a denial receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DenialReceipt {
    pub message: String,
    pub photo_ref: Option<String>,
}

impl DenialReceipt {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            photo_ref: None,
        }
    }
}

/// Why an event was denied. Kept for logs only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenialReason {
    Unpaid { details: String },
    LookupFailed { tag: FeeErrorTag },
}

/// Outcome of one event: exactly one receipt, at most one notify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingOutcome {
    Approved(ApprovalReceipt),
    Denied(DenialReceipt, DenialReason),
}

impl ProcessingOutcome {
    /// Decides the outcome for `subject_id` from a fee lookup result.
    ///
    /// `device_name` is the name enrolled on the terminal, used when the fee
    /// service returns none.
    pub fn decide(
        subject_id: &str,
        device_name: Option<&str>,
        lookup: Result<FeeStatus, FeeLookupError>,
    ) -> Self {
        match lookup {
            Ok(status) if status.paid => {
                let name = if status.has_known_name() {
                    status.display_name
                } else {
                    device_name.unwrap_or(UNKNOWN_NAME).to_string()
                };
                let details = if status.details.trim().is_empty() {
                    DEFAULT_APPROVAL_DETAILS.to_string()
                } else {
                    status.details
                };
                ProcessingOutcome::Approved(ApprovalReceipt {
                    name,
                    subject_id: subject_id.to_string(),
                    details,
                    photo_ref: status.photo_ref,
                })
            }
            Ok(status) => ProcessingOutcome::Denied(
                DenialReceipt {
                    message: DENIAL_MESSAGE.to_string(),
                    photo_ref: status.photo_ref,
                },
                DenialReason::Unpaid {
                    details: status.details,
                },
            ),
            Err(err) => ProcessingOutcome::Denied(
                DenialReceipt::new(DENIAL_MESSAGE),
                DenialReason::LookupFailed { tag: err.tag() },
            ),
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, ProcessingOutcome::Approved(_))
    }

    /// Short label used in logs and API responses.
    pub fn label(&self) -> &'static str {
        match self {
            ProcessingOutcome::Approved(_) => "approved",
            ProcessingOutcome::Denied(..) => "denied",
        }
    }

    /// Terminal message that accompanies this outcome.
    pub fn notify_message(&self) -> &'static str {
        match self {
            ProcessingOutcome::Approved(_) => NOTIFY_GRANTED,
            ProcessingOutcome::Denied(..) => NOTIFY_UNPAID,
        }
    }

    /// Error tag of a failed lookup, if that is why the event was denied.
    pub fn error_tag(&self) -> Option<FeeErrorTag> {
        match self {
            ProcessingOutcome::Denied(_, DenialReason::LookupFailed { tag }) => Some(*tag),
            _ => None,
        }
    }
}
