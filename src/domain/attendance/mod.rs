//! Attendance domain - device events, fee status, and dispatch outcomes.

mod fee;
mod outcome;
mod record;

pub use fee::{FeeErrorTag, FeeLookupError, FeeStatus, UNKNOWN_NAME};
pub use outcome::{
    ApprovalReceipt, DenialReason, DenialReceipt, ProcessingOutcome, DEFAULT_APPROVAL_DETAILS,
    DENIAL_MESSAGE, NOTIFY_GRANTED, NOTIFY_UNPAID,
};
pub use record::{DeviceRecord, EventKey, MalformedEvent, NamedRecord, RawEvent};
