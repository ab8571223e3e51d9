//! Fee status as reported by the school API, and the ways a lookup fails.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display name used when neither the fee service nor the device knows one.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Fee decision for one subject. Computed fresh for every event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeStatus {
    pub subject_id: String,
    pub paid: bool,
    pub details: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(rename = "photo_url")]
    pub photo_ref: Option<String>,
}

impl FeeStatus {
    /// A status with only the payment flag set.
    pub fn new(subject_id: impl Into<String>, paid: bool) -> Self {
        Self {
            subject_id: subject_id.into(),
            paid,
            details: String::new(),
            display_name: UNKNOWN_NAME.to_string(),
            amount: None,
            photo_ref: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn with_photo(mut self, photo_ref: impl Into<String>) -> Self {
        self.photo_ref = Some(photo_ref.into());
        self
    }

    /// Whether the service gave a usable name.
    pub fn has_known_name(&self) -> bool {
        !self.display_name.trim().is_empty() && self.display_name != UNKNOWN_NAME
    }
}

/// Observability tag attached to a failed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeErrorTag {
    /// The service answered with a non-success status.
    ApiError,
    /// The call never produced a usable answer (network, timeout, bad body).
    Exception,
}

impl FeeErrorTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeErrorTag::ApiError => "api_error",
            FeeErrorTag::Exception => "exception",
        }
    }
}

impl fmt::Display for FeeErrorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single fee lookup. Every variant denies access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeLookupError {
    /// Non-2xx response.
    #[error("fee service returned HTTP {status}")]
    Api { status: u16 },

    /// Connection or protocol failure before a response arrived.
    #[error("fee service unreachable: {0}")]
    Transport(String),

    #[error("fee lookup timed out after {0:?}")]
    Timeout(Duration),

    /// 200 response whose body is not a fee status.
    #[error("fee service returned an unreadable body: {0}")]
    InvalidBody(String),
}

impl FeeLookupError {
    pub fn tag(&self) -> FeeErrorTag {
        match self {
            FeeLookupError::Api { .. } => FeeErrorTag::ApiError,
            FeeLookupError::Transport(_)
            | FeeLookupError::Timeout(_)
            | FeeLookupError::InvalidBody(_) => FeeErrorTag::Exception,
        }
    }

    /// Transport-level failures, as opposed to protocol failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FeeLookupError::Transport(_) | FeeLookupError::Timeout(_)
        )
    }
}
