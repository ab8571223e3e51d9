//! Device records and their normalization into [`RawEvent`]s.
//!
//! Terminals report attendance either as an object with named fields or as
//! a positional tuple `(uid, timestamp, status, punch)`. Both shapes are
//! captured by [`DeviceRecord`] at the gateway boundary; the conversion into
//! a [`RawEvent`] is where missing or unusable fields are rejected.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::foundation::{Timestamp, ValidationError};

/// A single attendance record as reported by the device.
///
/// Variant order matters for untagged decoding: a JSON array must never be
/// read as a [`NamedRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceRecord {
    /// `[uid, timestamp, status?, punch?]`
    Positional(Vec<Value>),

    /// `{ "user_id": .., "timestamp": .., "id"?: .., "name"?: .. }`
    Named(NamedRecord),
}

/// Object-shaped device record. Every field is optional here so that
/// validation happens in one place, [`RawEvent::try_from`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedRecord {
    #[serde(default, alias = "student_id", alias = "subject_id")]
    pub user_id: Option<Value>,

    #[serde(default)]
    pub timestamp: Option<Value>,

    /// Device-native event id, when the terminal provides one.
    #[serde(default)]
    pub id: Option<Value>,

    /// Name enrolled on the terminal.
    #[serde(default)]
    pub name: Option<Value>,
}

impl DeviceRecord {
    /// Convenience constructor for an object-shaped record.
    pub fn named(user_id: impl Into<Value>, timestamp: impl Into<Value>) -> Self {
        DeviceRecord::Named(NamedRecord {
            user_id: Some(user_id.into()),
            timestamp: Some(timestamp.into()),
            ..Default::default()
        })
    }
}

/// Reasons a device record cannot be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedEvent {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error(transparent)]
    InvalidField(#[from] ValidationError),
}

/// Deduplication identity of an attendance event.
///
/// Either the device-native event id or `"{subject_id}-{occurred_at}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventKey(String);

impl EventKey {
    /// Derives the key for an event.
    pub fn derive(subject_id: &str, occurred_at: &Timestamp, sequence_hint: Option<&str>) -> Self {
        match sequence_hint {
            Some(hint) => Self(hint.to_string()),
            None => Self(format!("{}-{}", subject_id, occurred_at.to_rfc3339_precise())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Canonical attendance event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub subject_id: String,
    pub occurred_at: Timestamp,
    /// Device-local identifier, when present.
    pub sequence_hint: Option<String>,
    /// Name enrolled on the device, used when the fee service has none.
    pub device_name: Option<String>,
}

impl RawEvent {
    pub fn new(subject_id: impl Into<String>, occurred_at: Timestamp) -> Self {
        Self {
            subject_id: subject_id.into(),
            occurred_at,
            sequence_hint: None,
            device_name: None,
        }
    }

    pub fn key(&self) -> EventKey {
        EventKey::derive(
            &self.subject_id,
            &self.occurred_at,
            self.sequence_hint.as_deref(),
        )
    }
}

impl TryFrom<DeviceRecord> for RawEvent {
    type Error = MalformedEvent;

    fn try_from(record: DeviceRecord) -> Result<Self, Self::Error> {
        match record {
            DeviceRecord::Named(named) => {
                let subject_id = required_text(named.user_id.as_ref(), "user_id")?;
                let occurred_at = required_timestamp(named.timestamp.as_ref())?;
                Ok(Self {
                    subject_id,
                    occurred_at,
                    sequence_hint: named.id.as_ref().and_then(scalar_text),
                    device_name: named.name.as_ref().and_then(scalar_text),
                })
            }
            DeviceRecord::Positional(fields) => {
                let subject_id = required_text(fields.first(), "user_id")?;
                let occurred_at = required_timestamp(fields.get(1))?;
                Ok(Self::new(subject_id, occurred_at))
            }
        }
    }
}

fn required_text(value: Option<&Value>, field: &'static str) -> Result<String, MalformedEvent> {
    let value = match value {
        None | Some(Value::Null) => return Err(MalformedEvent::MissingField(field)),
        Some(v) => v,
    };
    scalar_text(value).ok_or_else(|| match value {
        Value::String(_) => MalformedEvent::from(ValidationError::empty_field(field)),
        other => MalformedEvent::from(ValidationError::invalid_format(
            field,
            format!("unexpected value {}", other),
        )),
    })
}

fn required_timestamp(value: Option<&Value>) -> Result<Timestamp, MalformedEvent> {
    const FIELD: &str = "timestamp";
    let parsed = match value {
        None | Some(Value::Null) => return Err(MalformedEvent::MissingField(FIELD)),
        Some(Value::String(s)) => Timestamp::parse_device(s),
        Some(Value::Number(n)) => n.as_i64().and_then(Timestamp::from_unix_secs),
        Some(_) => None,
    };
    parsed.ok_or_else(|| {
        MalformedEvent::from(ValidationError::invalid_format(
            FIELD,
            "expected RFC 3339, naive date-time or epoch seconds",
        ))
    })
}

/// Renders a string or number as trimmed, non-empty text.
///
/// Whole floats such as `1001.0` render without the fraction, which is how
/// some terminals report numeric user ids.
fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) if f.fract() == 0.0 && f.is_finite() => format!("{:.0}", f),
            (_, _, Some(f)) => f.to_string(),
            _ => return None,
        },
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> DeviceRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn positional_array_decodes_as_positional() {
        let record = decode(json!([1001, "2025-10-20 07:30:00", 1, 0]));
        assert!(matches!(record, DeviceRecord::Positional(_)));
    }

    #[test]
    fn object_decodes_as_named() {
        let record = decode(json!({"user_id": "1001", "timestamp": "2025-10-20 07:30:00"}));
        assert!(matches!(record, DeviceRecord::Named(_)));
    }

    #[test]
    fn student_id_alias_is_accepted() {
        let record = decode(json!({"student_id": "1002", "timestamp": "2025-10-20 07:30:00"}));
        let event = RawEvent::try_from(record).unwrap();
        assert_eq!(event.subject_id, "1002");
    }

    #[test]
    fn named_record_normalizes_all_fields() {
        let record = decode(json!({
            "user_id": 1001,
            "timestamp": "2025-10-20T07:30:00Z",
            "id": 77,
            "name": "Wangari Maathai"
        }));
        let event = RawEvent::try_from(record).unwrap();

        assert_eq!(event.subject_id, "1001");
        assert_eq!(event.sequence_hint.as_deref(), Some("77"));
        assert_eq!(event.device_name.as_deref(), Some("Wangari Maathai"));
        assert_eq!(event.key().as_str(), "77");
    }

    #[test]
    fn positional_record_derives_key_from_subject_and_time() {
        let record = decode(json!(["1001", "2025-10-20 07:30:00", 1, 0]));
        let event = RawEvent::try_from(record).unwrap();

        assert_eq!(event.key().as_str(), "1001-2025-10-20T07:30:00Z");
        assert!(event.sequence_hint.is_none());
    }

    #[test]
    fn taps_within_the_same_second_get_distinct_keys() {
        let first = RawEvent::try_from(decode(json!(["1001", "2025-10-20T07:30:00.120"]))).unwrap();
        let second = RawEvent::try_from(decode(json!(["1001", "2025-10-20T07:30:00.870"]))).unwrap();

        assert_ne!(first.key(), second.key());
        assert_eq!(first.key().as_str(), "1001-2025-10-20T07:30:00.120Z");
    }

    #[test]
    fn epoch_seconds_are_accepted() {
        let record = decode(json!([1001, 1705276800]));
        let event = RawEvent::try_from(record).unwrap();
        assert_eq!(event.occurred_at.to_rfc3339(), "2024-01-15T00:00:00Z");
    }

    #[test]
    fn whole_float_ids_render_without_fraction() {
        let record = decode(json!([1001.0, "2025-10-20 07:30:00"]));
        let event = RawEvent::try_from(record).unwrap();
        assert_eq!(event.subject_id, "1001");
    }

    #[test]
    fn missing_user_id_is_malformed() {
        let record = decode(json!({"timestamp": "2025-10-20 07:30:00"}));
        assert_eq!(
            RawEvent::try_from(record),
            Err(MalformedEvent::MissingField("user_id"))
        );
    }

    #[test]
    fn blank_user_id_is_malformed() {
        let record = decode(json!({"user_id": "   ", "timestamp": "2025-10-20 07:30:00"}));
        let err = RawEvent::try_from(record).unwrap_err();
        assert_eq!(err, ValidationError::empty_field("user_id").into());
    }

    #[test]
    fn empty_positional_record_is_malformed() {
        let record = decode(json!([]));
        assert_eq!(
            RawEvent::try_from(record),
            Err(MalformedEvent::MissingField("user_id"))
        );
    }

    #[test]
    fn missing_timestamp_is_malformed() {
        let record = decode(json!(["1001"]));
        assert_eq!(
            RawEvent::try_from(record),
            Err(MalformedEvent::MissingField("timestamp"))
        );
    }

    #[test]
    fn unparseable_timestamp_is_malformed() {
        let record = decode(json!({"user_id": "1001", "timestamp": "soon"}));
        let err = RawEvent::try_from(record).unwrap_err();
        assert!(matches!(err, MalformedEvent::InvalidField(ref v) if v.field() == "timestamp"));
    }

    #[test]
    fn nested_user_id_is_malformed() {
        let record = decode(json!({"user_id": {"x": 1}, "timestamp": "2025-10-20 07:30:00"}));
        let err = RawEvent::try_from(record).unwrap_err();
        assert!(matches!(err, MalformedEvent::InvalidField(ref v) if v.field() == "user_id"));
    }

    #[test]
    fn same_subject_and_time_yield_same_key() {
        let a = RawEvent::try_from(decode(json!(["1001", "2025-10-20 07:30:00"]))).unwrap();
        let b = RawEvent::try_from(decode(json!({
            "user_id": 1001,
            "timestamp": "2025-10-20T07:30:00Z"
        })))
        .unwrap();
        assert_eq!(a.key(), b.key());
    }
}
