//! Timestamp value object for immutable points in time.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Naive layouts emitted by attendance terminals that carry no offset.
/// Interpreted as UTC.
const NAIVE_DEVICE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Creates a timestamp from Unix seconds, if representable.
    pub fn from_unix_secs(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    /// Parses a device clock reading.
    ///
    /// Accepts RFC 3339 (`2025-10-20T07:30:00+03:00`) as well as the naive
    /// `2025-10-20 07:30:00` and `2025-10-20T07:30:00` forms, which are read
    /// as UTC. Fractional seconds are optional.
    pub fn parse_device(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self(dt.with_timezone(&Utc)));
        }
        NAIVE_DEVICE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| Self(naive.and_utc()))
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Returns a timestamp moved back by the given duration.
    ///
    /// Saturates at the earliest representable instant.
    pub fn minus(&self, by: std::time::Duration) -> Self {
        let by = Duration::from_std(by).unwrap_or(Duration::MAX);
        Self(self.0.checked_sub_signed(by).unwrap_or(DateTime::<Utc>::MIN_UTC))
    }

    /// RFC 3339 rendering with second precision and a `Z` suffix.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// RFC 3339 rendering that keeps any fractional seconds.
    ///
    /// Whole seconds render exactly like [`Timestamp::to_rfc3339`].
    pub fn to_rfc3339_precise(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn timestamp_now_creates_current_time() {
        let before = Utc::now();
        let ts = Timestamp::now();
        let after = Utc::now();

        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &after);
    }

    #[test]
    fn parse_device_accepts_rfc3339_with_offset() {
        let ts = Timestamp::parse_device("2025-10-20T10:30:00+03:00").unwrap();
        assert_eq!(ts.as_datetime().hour(), 7);
        assert_eq!(ts.to_rfc3339(), "2025-10-20T07:30:00Z");
    }

    #[test]
    fn parse_device_accepts_naive_space_separated() {
        let ts = Timestamp::parse_device("2025-10-20 07:30:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-10-20T07:30:00Z");
    }

    #[test]
    fn parse_device_accepts_naive_iso_with_fraction() {
        let ts = Timestamp::parse_device("2025-10-20T07:30:00.123456").unwrap();
        assert_eq!(ts.as_datetime().day(), 20);
        assert_eq!(ts.as_datetime().second(), 0);
    }

    #[test]
    fn precise_rendering_keeps_fraction_only_when_present() {
        let whole = Timestamp::parse_device("2025-10-20 07:30:00").unwrap();
        let fractional = Timestamp::parse_device("2025-10-20T07:30:00.250").unwrap();

        assert_eq!(whole.to_rfc3339_precise(), "2025-10-20T07:30:00Z");
        assert_eq!(fractional.to_rfc3339_precise(), "2025-10-20T07:30:00.250Z");
        assert_eq!(fractional.to_rfc3339(), "2025-10-20T07:30:00Z");
    }

    #[test]
    fn parse_device_rejects_garbage() {
        assert!(Timestamp::parse_device("yesterday").is_none());
        assert!(Timestamp::parse_device("").is_none());
    }

    #[test]
    fn from_unix_secs_works() {
        // 2024-01-15T00:00:00Z
        let ts = Timestamp::from_unix_secs(1705276800).unwrap();
        assert_eq!(ts.as_datetime().year(), 2024);
        assert_eq!(ts.as_datetime().month(), 1);
        assert_eq!(ts.as_datetime().day(), 15);
    }

    #[test]
    fn minus_moves_backwards() {
        let ts = Timestamp::from_unix_secs(1000).unwrap();
        let earlier = ts.minus(std::time::Duration::from_secs(60));
        assert!(earlier.is_before(&ts));
        assert_eq!(earlier, Timestamp::from_unix_secs(940).unwrap());
    }

    #[test]
    fn minus_saturates_on_huge_durations() {
        let ts = Timestamp::now();
        let earliest = ts.minus(std::time::Duration::from_secs(u64::MAX));
        assert!(earliest.is_before(&ts));
    }

    #[test]
    fn timestamp_serializes_to_json() {
        let ts = Timestamp::parse_device("2024-01-15T10:30:00Z").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert!(json.contains("2024-01-15"));
    }
}
