//! UTC timestamp newtype shared across the gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A UTC timestamp, serialized as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    /// The current instant.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Whether this timestamp lies in the future.
    #[must_use]
    pub fn is_future(&self) -> bool {
        self.0 > Utc::now()
    }

    /// Whether this timestamp lies in the past.
    #[must_use]
    pub fn is_past(&self) -> bool {
        self.0 < Utc::now()
    }

    /// This timestamp shifted forward by `secs` seconds, saturating at the
    /// maximum representable instant.
    #[must_use]
    pub fn plus_secs(&self, secs: u64) -> Self {
        let delta = chrono::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX));
        Self(self.0.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC))
    }

    /// This timestamp shifted backward by `secs` seconds, saturating at the
    /// minimum representable instant.
    #[must_use]
    pub fn minus_secs(&self, secs: u64) -> Self {
        let delta = chrono::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX));
        Self(self.0.checked_sub_signed(delta).unwrap_or(DateTime::<Utc>::MIN_UTC))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_not_future() {
        let ts = Timestamp::now();
        assert!(!ts.is_future());
    }

    #[test]
    fn test_plus_secs_is_future() {
        let ts = Timestamp::now().plus_secs(300);
        assert!(ts.is_future());
        assert!(!ts.is_past());
    }

    #[test]
    fn test_minus_secs_is_past() {
        let ts = Timestamp::now().minus_secs(300);
        assert!(ts.is_past());
    }

    #[test]
    fn test_ordering() {
        let earlier = Timestamp::now().minus_secs(60);
        let later = Timestamp::now();
        assert!(earlier < later);
    }

    #[test]
    fn test_rfc3339_roundtrip() {
        let ts = Timestamp::now();
        let json = serde_json::to_string(&ts).unwrap();
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, back);
    }
}
