//! Serde codec for snapshot timestamps.
//!
//! Timestamps are written as RFC 3339 strings with millisecond precision
//! (`2024-05-01T09:30:00.000Z`). Older exports may carry raw Unix
//! milliseconds, so both shapes are accepted on read.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Fractional(f64),
    Text(String),
}

impl RawTimestamp {
    #[allow(clippy::cast_possible_truncation)]
    fn into_millis(self) -> Result<i64, String> {
        match self {
            Self::Millis(ms) => in_range(ms),
            Self::Fractional(ms) if ms.is_finite() => in_range(ms.round() as i64),
            Self::Fractional(ms) => Err(format!("invalid timestamp {ms}")),
            Self::Text(text) => parse_rfc3339_millis(&text),
        }
    }
}

/// Only instants chrono can represent, so every read value can be written back
fn in_range(ms: i64) -> Result<i64, String> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|_| ms)
        .ok_or_else(|| format!("timestamp {ms} is out of range"))
}

/// Parse an RFC 3339 string into Unix milliseconds
pub fn parse_rfc3339_millis(text: &str) -> Result<i64, String> {
    DateTime::parse_from_rfc3339(text.trim())
        .map(|parsed| parsed.timestamp_millis())
        .map_err(|error| format!("invalid timestamp '{text}': {error}"))
}

/// Format Unix milliseconds as an RFC 3339 UTC string
pub fn format_rfc3339_millis(ms: i64) -> Result<String, String> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|time| time.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| format!("timestamp {ms} is out of range"))
}

pub fn serialize<S: Serializer>(ms: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    let text = format_rfc3339_millis(*ms).map_err(S::Error::custom)?;
    serializer.serialize_str(&text)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    RawTimestamp::deserialize(deserializer)?
        .into_millis()
        .map_err(D::Error::custom)
}

/// Same codec for optional timestamps
pub mod option {
    use super::{format_rfc3339_millis, RawTimestamp};
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(ms: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
        match ms {
            Some(ms) => {
                let text = format_rfc3339_millis(*ms).map_err(S::Error::custom)?;
                serializer.serialize_some(&text)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        Option::<RawTimestamp>::deserialize(deserializer)?
            .map(RawTimestamp::into_millis)
            .transpose()
            .map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Stamp {
        #[serde(with = "super")]
        at: i64,
        #[serde(default, with = "super::option", skip_serializing_if = "Option::is_none")]
        pinned: Option<i64>,
    }

    #[test]
    fn writes_iso_strings_with_millis() {
        let json = serde_json::to_string(&Stamp {
            at: 1_714_555_800_123,
            pinned: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"at":"2024-05-01T09:30:00.123Z"}"#);
    }

    #[test]
    fn reads_iso_strings_and_millis() {
        let from_text: Stamp =
            serde_json::from_str(r#"{"at":"2024-05-01T09:30:00.123Z","pinned":null}"#).unwrap();
        let from_number: Stamp =
            serde_json::from_str(r#"{"at":1714555800123,"pinned":1714555800123}"#).unwrap();

        assert_eq!(from_text.at, 1_714_555_800_123);
        assert_eq!(from_text.pinned, None);
        assert_eq!(from_number.at, 1_714_555_800_123);
        assert_eq!(from_number.pinned, Some(1_714_555_800_123));
    }

    #[test]
    fn reads_offsets() {
        assert_eq!(
            parse_rfc3339_millis("2024-05-01T18:30:00.123+09:00").unwrap(),
            1_714_555_800_123
        );
    }

    #[test]
    fn rejects_unrepresentable_millis() {
        let error =
            serde_json::from_str::<Stamp>(r#"{"at":9000000000000000}"#).unwrap_err();
        assert!(error.to_string().contains("out of range"));
        assert!(serde_json::from_str::<Stamp>(r#"{"at":0,"pinned":-9.0e18}"#).is_err());
        assert!(serde_json::from_str::<Stamp>(r#"{"at":-1000}"#).is_ok());
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_str::<Stamp>(r#"{"at":"yesterday"}"#).is_err());
        assert!(serde_json::from_str::<Stamp>(r#"{"at":true}"#).is_err());
    }
}
