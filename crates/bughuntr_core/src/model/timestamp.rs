//! Epoch-millisecond timestamps and their JSON representation.
//!
//! Values are stored as `INTEGER` epoch milliseconds. On the JSON boundary
//! they serialize as RFC 3339 strings and deserialize from either an RFC 3339
//! string (legacy and exported documents) or an integer of milliseconds.

use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Unix epoch milliseconds.
pub type EpochMillis = i64;

/// Returns the current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> EpochMillis {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    (nanos / 1_000_000) as EpochMillis
}

/// Formats epoch milliseconds as an RFC 3339 UTC string.
pub fn format_rfc3339(value: EpochMillis) -> Result<String, String> {
    let nanos = i128::from(value) * 1_000_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .map_err(|err| format!("timestamp {value} out of range: {err}"))?
        .format(&Rfc3339)
        .map_err(|err| format!("timestamp {value} cannot be formatted: {err}"))
}

/// Parses an RFC 3339 string into epoch milliseconds.
pub fn parse_rfc3339(value: &str) -> Result<EpochMillis, String> {
    let parsed = OffsetDateTime::parse(value.trim(), &Rfc3339)
        .map_err(|err| format!("invalid RFC 3339 timestamp `{value}`: {err}"))?;
    Ok((parsed.unix_timestamp_nanos() / 1_000_000) as EpochMillis)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

impl RawTimestamp {
    fn into_millis(self) -> Result<EpochMillis, String> {
        match self {
            Self::Millis(value) => Ok(value),
            Self::Text(value) => parse_rfc3339(&value),
        }
    }
}

/// Serde adapter for required timestamps.
pub mod rfc3339 {
    use super::{format_rfc3339, EpochMillis, RawTimestamp};
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &EpochMillis, serializer: S) -> Result<S::Ok, S::Error> {
        let text = format_rfc3339(*value).map_err(S::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<EpochMillis, D::Error> {
        RawTimestamp::deserialize(deserializer)?
            .into_millis()
            .map_err(D::Error::custom)
    }
}

/// Serde adapter for timestamps that may be absent or `null`.
pub mod rfc3339_option {
    use super::{format_rfc3339, EpochMillis, RawTimestamp};
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<EpochMillis>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => {
                let text = format_rfc3339(*value).map_err(S::Error::custom)?;
                serializer.serialize_some(&text)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<EpochMillis>, D::Error> {
        match Option::<RawTimestamp>::deserialize(deserializer)? {
            Some(raw) => raw.into_millis().map(Some).map_err(D::Error::custom),
            None => Ok(None),
        }
    }
}
