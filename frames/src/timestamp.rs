//! Timestamp normalization.
//!
//! The backend has emitted both RFC 3339 strings and numeric epoch
//! milliseconds over time; everything is normalized to `i64` milliseconds.

use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::WireError;

#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum WireTimestamp {
    Millis(i64),
    Float(f64),
    Text(String),
}

impl WireTimestamp {
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn into_millis(self) -> Result<i64, WireError> {
        match self {
            Self::Millis(ms) => Ok(ms),
            Self::Float(ms) => Ok(ms.round() as i64),
            Self::Text(text) => match text.trim().parse::<i64>() {
                Ok(ms) => Ok(ms),
                Err(_) => parse_rfc3339(&text),
            },
        }
    }
}

/// Parse an RFC 3339 timestamp into epoch milliseconds.
///
/// # Errors
///
/// Returns [`WireError::InvalidTimestamp`] if the string is not RFC 3339.
#[allow(clippy::cast_possible_truncation)]
pub fn parse_rfc3339(text: &str) -> Result<i64, WireError> {
    let parsed = OffsetDateTime::parse(text.trim(), &Rfc3339)
        .map_err(|_| WireError::InvalidTimestamp(text.to_owned()))?;
    Ok((parsed.unix_timestamp_nanos() / 1_000_000) as i64)
}

/// Format epoch milliseconds as an RFC 3339 UTC string.
///
/// Out-of-range inputs fall back to the Unix epoch.
#[must_use]
pub fn format_rfc3339(millis: i64) -> String {
    let nanos = i128::from(millis) * 1_000_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_owned())
}
