//! Lenient date (de)serialization.
//!
//! Clients send either a full RFC 3339 timestamp or a bare `YYYY-MM-DD` date
//! (what an HTML date input produces). Both are accepted; bare dates are taken
//! as midnight UTC. Output is always RFC 3339.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

pub fn parse_flexible(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `#[serde(deserialize_with = "...")]` helper for `Option<DateTime<Utc>>`.
///
/// `null`, absent and empty strings all map to `None`.
pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_flexible(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{s}'"))),
    }
}

/// Like [`deserialize_optional`] but keeps "absent" and "cleared" apart: only
/// present keys reach this function, so `null` or `""` yields `Some(None)`.
pub fn deserialize_clearable<'de, D>(deserializer: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_optional(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn accepts_rfc3339_and_bare_dates() {
        let full = parse_flexible("2024-05-01T10:30:00+02:00").unwrap();
        assert_eq!(full.to_rfc3339(), "2024-05-01T08:30:00+00:00");

        let bare = parse_flexible("2024-05-01").unwrap();
        assert_eq!((bare.year(), bare.month(), bare.day()), (2024, 5, 1));
    }

    #[test]
    fn rejects_other_formats() {
        assert!(parse_flexible("05/01/2024").is_none());
        assert!(parse_flexible("").is_none());
    }
}
