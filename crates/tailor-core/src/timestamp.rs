//! The one timestamp format Tailor writes.
//!
//! Everything is stored as ISO-8601 UTC with second precision and a `Z` suffix, so
//! a plain string comparison orders timestamps chronologically.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};

const LEGACY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// The current instant at the precision it is stored with, so an in-memory
/// document compares equal to the one read back from disk.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

pub fn now() -> String {
    format(&now_utc())
}

/// Accepts RFC 3339 (any offset) and the legacy `YYYY-MM-DD HH:MM:SS` form.
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, LEGACY_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Serde adapter for `Option<DateTime<Utc>>` fields.
pub mod option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(at) => serializer.serialize_str(&super::format(at)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => super::parse(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{s}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_is_second_precision_utc() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 5).unwrap();
        assert_eq!(format(&at), "2024-06-01T12:30:05Z");
    }

    #[test]
    fn test_now_survives_format_and_parse() {
        let at = now_utc();
        assert_eq!(at.timestamp_subsec_nanos(), 0);
        assert_eq!(parse(&format(&at)), Some(at));
    }

    #[test]
    fn test_parse_accepts_offsets_and_legacy() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse("2024-01-01T00:00:00Z"), Some(expected));
        assert_eq!(parse("2024-01-01T02:00:00+02:00"), Some(expected));
        assert_eq!(parse("2024-01-01 00:00:00"), Some(expected));
        assert_eq!(parse("yesterday"), None);
    }

    #[test]
    fn test_lexicographic_order_matches_chronological() {
        let earlier = format(&Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let later = format(&Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        assert!(later > earlier);
    }
}
