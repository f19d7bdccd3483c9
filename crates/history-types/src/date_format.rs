//! Canonical store date format.
//!
//! The engine emits offsets with and without a colon
//! (`+00:00` / `+0000`); the store only accepts
//! [`STORE_DATE_FORMAT`]. All dates crossing the pipeline are parsed
//! leniently and written canonically.

use chrono::{DateTime, FixedOffset};

/// Timestamp type used for every engine/store date.
pub type EngineDateTime = DateTime<FixedOffset>;

/// The store's canonical date format, e.g. `2024-01-01T00:00:00.000+0000`.
pub const STORE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

const FALLBACK_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%z"];

/// Best-effort date parse.
///
/// Accepts RFC 3339 and the engine's colon-less offset variants.
/// Returns `None` for anything else, including dates without an offset.
pub fn parse_date(value: &str) -> Option<EngineDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(value).ok().or_else(|| {
        FALLBACK_FORMATS
            .iter()
            .find_map(|format| DateTime::parse_from_str(value, format).ok())
    })
}

/// Format a date in the store's canonical format.
pub fn format_date(date: &EngineDateTime) -> String {
    date.format(STORE_DATE_FORMAT).to_string()
}

/// Serde adapter for required dates in canonical format.
pub mod store_date {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::{format_date, parse_date, EngineDateTime};

    pub fn serialize<S: Serializer>(date: &EngineDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_date(date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<EngineDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse_date(&raw).ok_or_else(|| de::Error::custom(format!("invalid date: {raw}")))
    }
}

/// Serde adapter for optional dates in canonical format.
pub mod store_date_opt {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::{format_date, parse_date, EngineDateTime};

    pub fn serialize<S: Serializer>(
        date: &Option<EngineDateTime>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => s.serialize_str(&format_date(date)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<EngineDateTime>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(raw) => parse_date(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid date: {raw}"))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rfc3339() {
        let date = parse_date("2024-01-01T00:00:00+00:00").unwrap();
        assert_eq!(format_date(&date), "2024-01-01T00:00:00.000+0000");
    }

    #[test]
    fn test_parse_engine_format() {
        let date = parse_date("2024-03-05T10:15:30.250+0100").unwrap();
        assert_eq!(format_date(&date), "2024-03-05T10:15:30.250+0100");
    }

    #[test]
    fn test_parse_without_fraction() {
        let date = parse_date("2024-03-05T10:15:30+0200").unwrap();
        assert_eq!(format_date(&date), "2024-03-05T10:15:30.000+0200");
    }

    #[test]
    fn test_parse_rejects_non_dates() {
        assert!(parse_date("").is_none());
        assert!(parse_date("hello").is_none());
        assert!(parse_date("2024-01-01").is_none());
        assert!(parse_date("2024-01-01T00:00:00").is_none());
    }

    #[test]
    fn test_serde_adapters() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Holder {
            #[serde(with = "store_date")]
            at: EngineDateTime,
            #[serde(with = "store_date_opt", default)]
            until: Option<EngineDateTime>,
        }

        let json = r#"{"at":"2024-01-01T12:00:00Z","until":null}"#;
        let holder: Holder = serde_json::from_str(json).unwrap();
        assert!(holder.until.is_none());

        let out = serde_json::to_string(&holder).unwrap();
        assert_eq!(out, r#"{"at":"2024-01-01T12:00:00.000+0000","until":null}"#);
    }
}
