//! ISO-8601 timestamp parsing and rendering.
//!
//! Anything carrying an offset is converted to UTC; naive date-times and bare
//! dates are taken to already be UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y%m%dT%H%M%S%.f%z",
    "%Y%m%dT%H%M%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S%.f",
    "%Y%m%dT%H%M",
];

/// Hour-only forms, completed with zero minutes before parsing.
const HOUR_FORMATS: &[(&str, &str)] = &[
    ("%Y-%m-%dT%H:%M", ":00"),
    ("%Y-%m-%d %H:%M", ":00"),
    ("%Y%m%dT%H%M", "00"),
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

/// Parse an ISO-8601 timestamp into UTC. Returns `None` when unparsable.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // A trailing `Z` on a space-separated value is not RFC 3339.
    let zulu = s.strip_suffix('Z').or_else(|| s.strip_suffix('z'));
    if let Some(naive) = zulu {
        return parse_naive(naive);
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    parse_naive(s)
}

fn parse_naive(s: &str) -> Option<DateTime<Utc>> {
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    for (fmt, minutes) in HOUR_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&format!("{s}{minutes}"), fmt) {
            return Some(naive.and_utc());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Render as ISO-8601 with an explicit `+00:00` offset.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// `serialize_with` adapter for [`format_timestamp`].
pub fn serialize<S: serde::Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&format_timestamp(ts))
}
