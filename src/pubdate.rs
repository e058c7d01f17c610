//! Publication date normalization for the live feed.
//!
//! Every item ends up with a UTC instant. Sources report dates as epoch
//! millis or as text in a handful of formats; anything else is treated as
//! missing and replaced by the caller's `now`.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::ingest::types::PubDate;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

/// Years that render as a plain four-digit ISO-8601 year.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 0..=9999;

/// Parse a reported date. `None` when it cannot be understood or falls
/// outside years 0000..=9999.
pub fn parse_pub_date(raw: &PubDate) -> Option<DateTime<Utc>> {
    let dt = match raw {
        PubDate::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
        PubDate::Text(s) => parse_text(s.trim()),
    }?;
    YEAR_RANGE.contains(&dt.year()).then_some(dt)
}

fn parse_text(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if s.bytes().all(|b| b.is_ascii_digit()) {
        return s
            .parse::<i64>()
            .ok()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(n) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(n.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc())
}

/// Reported date or `now`; unparseable text counts as missing.
pub fn normalize_or(raw: Option<&PubDate>, now: DateTime<Utc>) -> DateTime<Utc> {
    match raw {
        None => now,
        Some(p) => parse_pub_date(p).unwrap_or_else(|| {
            tracing::debug!(pub_date = ?p, "unparseable pubDate, using now");
            now
        }),
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-01-01T00:00:00.000Z`.
pub fn to_iso(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
