//! Timestamp canonicalization into bucket keys

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

use crate::core::types::{BucketKey, Granularity};
use crate::utils::Timezone;

#[derive(Debug, Error, PartialEq)]
pub(crate) enum TimeKeyError {
    #[error("Unparseable timestamp \"{input}\"")]
    Unparseable { input: String },
}

/// Naive layouts tried in order; these are wall-clock already
const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a raw record timestamp into local wall-clock time.
///
/// Offset-bearing inputs (RFC 3339, RFC 2822) are shifted into `tz`;
/// naive inputs are taken as-is.
pub(crate) fn parse_timestamp(raw: &str, tz: Timezone) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if s.len() == 10
        && let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
    {
        return Some(date.and_time(NaiveTime::MIN));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(tz.wall_clock(dt));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(tz.wall_clock(dt));
    }

    None
}

/// Canonicalize `raw` into the bucket it belongs to at `granularity`
pub(crate) fn normalize(
    raw: &str,
    granularity: Granularity,
    tz: Timezone,
) -> Result<BucketKey, TimeKeyError> {
    parse_timestamp(raw, tz)
        .map(|at| BucketKey::new(at, granularity))
        .ok_or_else(|| TimeKeyError::Unparseable {
            input: raw.to_string(),
        })
}
