use chrono::NaiveDate;

use crate::core::DateRange;
use crate::error::AppError;

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    let s = s.trim();
    // Try YYYYMMDD
    if s.len() == 8
        && let Ok(d) = NaiveDate::parse_from_str(s, "%Y%m%d")
    {
        return Ok(d);
    }
    // Try YYYY-MM-DD
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    Err(AppError::InvalidDate {
        input: s.to_string(),
    })
}

/// Build an inclusive range from optional `--since`/`--until` values.
///
/// A missing bound is left open on that side; both missing means no range.
pub(crate) fn parse_range(
    since: Option<&str>,
    until: Option<&str>,
) -> Result<Option<DateRange>, AppError> {
    let start = since.map(parse_date).transpose()?;
    let end = until.map(parse_date).transpose()?;
    match (start, end) {
        (None, None) => Ok(None),
        (start, end) => {
            let start = start.unwrap_or(NaiveDate::MIN);
            let end = end.unwrap_or(NaiveDate::MAX);
            DateRange::new(start, end).map(Some)
        }
    }
}
