use chrono::offset::Offset;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

use crate::error::AppError;

/// Wall-clock zone that offset-bearing timestamps are shifted into before bucketing.
///
/// Timestamps without an offset are already wall-clock and never pass through here.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) enum Timezone {
    #[default]
    Local,
    Named(Tz),
}

impl Timezone {
    pub(crate) fn parse(value: Option<&str>) -> Result<Self, AppError> {
        let Some(raw) = value else {
            return Ok(Timezone::Local);
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("local") {
            return Ok(Timezone::Local);
        }
        if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("z") {
            return Ok(Timezone::Named(chrono_tz::UTC));
        }
        Tz::from_str(trimmed)
            .map(Timezone::Named)
            .map_err(|_| AppError::InvalidTimezone {
                input: trimmed.to_string(),
            })
    }

    pub(crate) fn to_fixed_offset(self, dt: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        match self {
            Timezone::Local => {
                let local = dt.with_timezone(&Local);
                let offset = local.offset().fix();
                local.with_timezone(&offset)
            }
            Timezone::Named(tz) => {
                let local = dt.with_timezone(&tz);
                let offset = local.offset().fix();
                local.with_timezone(&offset)
            }
        }
    }

    /// Wall-clock time of `dt` in this zone
    pub(crate) fn wall_clock(self, dt: DateTime<FixedOffset>) -> NaiveDateTime {
        self.to_fixed_offset(dt).naive_local()
    }

    /// Current calendar date in this zone
    pub(crate) fn today(self) -> NaiveDate {
        let now = Utc::now().fixed_offset();
        self.wall_clock(now).date()
    }
}
