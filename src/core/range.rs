//! Inclusive day-resolution range filtering

use chrono::NaiveDateTime;

use crate::core::types::{BucketKey, DateRange, Granularity, Selection};

/// True when `at` falls on a day within `[range.start, range.end]`
pub(crate) fn in_range(at: NaiveDateTime, range: &DateRange) -> bool {
    range.contains(at.date())
}

/// Per-record inclusion rule derived from a selection.
///
/// Fine-granularity data is windowed by its own polling, so it is never
/// range-filtered.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RangeFilter {
    range: Option<DateRange>,
}

impl RangeFilter {
    pub(crate) fn for_selection(selection: &Selection) -> Self {
        let range = match selection.granularity() {
            Granularity::Fine => None,
            Granularity::Coarse => selection.range,
        };
        Self { range }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.range.is_some()
    }

    pub(crate) fn admits(&self, key: &BucketKey) -> bool {
        match &self.range {
            Some(range) => in_range(key.at(), range),
            None => true,
        }
    }
}
