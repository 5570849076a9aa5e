//! Core data types shared by the chart, export, metrics and alert paths

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::consts::{DATE_FORMAT, DATETIME_FORMAT};
use crate::error::AppError;

/// One production sample for a single site, exactly as received
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProductionRecord {
    /// Raw timestamp string; parsed lazily by the time-key normalizer
    pub(crate) timestamp: String,
    pub(crate) production_kwh: f64,
}

impl ProductionRecord {
    pub(crate) fn new(timestamp: impl Into<String>, production_kwh: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            production_kwh,
        }
    }
}

/// Snapshot of fetched records keyed by site identifier
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SiteDataset {
    sites: HashMap<String, Vec<ProductionRecord>>,
}

impl SiteDataset {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn insert(&mut self, site: impl Into<String>, records: Vec<ProductionRecord>) {
        self.sites.insert(site.into(), records);
    }

    pub(crate) fn records(&self, site: &str) -> Option<&[ProductionRecord]> {
        self.sites.get(site).map(Vec::as_slice)
    }

    /// Site identifiers in lexical order
    pub(crate) fn site_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.sites.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub(crate) fn site_count(&self) -> usize {
        self.sites.len()
    }

    pub(crate) fn record_count(&self) -> usize {
        self.sites.values().map(Vec::len).sum()
    }
}

impl FromIterator<(String, Vec<ProductionRecord>)> for SiteDataset {
    fn from_iter<I: IntoIterator<Item = (String, Vec<ProductionRecord>)>>(iter: I) -> Self {
        Self {
            sites: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum Granularity {
    /// 15-minute / hourly / 12-hour data, bucketed to the second
    Fine,
    /// Daily / monthly / yearly aggregates, bucketed to the calendar day
    Coarse,
}

/// Resolution requested from the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum IntervalMode {
    FifteenMin,
    Hourly,
    TwelveHour,
    Daily,
    Monthly,
    Yearly,
}

impl IntervalMode {
    #[cfg(test)]
    pub(crate) const ALL: [IntervalMode; 6] = [
        IntervalMode::FifteenMin,
        IntervalMode::Hourly,
        IntervalMode::TwelveHour,
        IntervalMode::Daily,
        IntervalMode::Monthly,
        IntervalMode::Yearly,
    ];

    pub(crate) fn granularity(self) -> Granularity {
        match self {
            IntervalMode::FifteenMin | IntervalMode::Hourly | IntervalMode::TwelveHour => {
                Granularity::Fine
            }
            IntervalMode::Daily | IntervalMode::Monthly | IntervalMode::Yearly => {
                Granularity::Coarse
            }
        }
    }

    pub(crate) fn is_fine(self) -> bool {
        self.granularity() == Granularity::Fine
    }

    /// Value sent as `selection` in the fetch request body
    pub(crate) fn wire_name(self) -> &'static str {
        match self {
            IntervalMode::FifteenMin => "15T",
            IntervalMode::Hourly => "H",
            IntervalMode::TwelveHour => "12H",
            IntervalMode::Daily => "daily",
            IntervalMode::Monthly => "monthly",
            IntervalMode::Yearly => "yearly",
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            IntervalMode::FifteenMin => "15 Min",
            IntervalMode::Hourly => "Hourly",
            IntervalMode::TwelveHour => "12 Hour",
            IntervalMode::Daily => "Daily",
            IntervalMode::Monthly => "Monthly",
            IntervalMode::Yearly => "Yearly",
        }
    }
}

impl FromStr for IntervalMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mode = match trimmed.to_ascii_lowercase().as_str() {
            "15t" | "15min" | "15m" => IntervalMode::FifteenMin,
            "h" | "hourly" => IntervalMode::Hourly,
            "12h" => IntervalMode::TwelveHour,
            "daily" | "day" => IntervalMode::Daily,
            "monthly" | "month" => IntervalMode::Monthly,
            "yearly" | "year" => IntervalMode::Yearly,
            _ => {
                return Err(AppError::InvalidInterval {
                    input: trimmed.to_string(),
                });
            }
        };
        Ok(mode)
    }
}

impl fmt::Display for IntervalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Inclusive calendar-day range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DateRange {
    pub(crate) start: NaiveDate,
    pub(crate) end: NaiveDate,
}

impl DateRange {
    pub(crate) fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::InvalidRange {
                start: start.format(DATE_FORMAT).to_string(),
                end: end.format(DATE_FORMAT).to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub(crate) fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Operator-controlled filter state; read-only to the pipeline
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Selection {
    pub(crate) interval: IntervalMode,
    sites: Vec<String>,
    pub(crate) range: Option<DateRange>,
}

impl Selection {
    pub(crate) fn new(interval: IntervalMode) -> Self {
        Self {
            interval,
            sites: Vec::new(),
            range: None,
        }
    }

    pub(crate) fn with_range(mut self, range: Option<DateRange>) -> Self {
        self.range = range;
        self
    }

    /// Append sites that are not selected yet, keeping selection order
    pub(crate) fn add_sites<I, S>(&mut self, sites: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for site in sites {
            let site = site.into();
            if !self.sites.contains(&site) {
                self.sites.push(site);
            }
        }
    }

    pub(crate) fn sites(&self) -> &[String] {
        &self.sites
    }

    pub(crate) fn granularity(&self) -> Granularity {
        self.interval.granularity()
    }
}

/// Canonical identity of a time bucket.
///
/// Ordering, equality and hashing all follow the truncated instant, so a
/// sorted set of keys is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct BucketKey {
    at: NaiveDateTime,
    granularity: Granularity,
}

impl BucketKey {
    /// Build a key, truncating `at` to the resolution of `granularity`
    pub(crate) fn new(at: NaiveDateTime, granularity: Granularity) -> Self {
        let at = match granularity {
            Granularity::Coarse => at.date().and_time(NaiveTime::MIN),
            Granularity::Fine => at.with_nanosecond(0).unwrap_or(at),
        };
        Self { at, granularity }
    }

    pub(crate) fn date(&self) -> NaiveDate {
        self.at.date()
    }

    pub(crate) fn at(&self) -> NaiveDateTime {
        self.at
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let format = match self.granularity {
            Granularity::Coarse => DATE_FORMAT,
            Granularity::Fine => DATETIME_FORMAT,
        };
        write!(f, "{}", self.at.format(format))
    }
}

impl Serialize for BucketKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).unwrap()
    }

    #[test]
    fn interval_granularity_split() {
        assert!(IntervalMode::FifteenMin.is_fine());
        assert!(IntervalMode::Hourly.is_fine());
        assert!(IntervalMode::TwelveHour.is_fine());
        assert!(!IntervalMode::Daily.is_fine());
        assert!(!IntervalMode::Monthly.is_fine());
        assert!(!IntervalMode::Yearly.is_fine());
    }

    #[test]
    fn interval_parses_wire_names() {
        for mode in IntervalMode::ALL {
            assert_eq!(mode.wire_name().parse::<IntervalMode>().unwrap(), mode);
        }
        assert_eq!("15min".parse::<IntervalMode>().unwrap(), IntervalMode::FifteenMin);
        assert!("weekly".parse::<IntervalMode>().is_err());
    }

    #[test]
    fn date_range_rejects_inverted() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(DateRange::new(a, b).is_err());
        assert!(DateRange::new(b, a).is_ok());
        assert!(DateRange::new(a, a).is_ok());
    }

    #[test]
    fn selection_add_sites_keeps_order_and_dedups() {
        let mut sel = Selection::new(IntervalMode::Daily);
        sel.add_sites(["B", "A"]);
        sel.add_sites(["A", "C", "B"]);
        assert_eq!(sel.sites(), ["B", "A", "C"]);
    }

    #[test]
    fn coarse_key_ignores_time_of_day() {
        let morning = BucketKey::new(dt("2024-01-01 06:15:00"), Granularity::Coarse);
        let night = BucketKey::new(dt("2024-01-01 23:59:59"), Granularity::Coarse);
        assert_eq!(morning, night);
        assert_eq!(morning.to_string(), "2024-01-01");
    }

    #[test]
    fn fine_key_keeps_seconds() {
        let a = BucketKey::new(dt("2024-01-01 06:15:00"), Granularity::Fine);
        let b = BucketKey::new(dt("2024-01-01 06:15:01"), Granularity::Fine);
        assert_ne!(a, b);
        assert!(a < b);
        assert_eq!(a.to_string(), "2024-01-01 06:15:00");
    }

    #[test]
    fn dataset_counts() {
        let mut ds = SiteDataset::new();
        ds.insert("B", vec![ProductionRecord::new("2024-01-01", 1.0)]);
        ds.insert(
            "A",
            vec![
                ProductionRecord::new("2024-01-01", 1.0),
                ProductionRecord::new("2024-01-02", 2.0),
            ],
        );
        assert_eq!(ds.site_ids(), ["A", "B"]);
        assert_eq!(ds.site_count(), 2);
        assert_eq!(ds.record_count(), 3);
        assert!(ds.records("C").is_none());
    }
}
