//! Per-site production totals over fixed trailing windows

use chrono::{Datelike, Duration, Months, NaiveDate};
use std::collections::HashMap;
use tracing::debug;

use crate::core::timekey::parse_timestamp;
use crate::core::types::{DateRange, SiteDataset};
use crate::utils::Timezone;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MetricWindow {
    Last7Days,
    MonthToDate,
    LastMonth,
    ThreeMonth,
    SixMonth,
    LastYear,
    YearToDate,
}

impl MetricWindow {
    pub(crate) const ALL: [MetricWindow; 7] = [
        MetricWindow::Last7Days,
        MetricWindow::MonthToDate,
        MetricWindow::LastMonth,
        MetricWindow::ThreeMonth,
        MetricWindow::SixMonth,
        MetricWindow::LastYear,
        MetricWindow::YearToDate,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            MetricWindow::Last7Days => "Last 7 Days",
            MetricWindow::MonthToDate => "Month To Date",
            MetricWindow::LastMonth => "Last Month",
            MetricWindow::ThreeMonth => "Three Months",
            MetricWindow::SixMonth => "Six Months",
            MetricWindow::LastYear => "Last Year",
            MetricWindow::YearToDate => "Year to Date",
        }
    }

    /// Inclusive day range this window covers when evaluated on `today`
    pub(crate) fn range(self, today: NaiveDate) -> DateRange {
        let month_start = today.with_day(1).unwrap_or(today);
        let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
        let (start, end) = match self {
            MetricWindow::Last7Days => (today - Duration::days(7), today),
            MetricWindow::MonthToDate => (month_start, today),
            MetricWindow::LastMonth => {
                let start = month_start
                    .checked_sub_months(Months::new(1))
                    .unwrap_or(month_start);
                (start, month_start - Duration::days(1))
            }
            MetricWindow::ThreeMonth => (months_back(today, 3), today),
            MetricWindow::SixMonth => (months_back(today, 6), today),
            MetricWindow::LastYear => {
                let start = NaiveDate::from_ymd_opt(today.year() - 1, 1, 1).unwrap_or(today);
                (start, year_start - Duration::days(1))
            }
            MetricWindow::YearToDate => (year_start, today),
        };
        DateRange { start, end }
    }
}

fn months_back(today: NaiveDate, months: u32) -> NaiveDate {
    today
        .checked_sub_months(Months::new(months))
        .unwrap_or(today)
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SiteMetrics {
    pub(crate) site: String,
    /// Totals in `MetricWindow::ALL` order, in kWh
    pub(crate) totals: Vec<(MetricWindow, f64)>,
    pub(crate) size_kw: Option<f64>,
    /// Last year's production per kW of installed size
    pub(crate) efficiency: Option<f64>,
}

impl SiteMetrics {
    pub(crate) fn total(&self, window: MetricWindow) -> f64 {
        self.totals
            .iter()
            .find(|(w, _)| *w == window)
            .map(|(_, v)| *v)
            .unwrap_or(0.0)
    }
}

/// Compute window totals for each site in `sites`, in the given order.
///
/// Sites absent from the dataset report zero totals.
pub(crate) fn compute_metrics(
    dataset: &SiteDataset,
    sites: &[String],
    sizes_kw: &HashMap<String, f64>,
    today: NaiveDate,
    tz: Timezone,
) -> Vec<SiteMetrics> {
    let windows: Vec<(MetricWindow, DateRange)> = MetricWindow::ALL
        .iter()
        .map(|w| (*w, w.range(today)))
        .collect();
    let mut dropped = 0usize;

    let metrics = sites
        .iter()
        .map(|site| {
            let mut totals: Vec<(MetricWindow, f64)> =
                MetricWindow::ALL.iter().map(|w| (*w, 0.0)).collect();

            for record in dataset.records(site).unwrap_or_default() {
                let Some(at) = parse_timestamp(&record.timestamp, tz) else {
                    dropped += 1;
                    continue;
                };
                let date = at.date();
                for (slot, (_, range)) in totals.iter_mut().zip(&windows) {
                    if range.contains(date) {
                        slot.1 += record.production_kwh;
                    }
                }
            }

            let size_kw = sizes_kw.get(site).copied();
            let mut site_metrics = SiteMetrics {
                site: site.clone(),
                totals,
                size_kw,
                efficiency: None,
            };
            let last_year = site_metrics.total(MetricWindow::LastYear);
            site_metrics.efficiency = size_kw.filter(|kw| *kw > 0.0).map(|kw| last_year / kw);
            site_metrics
        })
        .collect();

    debug!(sites = sites.len(), dropped, %today, "computed production metrics");
    metrics
}
