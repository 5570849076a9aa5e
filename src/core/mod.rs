//! Core module - data model and the time-series transformations

mod aggregator;
mod alerts;
mod metrics;
mod range;
mod series;
mod timekey;
mod types;

pub(crate) use aggregator::{ExportTable, aggregate_export};
pub(crate) use alerts::{ZeroProductionAlert, zero_production_alerts};
pub(crate) use metrics::{MetricWindow, SiteMetrics, compute_metrics};
pub(crate) use series::{ChartData, build_series};
pub(crate) use types::{
    DateRange, Granularity, IntervalMode, ProductionRecord, Selection, SiteDataset,
};
