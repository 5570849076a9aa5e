//! Multi-series chart shaping
//!
//! Every selected site gets one series; all series share a single sorted
//! label axis built from the union of their bucket keys.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use crate::core::range::RangeFilter;
use crate::core::timekey::normalize;
use crate::core::types::{BucketKey, SiteDataset, Selection};
use crate::utils::Timezone;

/// One plotted sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ChartPoint {
    pub(crate) x: BucketKey,
    pub(crate) y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChartSeries {
    pub(crate) site_id: String,
    pub(crate) color: String,
    pub(crate) points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ChartData {
    pub(crate) labels: Vec<BucketKey>,
    pub(crate) series: Vec<ChartSeries>,
    /// Records dropped because their timestamp could not be parsed
    pub(crate) dropped: usize,
}

/// Shape `dataset` into chart series for the sites in `selection`.
///
/// Points pass through one-to-one: two records in the same bucket yield two
/// points at the same x.
pub(crate) fn build_series(dataset: &SiteDataset, selection: &Selection, tz: Timezone) -> ChartData {
    let granularity = selection.granularity();
    let filter = RangeFilter::for_selection(selection);
    let mut labels: BTreeSet<BucketKey> = BTreeSet::new();
    let mut dropped = 0usize;

    let series = selection
        .sites()
        .iter()
        .map(|site| {
            let records = dataset.records(site).unwrap_or_default();
            let mut points = Vec::with_capacity(records.len());

            for record in records {
                let key = match normalize(&record.timestamp, granularity, tz) {
                    Ok(key) => key,
                    Err(e) => {
                        dropped += 1;
                        debug!(site = %site, error = %e, "dropping record");
                        continue;
                    }
                };
                if !filter.admits(&key) {
                    continue;
                }
                labels.insert(key);
                points.push(ChartPoint {
                    x: key,
                    y: record.production_kwh,
                });
            }

            ChartSeries {
                site_id: site.clone(),
                color: series_color(site),
                points,
            }
        })
        .collect();

    debug!(
        sites = selection.sites().len(),
        labels = labels.len(),
        dropped,
        range_filter = filter.is_active(),
        "built chart series"
    );

    ChartData {
        labels: labels.into_iter().collect(),
        series,
        dropped,
    }
}

/// Stable `#aabbcc` color per site, each channel a doubled hex digit 0-7
pub(crate) fn series_color(site: &str) -> String {
    // FNV-1a
    let mut hash: u32 = 0x811c_9dc5;
    for byte in site.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    let r = hash & 0x7;
    let g = (hash >> 3) & 0x7;
    let b = (hash >> 6) & 0x7;
    format!("#{r}{r}{g}{g}{b}{b}")
}
