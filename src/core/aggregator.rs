//! Per-site, per-bucket summation for export
//!
//! Kept separate from the series builder: the export sums duplicates and
//! applies a second range check on the aggregated keys in coarse mode.

use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::core::range::RangeFilter;
use crate::core::timekey::normalize;
use crate::core::types::{BucketKey, Granularity, SiteDataset, Selection};
use crate::utils::Timezone;

/// Summed production per selected site and bucket
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ExportTable {
    /// Output rows, chronological
    pub(crate) rows: Vec<BucketKey>,
    /// Selected sites, in selection order
    pub(crate) columns: Vec<String>,
    /// One map per column, parallel to `columns`
    pub(crate) cells: Vec<HashMap<BucketKey, f64>>,
    /// Cross-site total per bucket
    pub(crate) totals: HashMap<BucketKey, f64>,
    /// Records dropped because their timestamp could not be parsed
    pub(crate) dropped: usize,
}

impl ExportTable {
    /// Sum for `column` at `key`; absent data reads as zero
    pub(crate) fn cell(&self, column: usize, key: &BucketKey) -> f64 {
        self.cells
            .get(column)
            .and_then(|sums| sums.get(key))
            .copied()
            .unwrap_or(0.0)
    }

    pub(crate) fn total(&self, key: &BucketKey) -> f64 {
        self.totals.get(key).copied().unwrap_or(0.0)
    }
}

/// Aggregate `dataset` into an export table for `selection`.
///
/// Returns `None` when nothing is selected or there is no data at all; the
/// caller treats that as a no-op.
pub(crate) fn aggregate_export(
    dataset: &SiteDataset,
    selection: &Selection,
    tz: Timezone,
) -> Option<ExportTable> {
    if selection.sites().is_empty() || dataset.is_empty() {
        return None;
    }

    let granularity = selection.granularity();
    let filter = RangeFilter::for_selection(selection);
    let mut dropped = 0usize;
    let mut cells: Vec<HashMap<BucketKey, f64>> = Vec::with_capacity(selection.sites().len());

    for site in selection.sites() {
        let mut sums: HashMap<BucketKey, f64> = HashMap::new();
        for record in dataset.records(site).unwrap_or_default() {
            let key = match normalize(&record.timestamp, granularity, tz) {
                Ok(key) => key,
                Err(e) => {
                    dropped += 1;
                    debug!(site = %site, error = %e, "dropping record from export");
                    continue;
                }
            };
            if !filter.admits(&key) {
                continue;
            }
            *sums.entry(key).or_insert(0.0) += record.production_kwh;
        }
        cells.push(sums);
    }

    // Totals come from the finished per-site sums so the columns always add up
    let mut totals: HashMap<BucketKey, f64> = HashMap::new();
    for sums in &cells {
        for (key, value) in sums {
            *totals.entry(*key).or_insert(0.0) += value;
        }
    }

    let rows: BTreeSet<BucketKey> = totals
        .keys()
        .filter(|key| match (granularity, &selection.range) {
            (Granularity::Coarse, Some(range)) => range.contains(key.date()),
            _ => true,
        })
        .copied()
        .collect();

    debug!(
        sites = cells.len(),
        buckets = totals.len(),
        rows = rows.len(),
        dropped,
        "aggregated export"
    );

    Some(ExportTable {
        rows: rows.into_iter().collect(),
        columns: selection.sites().to_vec(),
        cells,
        totals,
        dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{DateRange, IntervalMode, ProductionRecord};
    use chrono::NaiveDate;

    const UTC: Timezone = Timezone::Named(chrono_tz::UTC);

    fn sample_dataset() -> SiteDataset {
        let mut ds = SiteDataset::new();
        ds.insert(
            "SiteA",
            vec![
                ProductionRecord::new("2024-01-01", 10.0),
                ProductionRecord::new("2024-01-02", 5.0),
            ],
        );
        ds.insert("SiteB", vec![ProductionRecord::new("2024-01-01", 3.0)]);
        ds
    }

    fn selection(mode: IntervalMode, sites: &[&str], range: Option<(&str, &str)>) -> Selection {
        let range = range.map(|(s, e)| {
            DateRange::new(
                NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap(),
                NaiveDate::parse_from_str(e, "%Y-%m-%d").unwrap(),
            )
            .unwrap()
        });
        let mut sel = Selection::new(mode).with_range(range);
        sel.add_sites(sites.iter().copied());
        sel
    }

    fn rows(table: &ExportTable) -> Vec<String> {
        table.rows.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn coarse_scenario_sums_and_totals() {
        let sel = selection(
            IntervalMode::Daily,
            &["SiteA", "SiteB"],
            Some(("2024-01-01", "2024-01-02")),
        );
        let table = aggregate_export(&sample_dataset(), &sel, UTC).unwrap();
        assert_eq!(rows(&table), ["2024-01-01", "2024-01-02"]);
        let (d1, d2) = (table.rows[0], table.rows[1]);
        assert_eq!(table.cell(0, &d1), 10.0);
        assert_eq!(table.cell(1, &d1), 3.0);
        assert_eq!(table.total(&d1), 13.0);
        assert_eq!(table.cell(0, &d2), 5.0);
        assert_eq!(table.cell(1, &d2), 0.0);
        assert_eq!(table.total(&d2), 5.0);
    }

    #[test]
    fn empty_selection_is_noop() {
        let sel = selection(IntervalMode::Daily, &[], None);
        assert!(aggregate_export(&sample_dataset(), &sel, UTC).is_none());
    }

    #[test]
    fn empty_dataset_is_noop() {
        let sel = selection(IntervalMode::Daily, &["SiteA"], None);
        assert!(aggregate_export(&SiteDataset::new(), &sel, UTC).is_none());
    }

    #[test]
    fn duplicates_accumulate() {
        let mut ds = SiteDataset::new();
        ds.insert(
            "SiteA",
            vec![
                ProductionRecord::new("2024-01-01 09:00:00", 1.5),
                ProductionRecord::new("2024-01-01 15:00:00", 2.5),
                ProductionRecord::new("2024-01-01 15:00:00", 2.5),
            ],
        );
        let sel = selection(IntervalMode::Daily, &["SiteA"], None);
        let table = aggregate_export(&ds, &sel, UTC).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.cell(0, &table.rows[0]), 6.5);
    }

    #[test]
    fn totals_equal_sum_of_site_columns() {
        let mut ds = sample_dataset();
        ds.insert(
            "SiteC",
            vec![
                ProductionRecord::new("2024-01-02", 0.1),
                ProductionRecord::new("2024-01-03", 0.2),
            ],
        );
        let sel = selection(IntervalMode::Daily, &["SiteA", "SiteB", "SiteC"], None);
        let table = aggregate_export(&ds, &sel, UTC).unwrap();
        for key in &table.rows {
            let sum: f64 = (0..table.columns.len()).map(|c| table.cell(c, key)).sum();
            assert_eq!(table.total(key), sum, "bucket {key}");
        }
    }

    #[test]
    fn coarse_range_excludes_outside_rows() {
        let sel = selection(
            IntervalMode::Daily,
            &["SiteA", "SiteB"],
            Some(("2024-01-02", "2024-01-02")),
        );
        let table = aggregate_export(&sample_dataset(), &sel, UTC).unwrap();
        assert_eq!(rows(&table), ["2024-01-02"]);
    }

    #[test]
    fn range_leaving_nothing_gives_header_only_table() {
        let sel = selection(
            IntervalMode::Daily,
            &["SiteA"],
            Some(("2025-01-01", "2025-01-31")),
        );
        let table = aggregate_export(&sample_dataset(), &sel, UTC).unwrap();
        assert!(table.rows.is_empty());
        assert_eq!(table.columns, ["SiteA"]);
    }

    #[test]
    fn fine_mode_includes_everything() {
        let mut ds = SiteDataset::new();
        ds.insert(
            "SiteA",
            vec![
                ProductionRecord::new("2020-05-05 10:00:00", 0.5),
                ProductionRecord::new("2020-05-05 10:15:00", 0.75),
            ],
        );
        let sel = selection(
            IntervalMode::FifteenMin,
            &["SiteA"],
            Some(("2024-01-01", "2024-01-02")),
        );
        let table = aggregate_export(&ds, &sel, UTC).unwrap();
        assert_eq!(rows(&table), ["2020-05-05 10:00:00", "2020-05-05 10:15:00"]);
    }

    #[test]
    fn missing_site_is_a_zero_column() {
        let sel = selection(IntervalMode::Daily, &["SiteA", "Ghost"], None);
        let table = aggregate_export(&sample_dataset(), &sel, UTC).unwrap();
        assert_eq!(table.columns, ["SiteA", "Ghost"]);
        for key in &table.rows {
            assert_eq!(table.cell(1, key), 0.0);
        }
    }

    #[test]
    fn unparseable_records_are_counted() {
        let mut ds = sample_dataset();
        ds.insert("SiteB", vec![ProductionRecord::new("garbage", 3.0)]);
        let sel = selection(IntervalMode::Daily, &["SiteA", "SiteB"], None);
        let table = aggregate_export(&ds, &sel, UTC).unwrap();
        assert_eq!(table.dropped, 1);
    }
}
