mod csv;
mod format;
mod json;
mod table;

pub(crate) use csv::{export_csv, write_export};
pub(crate) use json::{output_alerts_json, output_chart_json, output_metrics_json};
pub(crate) use table::{alerts_table, metrics_table, refresh_table, sites_table};
