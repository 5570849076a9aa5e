//! Decoding of the per-site production payload
//!
//! The server answers with `{ site: [ { "Date": ..., "Production (kWh)": ... } ] }`.
//! Anything that does not fit that shape degrades to missing data rather than
//! an error.

use serde_json::Value;
use tracing::{debug, warn};

use crate::consts::{FIELD_DATE, FIELD_PRODUCTION};
use crate::core::{ProductionRecord, SiteDataset};

fn production_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn decode_record(value: &Value) -> Option<ProductionRecord> {
    let timestamp = value.get(FIELD_DATE).and_then(|v| v.as_str())?;
    let production = value.get(FIELD_PRODUCTION).and_then(production_value)?;
    if !production.is_finite() {
        return None;
    }
    Some(ProductionRecord::new(timestamp, production))
}

/// Decode a raw response body. `origin` only labels log events.
pub(crate) fn decode_dataset(bytes: &[u8], origin: &str) -> SiteDataset {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        warn!(origin, "empty payload, treating as no data");
        return SiteDataset::new();
    }

    let root: Value = match serde_json::from_slice(bytes) {
        Ok(root) => root,
        Err(e) => {
            warn!(origin, error = %e, "malformed payload, treating as no data");
            return SiteDataset::new();
        }
    };

    let Value::Object(sites) = root else {
        warn!(origin, "payload is not an object, treating as no data");
        return SiteDataset::new();
    };

    let mut skipped = 0usize;
    let dataset: SiteDataset = sites
        .into_iter()
        .map(|(site, value)| {
            let records = match value.as_array() {
                Some(items) => items
                    .iter()
                    .filter_map(|item| {
                        let record = decode_record(item);
                        if record.is_none() {
                            skipped += 1;
                        }
                        record
                    })
                    .collect(),
                None => Vec::new(),
            };
            (site, records)
        })
        .collect();

    if skipped > 0 {
        warn!(origin, skipped, "skipped malformed production records");
    }
    debug!(
        origin,
        sites = dataset.site_count(),
        records = dataset.record_count(),
        "decoded payload"
    );
    dataset
}
