use std::time::Duration;

/// Calendar-day bucket format: "2025-01-15"
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fine bucket format: "2025-01-15 13:45:00"
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Payload field holding the record timestamp
pub(crate) const FIELD_DATE: &str = "Date";

/// Payload field holding the produced energy
pub(crate) const FIELD_PRODUCTION: &str = "Production (kWh)";

/// Label of the cross-site total column in exports
pub(crate) const ALL_SITES: &str = "All Sites";

/// File name used when writing an export to disk
pub(crate) const EXPORT_FILE_NAME: &str = "Production_data.csv";

/// MIME type of the export payload
pub(crate) const EXPORT_MIME: &str = "text/csv";

/// Polling period for fine-granularity data
pub(crate) const FINE_REFRESH_PERIOD: Duration = Duration::from_secs(15 * 60);

/// Server used when neither `--base-url` nor the config sets one
pub(crate) const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Endpoint serving daily / monthly / yearly aggregates
pub(crate) const DEFAULT_COARSE_ENDPOINT: &str = "/api/data";

/// Endpoint serving 15-minute / hourly / 12-hour data
pub(crate) const DEFAULT_FINE_ENDPOINT: &str = "/api/15min/data";

pub(crate) const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Attempts per request before a fetch counts as failed
pub(crate) const FETCH_RETRIES: usize = 3;

/// Largest response body accepted, in MiB
pub(crate) const DEFAULT_MAX_BODY_MB: u64 = 512;
