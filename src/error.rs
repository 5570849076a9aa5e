use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("Invalid date \"{input}\" (expected YYYYMMDD or YYYY-MM-DD)")]
    InvalidDate { input: String },

    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange { start: String, end: String },

    #[error("Invalid timezone: {input}")]
    InvalidTimezone { input: String },

    #[error("Invalid interval \"{input}\" (expected one of 15T, H, 12H, daily, monthly, yearly)")]
    InvalidInterval { input: String },

    #[error("Unknown manufacturer: {input}")]
    UnknownManufacturer { input: String },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to start async runtime: {source}")]
    Runtime { source: std::io::Error },

    #[error("{0}")]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Error)]
pub(crate) enum FetchError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Response from {url} exceeds the {limit} byte limit (raise max_body_mb)")]
    TooLarge { url: String, limit: u64 },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed response from {origin}: {message}")]
    Decode { origin: String, message: String },
}
