//! Data source abstraction layer
//!
//! The dashboard reads production data either from the HTTP API or from a
//! saved payload file; both implement `DataSource`.

pub(crate) mod directory;
pub(crate) mod file;
pub(crate) mod http;
pub(crate) mod payload;

use std::sync::Arc;

use crate::core::{Granularity, IntervalMode, SiteDataset};
use crate::error::FetchError;

pub(crate) use directory::SiteDirectory;
pub(crate) use file::FileSource;
pub(crate) use http::{HttpSettings, HttpSource};

/// Blocking fetch interface; the refresh driver runs it off the async thread
pub(crate) trait DataSource: Send + Sync {
    /// Short name used in log events
    fn name(&self) -> &'static str;

    /// Where a fetch for `interval` reads from; changes here force a refetch
    fn endpoint(&self, interval: IntervalMode) -> String;

    fn fetch(&self, interval: IntervalMode) -> Result<SiteDataset, FetchError>;

    fn directory(&self, granularity: Granularity) -> Result<SiteDirectory, FetchError>;
}

/// Shared handle so fetches can move onto blocking worker threads
pub(crate) type SharedSource = Arc<dyn DataSource>;
