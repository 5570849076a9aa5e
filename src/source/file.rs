//! Saved payloads on disk, for offline use

use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::core::{Granularity, IntervalMode, SiteDataset};
use crate::error::FetchError;
use crate::source::directory::SiteDirectory;
use crate::source::payload::decode_dataset;
use crate::source::DataSource;

pub(crate) struct FileSource {
    input: PathBuf,
    directory: Option<PathBuf>,
}

impl FileSource {
    pub(crate) fn new(input: PathBuf, directory: Option<PathBuf>) -> Self {
        Self { input, directory }
    }
}

impl DataSource for FileSource {
    fn name(&self) -> &'static str {
        "file"
    }

    fn endpoint(&self, _interval: IntervalMode) -> String {
        self.input.display().to_string()
    }

    /// The file holds whatever interval it was saved with; `interval` is only logged.
    fn fetch(&self, interval: IntervalMode) -> Result<SiteDataset, FetchError> {
        let origin = self.input.display().to_string();
        let bytes = fs::read(&self.input).map_err(|source| FetchError::Io {
            path: origin.clone(),
            source,
        })?;
        debug!(path = %origin, %interval, "read saved payload");
        Ok(decode_dataset(&bytes, &origin))
    }

    fn directory(&self, _granularity: Granularity) -> Result<SiteDirectory, FetchError> {
        match &self.directory {
            Some(path) => SiteDirectory::load(path),
            None => Ok(SiteDirectory::default()),
        }
    }
}
