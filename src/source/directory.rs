//! Manufacturer to site listing used to build selections

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::FetchError;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub(crate) struct ManufacturerSites {
    pub(crate) manufacturer_name: String,
    #[serde(default)]
    pub(crate) sites: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SiteDirectory {
    entries: Vec<ManufacturerSites>,
}

impl SiteDirectory {
    pub(crate) fn from_json(bytes: &[u8], origin: &str) -> Result<Self, FetchError> {
        let entries: Vec<ManufacturerSites> =
            serde_json::from_slice(bytes).map_err(|e| FetchError::Decode {
                origin: origin.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self { entries })
    }

    pub(crate) fn load(path: &Path) -> Result<Self, FetchError> {
        let bytes = fs::read(path).map_err(|source| FetchError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&bytes, &path.display().to_string())
    }

    pub(crate) fn entries(&self) -> &[ManufacturerSites] {
        &self.entries
    }

    /// Sites for a manufacturer, matched case-insensitively
    pub(crate) fn sites_for(&self, manufacturer: &str) -> Option<&[String]> {
        let wanted = manufacturer.trim();
        self.entries
            .iter()
            .find(|e| e.manufacturer_name.eq_ignore_ascii_case(wanted))
            .map(|e| e.sites.as_slice())
    }
}
