use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::consts::{
    DEFAULT_BASE_URL, DEFAULT_COARSE_ENDPOINT, DEFAULT_FINE_ENDPOINT, DEFAULT_MAX_BODY_MB,
    DEFAULT_REQUEST_TIMEOUT, FINE_REFRESH_PERIOD,
};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Config {
    #[serde(default)]
    pub(crate) base_url: Option<String>,
    #[serde(default)]
    pub(crate) coarse_endpoint: Option<String>,
    #[serde(default)]
    pub(crate) fine_endpoint: Option<String>,
    #[serde(default)]
    pub(crate) timezone: Option<String>,
    #[serde(default)]
    pub(crate) refresh_minutes: Option<u64>,
    #[serde(default)]
    pub(crate) request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub(crate) max_body_mb: Option<u64>,
    #[serde(default)]
    pub(crate) default_sites: Vec<String>,
    #[serde(default)]
    pub(crate) debug: bool,
    /// Installed size per site, in kW
    #[serde(default)]
    pub(crate) site_sizes: HashMap<String, f64>,
}

impl Config {
    /// Load from `explicit` if given, otherwise from the first default
    /// location that exists. Parse failures fall back to defaults.
    pub(crate) fn load(explicit: Option<&Path>) -> Self {
        let paths = match explicit {
            Some(path) => vec![path.to_path_buf()],
            None => Self::get_config_paths(),
        };

        for path in paths {
            if !path.exists() {
                if explicit.is_some() {
                    warn!(path = %path.display(), "config file not found");
                }
                continue;
            }
            match fs::read_to_string(&path) {
                Ok(content) => match toml::from_str::<Config>(&content) {
                    Ok(config) => {
                        debug!(path = %path.display(), "loaded config");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "failed to parse config");
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to read config");
                }
            }
        }

        Self::default()
    }

    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. XDG config: ~/.config/solarview/config.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("solarview").join("config.toml"));
        }

        // 2. Platform config dir, e.g. ~/Library/Application Support on macOS
        if let Some(config_dir) = dirs::config_dir() {
            let platform_path = config_dir.join("solarview").join("config.toml");
            if !paths.contains(&platform_path) {
                paths.push(platform_path);
            }
        }

        // 3. Home directory: ~/.solarview.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".solarview.toml"));
        }

        paths
    }

    pub(crate) fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub(crate) fn coarse_endpoint(&self) -> &str {
        self.coarse_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_COARSE_ENDPOINT)
    }

    pub(crate) fn fine_endpoint(&self) -> &str {
        self.fine_endpoint.as_deref().unwrap_or(DEFAULT_FINE_ENDPOINT)
    }

    /// Fine-mode polling period; zero minutes keeps the default
    pub(crate) fn refresh_period(&self) -> Duration {
        match self.refresh_minutes {
            Some(minutes) if minutes > 0 => Duration::from_secs(minutes.saturating_mul(60)),
            _ => FINE_REFRESH_PERIOD,
        }
    }

    pub(crate) fn request_timeout(&self) -> Duration {
        match self.request_timeout_secs {
            Some(secs) if secs > 0 => Duration::from_secs(secs),
            _ => DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Response body ceiling in bytes; zero keeps the default
    pub(crate) fn max_body_bytes(&self) -> u64 {
        let mb = match self.max_body_mb {
            Some(mb) if mb > 0 => mb,
            _ => DEFAULT_MAX_BODY_MB,
        };
        mb.saturating_mul(1024 * 1024)
    }
}
