//! Production and directory fetches over HTTP

use std::time::Duration;
use tracing::{debug, warn};

use crate::core::{Granularity, IntervalMode, SiteDataset};
use crate::error::FetchError;
use crate::source::directory::SiteDirectory;
use crate::source::payload::decode_dataset;
use crate::source::DataSource;

const RETRY_BACKOFF_MS: u64 = 250;

#[derive(Debug, Clone)]
pub(crate) struct HttpSettings {
    pub(crate) base_url: String,
    pub(crate) coarse_endpoint: String,
    pub(crate) fine_endpoint: String,
    pub(crate) timeout: Duration,
    pub(crate) retries: usize,
    pub(crate) max_body_bytes: u64,
}

pub(crate) struct HttpSource {
    agent: ureq::Agent,
    settings: HttpSettings,
}

fn directory_path(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::Coarse => "/api/site_filter/daily",
        Granularity::Fine => "/api/site_filter/fifteen",
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

impl HttpSource {
    pub(crate) fn new(settings: HttpSettings) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(settings.timeout))
            .build()
            .into();
        Self { agent, settings }
    }

    fn endpoint_for(&self, interval: IntervalMode) -> &str {
        match interval.granularity() {
            Granularity::Coarse => &self.settings.coarse_endpoint,
            Granularity::Fine => &self.settings.fine_endpoint,
        }
    }

    /// Run `send` until it yields a body, backing off linearly between
    /// attempts. Client errors and oversized bodies are returned immediately.
    fn with_retries<F>(&self, url: &str, send: F) -> Result<Vec<u8>, FetchError>
    where
        F: Fn() -> Result<ureq::http::Response<ureq::Body>, ureq::Error>,
    {
        let attempts = self.settings.retries.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            let limit = self.settings.max_body_bytes;
            let result = send().and_then(|response| {
                response
                    .into_body()
                    .into_with_config()
                    .limit(limit)
                    .read_to_vec()
            });
            let error = match result {
                Ok(body) => {
                    debug!(url, bytes = body.len(), attempt, "fetch succeeded");
                    return Ok(body);
                }
                Err(ureq::Error::StatusCode(status)) => {
                    let error = FetchError::Status {
                        url: url.to_string(),
                        status,
                    };
                    if (400..500).contains(&status) {
                        return Err(error);
                    }
                    error
                }
                Err(ureq::Error::BodyExceedsLimit(limit)) => {
                    return Err(FetchError::TooLarge {
                        url: url.to_string(),
                        limit,
                    });
                }
                Err(e) => FetchError::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                },
            };

            warn!(url, attempt, error = %error, "fetch attempt failed");
            last_error = Some(error);

            if attempt + 1 < attempts {
                std::thread::sleep(Duration::from_millis(
                    RETRY_BACKOFF_MS * (attempt as u64 + 1),
                ));
            }
        }

        Err(last_error.unwrap_or_else(|| FetchError::Transport {
            url: url.to_string(),
            message: "no attempts made".to_string(),
        }))
    }
}

impl DataSource for HttpSource {
    fn name(&self) -> &'static str {
        "http"
    }

    fn endpoint(&self, interval: IntervalMode) -> String {
        join_url(&self.settings.base_url, self.endpoint_for(interval))
    }

    fn fetch(&self, interval: IntervalMode) -> Result<SiteDataset, FetchError> {
        let url = self.endpoint(interval);
        let body = serde_json::json!({ "selection": interval.wire_name() });
        let bytes = self.with_retries(&url, || self.agent.post(&url).send_json(&body))?;
        Ok(decode_dataset(&bytes, &url))
    }

    fn directory(&self, granularity: Granularity) -> Result<SiteDirectory, FetchError> {
        let url = join_url(&self.settings.base_url, directory_path(granularity));
        let bytes = self.with_retries(&url, || self.agent.get(&url).call())?;
        SiteDirectory::from_json(&bytes, &url)
    }
}
