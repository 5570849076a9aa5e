//! Refresh state machine
//!
//! Tracks which fetch is current and decides whether a completed fetch may
//! replace the displayed dataset. Has no timers or I/O of its own.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::{IntervalMode, SiteDataset};
use crate::error::FetchError;

/// Dependency set; any change to it forces a refetch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct FetchKey {
    pub(crate) interval: IntervalMode,
    pub(crate) endpoint: String,
    pub(crate) fine: bool,
}

impl FetchKey {
    pub(crate) fn new(interval: IntervalMode, endpoint: impl Into<String>) -> Self {
        Self {
            interval,
            endpoint: endpoint.into(),
            fine: interval.is_fine(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    Fetching,
    Ready,
    Error,
}

/// Identity of one issued request
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RequestTag {
    generation: u64,
    key: FetchKey,
}

impl RequestTag {
    pub(crate) fn key(&self) -> &FetchKey {
        &self.key
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Result replaced the dataset
    Applied,
    /// Current request failed; previous dataset kept
    Failed,
    /// Issued for an older key; ignored
    Stale,
}

/// Read-only view published after every transition
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    pub(crate) phase: Phase,
    pub(crate) interval: IntervalMode,
    pub(crate) generation: u64,
    pub(crate) dataset: Option<Arc<SiteDataset>>,
    pub(crate) last_outcome: Option<Outcome>,
    pub(crate) last_error: Option<String>,
    pub(crate) started: u64,
    /// Completions of any outcome, stale ones included
    pub(crate) completed: u64,
    pub(crate) applied: u64,
}

#[derive(Debug)]
pub(crate) struct Orchestrator {
    key: FetchKey,
    generation: u64,
    phase: Phase,
    dataset: Option<Arc<SiteDataset>>,
    last_outcome: Option<Outcome>,
    last_error: Option<String>,
    started: u64,
    completed: u64,
    applied: u64,
}

impl Orchestrator {
    pub(crate) fn new(key: FetchKey) -> Self {
        Self {
            key,
            generation: 0,
            phase: Phase::Idle,
            dataset: None,
            last_outcome: None,
            last_error: None,
            started: 0,
            completed: 0,
            applied: 0,
        }
    }

    pub(crate) fn key(&self) -> &FetchKey {
        &self.key
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn dataset(&self) -> Option<Arc<SiteDataset>> {
        self.dataset.clone()
    }

    /// Switch to `key`. Returns false when it is already current.
    pub(crate) fn set_key(&mut self, key: FetchKey) -> bool {
        if key == self.key {
            return false;
        }
        self.generation += 1;
        debug!(
            generation = self.generation,
            interval = %key.interval,
            endpoint = %key.endpoint,
            "fetch key changed"
        );
        self.key = key;
        true
    }

    /// Issue a request for the current key
    pub(crate) fn begin(&mut self) -> RequestTag {
        self.phase = Phase::Fetching;
        self.started += 1;
        RequestTag {
            generation: self.generation,
            key: self.key.clone(),
        }
    }

    pub(crate) fn complete(
        &mut self,
        tag: &RequestTag,
        result: Result<SiteDataset, FetchError>,
    ) -> Outcome {
        let outcome = if tag.generation != self.generation || tag.key != self.key {
            debug!(
                tag_generation = tag.generation,
                generation = self.generation,
                interval = %tag.key.interval,
                "discarding stale fetch result"
            );
            Outcome::Stale
        } else {
            match result {
                Ok(dataset) => {
                    info!(
                        interval = %self.key.interval,
                        sites = dataset.site_count(),
                        records = dataset.record_count(),
                        "dataset refreshed"
                    );
                    self.dataset = Some(Arc::new(dataset));
                    self.phase = Phase::Ready;
                    self.last_error = None;
                    self.applied += 1;
                    Outcome::Applied
                }
                Err(e) => {
                    warn!(
                        interval = %self.key.interval,
                        error = %e,
                        kept_previous = self.dataset.is_some(),
                        "refresh failed"
                    );
                    self.phase = Phase::Error;
                    self.last_error = Some(e.to_string());
                    Outcome::Failed
                }
            }
        };
        self.completed += 1;
        self.last_outcome = Some(outcome);
        outcome
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            interval: self.key.interval,
            generation: self.generation,
            dataset: self.dataset.clone(),
            last_outcome: self.last_outcome,
            last_error: self.last_error.clone(),
            started: self.started,
            completed: self.completed,
            applied: self.applied,
        }
    }
}
