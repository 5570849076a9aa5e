//! Fetch/refresh orchestration

pub(crate) mod driver;
pub(crate) mod state;

pub(crate) use driver::spawn_refresher;
pub(crate) use state::{Outcome, Phase, Snapshot};
