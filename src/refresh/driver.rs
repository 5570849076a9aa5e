//! Async refresh loop
//!
//! Owns the orchestrator, the fine-mode poll timer and the in-flight fetches.
//! Fetches run on the blocking pool; everything else stays on the task.

use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::core::{IntervalMode, SiteDataset};
use crate::error::FetchError;
use crate::refresh::state::{FetchKey, Orchestrator, RequestTag, Snapshot};
use crate::source::SharedSource;

#[derive(Debug)]
enum Command {
    SetInterval(IntervalMode),
    Refresh,
    Shutdown,
}

type FetchResult = (RequestTag, Result<SiteDataset, FetchError>);

/// Control handle for a running refresher. Dropping it stops the loop.
pub(crate) struct RefreshHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<Snapshot>,
    task: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    pub(crate) fn set_interval(&self, interval: IntervalMode) {
        self.send(Command::SetInterval(interval));
    }

    /// Fetch now, through the same path as the poll timer
    pub(crate) fn refresh(&self) {
        self.send(Command::Refresh);
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Stop the loop and wait for it to exit
    pub(crate) async fn shutdown(mut self) {
        self.send(Command::Shutdown);
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
            && !e.is_cancelled()
        {
            error!(error = %e, "refresh task panicked");
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("refresh loop already stopped");
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Start refreshing `interval` from `source`.
///
/// Fetches immediately; in fine mode it then polls every `period`.
/// Must be called from within a tokio runtime.
pub(crate) fn spawn_refresher(
    source: SharedSource,
    interval: IntervalMode,
    period: Duration,
) -> RefreshHandle {
    let state = Orchestrator::new(FetchKey::new(interval, source.endpoint(interval)));
    let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    let task = tokio::spawn(run(source, state, period, command_rx, snapshot_tx));

    RefreshHandle {
        commands: command_tx,
        snapshots: snapshot_rx,
        task: Some(task),
    }
}

/// Poll timer for `key`; `None` outside fine mode. The first tick lands one
/// full period out since arming always goes with an immediate fetch.
fn arm_timer(key: &FetchKey, period: Duration) -> Option<Interval> {
    if !key.fine {
        return None;
    }
    let mut timer = tokio::time::interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    Some(timer)
}

async fn tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn launch_fetch(
    source: &SharedSource,
    state: &mut Orchestrator,
    fetches: &mut JoinSet<FetchResult>,
    trigger: &'static str,
) {
    let tag = state.begin();
    let interval = tag.key().interval;
    debug!(trigger, %interval, in_flight = fetches.len(), "launching fetch");
    let source = source.clone();
    fetches.spawn_blocking(move || {
        let result = source.fetch(interval);
        (tag, result)
    });
}

async fn run(
    source: SharedSource,
    mut state: Orchestrator,
    period: Duration,
    mut commands: mpsc::UnboundedReceiver<Command>,
    snapshots: watch::Sender<Snapshot>,
) {
    let mut fetches: JoinSet<FetchResult> = JoinSet::new();
    let mut timer = arm_timer(state.key(), period);

    info!(
        source = source.name(),
        interval = %state.key().interval,
        polling = timer.is_some(),
        period_secs = period.as_secs(),
        "refresher started"
    );
    launch_fetch(&source, &mut state, &mut fetches, "start");
    snapshots.send_replace(state.snapshot());

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::SetInterval(interval)) => {
                    let key = FetchKey::new(interval, source.endpoint(interval));
                    if state.set_key(key) {
                        timer = arm_timer(state.key(), period);
                        launch_fetch(&source, &mut state, &mut fetches, "interval");
                    } else {
                        debug!(%interval, "interval unchanged");
                    }
                }
                Some(Command::Refresh) => {
                    launch_fetch(&source, &mut state, &mut fetches, "manual");
                }
                Some(Command::Shutdown) | None => break,
            },
            Some(joined) = fetches.join_next() => match joined {
                Ok((tag, result)) => {
                    state.complete(&tag, result);
                }
                Err(e) => error!(error = %e, "fetch task failed"),
            },
            () = tick(&mut timer) => {
                launch_fetch(&source, &mut state, &mut fetches, "timer");
            }
        }
        snapshots.send_replace(state.snapshot());
    }

    fetches.abort_all();
    info!(
        phase = ?state.phase(),
        has_data = state.dataset().is_some(),
        in_flight = fetches.len(),
        "refresher stopped"
    );
}
