use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, info, warn};

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::consts::FETCH_RETRIES;
use crate::core::{
    IntervalMode, Selection, SiteDataset, aggregate_export, build_series, compute_metrics,
    zero_production_alerts,
};
use crate::error::AppError;
use crate::output::{
    alerts_table, export_csv, metrics_table, output_alerts_json, output_chart_json,
    output_metrics_json, refresh_table, sites_table, write_export,
};
use crate::refresh::{Outcome, spawn_refresher};
use crate::source::{FileSource, HttpSettings, HttpSource, SharedSource, SiteDirectory};
use crate::utils::{Timezone, parse_date, parse_range};

/// Time allowed for in-flight blocking fetches when `watch` exits
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

pub(crate) struct CommandContext<'a> {
    pub(crate) cli: &'a Cli,
    pub(crate) config: &'a Config,
    pub(crate) source: SharedSource,
    pub(crate) selection: Selection,
    pub(crate) timezone: Timezone,
}

pub(crate) fn build_source(cli: &Cli, config: &Config) -> SharedSource {
    match &cli.input {
        Some(input) => Arc::new(FileSource::new(input.clone(), cli.directory.clone())),
        None => Arc::new(HttpSource::new(HttpSettings {
            base_url: cli
                .base_url
                .clone()
                .unwrap_or_else(|| config.base_url().to_string()),
            coarse_endpoint: config.coarse_endpoint().to_string(),
            fine_endpoint: config.fine_endpoint().to_string(),
            timeout: config.request_timeout(),
            retries: FETCH_RETRIES,
            max_body_bytes: config.max_body_bytes(),
        })),
    }
}

fn load_directory(
    cli: &Cli,
    source: &SharedSource,
    interval: IntervalMode,
) -> Result<SiteDirectory, AppError> {
    let directory = match &cli.directory {
        Some(path) => SiteDirectory::load(path)?,
        None => source.directory(interval.granularity())?,
    };
    Ok(directory)
}

/// Build the selection from explicit sites plus every site of each
/// requested manufacturer
pub(crate) fn resolve_selection(cli: &Cli, source: &SharedSource) -> Result<Selection, AppError> {
    let interval = cli.interval();
    let range = parse_range(cli.since.as_deref(), cli.until.as_deref())?;
    let mut selection = Selection::new(interval).with_range(range);
    selection.add_sites(cli.sites.iter().cloned());

    if !cli.manufacturers.is_empty() {
        let directory = load_directory(cli, source, interval)?;
        for name in &cli.manufacturers {
            let sites = directory
                .sites_for(name)
                .ok_or_else(|| AppError::UnknownManufacturer {
                    input: name.clone(),
                })?;
            debug!(manufacturer = %name, sites = sites.len(), "selected manufacturer");
            selection.add_sites(sites.iter().cloned());
        }
    }

    Ok(selection)
}

/// One-shot fetch; a failure degrades to an empty dataset
fn load_dataset(source: &SharedSource, interval: IntervalMode) -> SiteDataset {
    match source.fetch(interval) {
        Ok(dataset) => dataset,
        Err(e) => {
            warn!(source = source.name(), error = %e, "fetch failed, continuing with no data");
            SiteDataset::new()
        }
    }
}

/// Selected sites, or every site in `dataset` when nothing is selected
fn sites_or_all(selection: &Selection, dataset: &SiteDataset) -> Vec<String> {
    if selection.sites().is_empty() {
        dataset.site_ids().into_iter().map(String::from).collect()
    } else {
        selection.sites().to_vec()
    }
}

fn handle_chart(ctx: &CommandContext<'_>) {
    let dataset = load_dataset(&ctx.source, ctx.selection.interval);
    let chart = build_series(&dataset, &ctx.selection, ctx.timezone);
    if chart.dropped > 0 {
        info!(dropped = chart.dropped, "records with unparseable timestamps were skipped");
    }
    println!("{}", output_chart_json(&chart));
}

fn handle_export(
    ctx: &CommandContext<'_>,
    output: &std::path::Path,
    stdout: bool,
) -> Result<(), AppError> {
    if ctx.selection.sites().is_empty() {
        warn!("no sites selected, nothing to export");
        return Ok(());
    }
    let dataset = load_dataset(&ctx.source, ctx.selection.interval);
    let Some(table) = aggregate_export(&dataset, &ctx.selection, ctx.timezone) else {
        warn!("no production data, nothing to export");
        return Ok(());
    };

    if stdout {
        print!("{}", export_csv(&table));
    } else {
        let path = write_export(&table, output)?;
        println!("Exported {} rows to {}", table.rows.len(), path.display());
    }
    Ok(())
}

fn handle_metrics(ctx: &CommandContext<'_>, today: Option<&str>) -> Result<(), AppError> {
    let today = match today {
        Some(raw) => parse_date(raw)?,
        None => ctx.timezone.today(),
    };
    if ctx.selection.interval != IntervalMode::Daily {
        debug!(interval = %ctx.selection.interval, "metrics always use daily data");
    }
    let dataset = load_dataset(&ctx.source, IntervalMode::Daily);
    let sites = sites_or_all(&ctx.selection, &dataset);
    if sites.is_empty() {
        println!("No production data found.");
        return Ok(());
    }

    let metrics = compute_metrics(&dataset, &sites, &ctx.config.site_sizes, today, ctx.timezone);
    if ctx.cli.json {
        println!("{}", output_metrics_json(&metrics));
    } else {
        println!("{}", metrics_table(&metrics, ctx.cli.use_color()));
    }
    Ok(())
}

fn handle_alerts(ctx: &CommandContext<'_>) {
    let dataset = load_dataset(&ctx.source, IntervalMode::Daily);
    let alerts = zero_production_alerts(&dataset, ctx.selection.sites(), ctx.timezone);
    if ctx.cli.json {
        println!("{}", output_alerts_json(&alerts));
    } else if alerts.is_empty() {
        println!("All sites produced on their latest day.");
    } else {
        println!("{}", alerts_table(&alerts, ctx.cli.use_color()));
    }
}

fn handle_sites(ctx: &CommandContext<'_>) -> Result<(), AppError> {
    let directory = load_directory(ctx.cli, &ctx.source, ctx.selection.interval)?;
    if ctx.cli.json {
        println!("{:#}", serde_json::json!(directory.entries()));
    } else if directory.entries().is_empty() {
        println!("No sites found.");
    } else {
        println!("{}", sites_table(&directory, ctx.cli.use_color()));
    }
    Ok(())
}

fn handle_watch(ctx: &CommandContext<'_>, count: Option<u64>) -> Result<(), AppError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|source| AppError::Runtime { source })?;

    runtime.block_on(watch_loop(ctx, count));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    Ok(())
}

/// One line typed on stdin while `watch` runs
#[derive(Debug, PartialEq, Eq)]
enum WatchInput {
    Refresh,
    Interval(IntervalMode),
    Quit,
}

fn parse_watch_input(line: &str) -> Option<WatchInput> {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "" => None,
        "r" | "refresh" => Some(WatchInput::Refresh),
        "q" | "quit" => Some(WatchInput::Quit),
        _ => line.parse().ok().map(WatchInput::Interval),
    }
}

type StdinLines = Lines<BufReader<Stdin>>;

/// Next stdin line; pends forever once stdin is closed
async fn next_line(input: &mut Option<StdinLines>) -> String {
    let Some(lines) = input else {
        return std::future::pending().await;
    };
    match lines.next_line().await {
        Ok(Some(line)) => line,
        Ok(None) => {
            debug!("stdin closed, keyboard commands disabled");
            *input = None;
            std::future::pending().await
        }
        Err(e) => {
            warn!(error = %e, "failed to read stdin");
            *input = None;
            std::future::pending().await
        }
    }
}

async fn watch_loop(ctx: &CommandContext<'_>, count: Option<u64>) {
    let period = ctx.config.refresh_period();
    let handle = spawn_refresher(ctx.source.clone(), ctx.selection.interval, period);
    let mut snapshots = handle.subscribe();
    let use_color = ctx.cli.use_color();
    let mut input = Some(BufReader::new(tokio::io::stdin()).lines());
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);
    let mut seen = 0u64;
    let mut shown = 0u64;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if snapshot.completed == seen {
                    continue;
                }
                seen = snapshot.completed;
                debug!(
                    generation = snapshot.generation,
                    started = snapshot.started,
                    completed = snapshot.completed,
                    applied = snapshot.applied,
                    "refresh completed"
                );

                if snapshot.applied != shown || snapshot.last_outcome == Some(Outcome::Failed) {
                    shown = snapshot.applied;
                    let dataset = snapshot.dataset.clone().unwrap_or_default();
                    let mut selection = ctx.selection.clone();
                    selection.interval = snapshot.interval;
                    selection.add_sites(sites_or_all(&ctx.selection, &dataset));
                    let chart = build_series(&dataset, &selection, ctx.timezone);
                    println!("{}", refresh_table(&snapshot, &chart, use_color));
                }

                if count.is_some_and(|n| snapshot.applied >= n) {
                    break;
                }
            }
            line = next_line(&mut input) => match parse_watch_input(&line) {
                Some(WatchInput::Refresh) => handle.refresh(),
                Some(WatchInput::Interval(interval)) => {
                    info!(%interval, "switching interval");
                    handle.set_interval(interval);
                }
                Some(WatchInput::Quit) => break,
                None if line.trim().is_empty() => {}
                None => {
                    warn!(input = %line.trim(), "unknown command, expected r, q or an interval");
                }
            },
            _ = &mut interrupted => {
                info!("interrupted");
                break;
            }
        }
    }

    handle.shutdown().await;
}

pub(crate) fn run_command(ctx: &CommandContext<'_>) -> Result<(), AppError> {
    match &ctx.cli.command {
        None | Some(Commands::Chart) => {
            handle_chart(ctx);
            Ok(())
        }
        Some(Commands::Export { output, stdout }) => handle_export(ctx, output, *stdout),
        Some(Commands::Watch { count }) => handle_watch(ctx, *count),
        Some(Commands::Metrics { today }) => handle_metrics(ctx, today.as_deref()),
        Some(Commands::Alerts) => {
            handle_alerts(ctx);
            Ok(())
        }
        Some(Commands::Sites) => handle_sites(ctx),
    }
}
