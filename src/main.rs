mod app;
mod cli;
mod config;
mod consts;
mod core;
mod error;
mod logging;
mod output;
mod refresh;
mod source;
mod utils;

use clap::Parser;
use tracing::debug;

use app::{CommandContext, build_source, resolve_selection, run_command};
use cli::Cli;
use config::Config;
use error::AppError;
use utils::Timezone;

fn run(cli: Cli) -> Result<(), AppError> {
    let log = logging::init_logging(cli.debug);

    let config = Config::load(cli.config.as_deref());
    let cli = cli.with_config(&config);
    if cli.debug {
        log.enable_debug();
    }

    let timezone = Timezone::parse(cli.timezone.as_deref())?;
    let source = build_source(&cli, &config);
    let selection = resolve_selection(&cli, &source)?;
    debug!(
        source = source.name(),
        interval = %selection.interval,
        sites = selection.sites().len(),
        ranged = selection.range.is_some(),
        "resolved selection"
    );

    let ctx = CommandContext {
        cli: &cli,
        config: &config,
        source,
        selection,
        timezone,
    };
    run_command(&ctx)
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
