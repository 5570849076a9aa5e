//! CLI argument definitions
//!
//! Global CLI options and configuration merging logic.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, ValueEnum};

use crate::config::Config;
use crate::core::IntervalMode;

use super::commands::Commands;

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq)]
pub(crate) enum ColorMode {
    /// Auto-detect based on terminal (default)
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

#[derive(Parser)]
#[command(name = "solarview")]
#[command(about = "Solar site production charts, exports and alerts", version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Option<Commands>,

    /// Data interval: 15T, H, 12H, daily, monthly or yearly
    #[arg(
        short,
        long,
        global = true,
        value_name = "INTERVAL",
        value_parser = IntervalMode::from_str
    )]
    pub(crate) interval: Option<IntervalMode>,

    /// Site to include (repeatable)
    #[arg(long = "site", global = true, value_name = "SITE")]
    pub(crate) sites: Vec<String>,

    /// Include every site of a manufacturer (repeatable)
    #[arg(short, long = "manufacturer", global = true, value_name = "NAME")]
    pub(crate) manufacturers: Vec<String>,

    /// Filter from date (YYYYMMDD or YYYY-MM-DD)
    #[arg(short, long, global = true)]
    pub(crate) since: Option<String>,

    /// Filter until date (YYYYMMDD or YYYY-MM-DD)
    #[arg(short, long, global = true)]
    pub(crate) until: Option<String>,

    /// Read production data from a saved payload instead of the server
    #[arg(long, global = true, value_name = "FILE")]
    pub(crate) input: Option<PathBuf>,

    /// Read the manufacturer/site directory from a saved file
    #[arg(long, global = true, value_name = "FILE")]
    pub(crate) directory: Option<PathBuf>,

    /// Dashboard server, e.g. http://localhost:5000
    #[arg(long, global = true, value_name = "URL")]
    pub(crate) base_url: Option<String>,

    /// Timezone for timestamps carrying an offset (e.g., "UTC", "America/Edmonton")
    #[arg(long, global = true, value_name = "TZ")]
    pub(crate) timezone: Option<String>,

    /// Config file to use instead of the default locations
    #[arg(long, global = true, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,

    /// Output tables as JSON
    #[arg(short, long, global = true)]
    pub(crate) json: bool,

    /// Color output mode
    #[arg(long, global = true, value_enum, default_value = "auto")]
    pub(crate) color: ColorMode,

    /// Disable colored output (shorthand for --color=never)
    #[arg(long, global = true)]
    pub(crate) no_color: bool,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub(crate) debug: bool,
}

impl Cli {
    /// Merge config file values into CLI (CLI args take precedence)
    pub(crate) fn with_config(mut self, config: &Config) -> Self {
        if !self.debug && config.debug {
            self.debug = true;
        }

        // Default sites only apply when nothing was selected on the command line
        if self.sites.is_empty() && self.manufacturers.is_empty() {
            self.sites = config.default_sites.clone();
        }

        if self.base_url.is_none() {
            self.base_url = config.base_url.clone();
        }
        if self.timezone.is_none() {
            self.timezone = config.timezone.clone();
        }

        self
    }

    pub(crate) fn interval(&self) -> IntervalMode {
        self.interval.unwrap_or(IntervalMode::Daily)
    }

    pub(crate) fn use_color(&self) -> bool {
        if self.no_color {
            return false;
        }
        match self.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stdout().is_terminal(),
        }
    }
}
