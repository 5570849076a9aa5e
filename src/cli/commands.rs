//! CLI subcommand definitions

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Print chart-ready JSON for the selected sites (default)
    Chart,
    /// Write Production_data.csv for the selected sites
    Export {
        /// Directory to write the file into
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output: PathBuf,
        /// Print the CSV to stdout instead of writing a file
        #[arg(long)]
        stdout: bool,
    },
    /// Keep the data fresh and print the latest production after each refresh
    Watch {
        /// Exit after this many successful refreshes
        #[arg(long, value_name = "N")]
        count: Option<u64>,
    },
    /// Production totals over trailing windows, with efficiency per kW
    Metrics {
        /// Evaluate windows as of this date instead of today
        #[arg(long, value_name = "DATE")]
        today: Option<String>,
    },
    /// Sites whose most recent days produced nothing
    Alerts,
    /// List manufacturers and their sites
    Sites,
}
