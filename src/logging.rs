//! Tracing setup
//!
//! Events go to stderr so stdout stays clean for JSON and CSV.

use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

const DEFAULT_LEVEL: &str = "warn";
const DEBUG_LEVEL: &str = "solarview=debug";

pub(crate) struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogHandle {
    /// Raise verbosity once the config asks for it; `RUST_LOG` still wins
    pub(crate) fn enable_debug(&self) {
        if self.from_env {
            return;
        }
        if let Err(e) = self
            .filter
            .modify(|filter| *filter = EnvFilter::new(DEBUG_LEVEL))
        {
            eprintln!("Warning: failed to raise log level: {e}");
        }
    }
}

/// Install the global subscriber. Level comes from `RUST_LOG`, then `debug`,
/// then defaults to warnings only.
pub(crate) fn init_logging(debug: bool) -> LogHandle {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) if debug => (EnvFilter::new(DEBUG_LEVEL), false),
        Err(_) => (EnvFilter::new(DEFAULT_LEVEL), false),
    };
    let (filter, handle) = reload::Layer::new(filter);

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
    if let Err(e) = installed {
        eprintln!("Warning: logging already initialized: {e}");
    }

    LogHandle {
        filter: handle,
        from_env,
    }
}
