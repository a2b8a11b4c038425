use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset. Store internals log at `debug`
/// so backend failures can be traced without a restart.
pub const DEFAULT_FILTER: &str = "info,service::storage=debug,tower_http=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json { LogFormat::Json } else { LogFormat::Compact }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber, writing to stdout.
///
/// Returns `false` when a subscriber was already installed (tests, embedding).
pub fn init_logging(format: LogFormat) -> bool {
    let builder = fmt().with_env_filter(env_filter()).with_writer(io::stdout);
    match format {
        LogFormat::Compact => builder.with_target(false).compact().try_init().is_ok(),
        LogFormat::Json => builder.with_target(true).json().try_init().is_ok(),
    }
}
