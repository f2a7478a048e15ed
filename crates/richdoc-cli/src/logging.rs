use richdoc_config::LogLevel;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter directive from `-v`/`-q` flags over the configured level.
pub fn effective_level(verbose: u8, quiet: bool, configured: LogLevel) -> LogLevel {
    if quiet {
        LogLevel::Error
    } else if verbose > 0 {
        LogLevel::Warn.raised(verbose).max(configured)
    } else {
        configured
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over everything else.
pub fn init(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
