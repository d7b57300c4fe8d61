//! Tracing subscriber setup.

use autoupdate_core::config::{LogFormat, LogLevel};
use tracing_subscriber::EnvFilter;

/// Log filter: `RUST_LOG` when set, otherwise `level` for every target.
pub fn filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()))
}

/// Install the global subscriber.
pub fn init(level: LogLevel, format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_target(false);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
