//! Logging setup for programs built on pty-driver.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! application's call. [`init_logging`] is the quick way to get them on
//! standard error.

use tracing_subscriber::EnvFilter;

/// Variable read first for the filter directive.
pub const LOG_ENV: &str = "PTY_DRIVER_LOG";

/// Filter used when neither variable is set or parseable.
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Output format for [`init_logging`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// The filter directive from `PTY_DRIVER_LOG`, then `RUST_LOG`, then `warn`.
#[must_use]
pub fn filter_directive() -> String {
    std::env::var(LOG_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| DEFAULT_DIRECTIVE.to_string())
}

/// Build an [`EnvFilter`] from `directive`, falling back to `warn` when it
/// does not parse.
#[must_use]
pub fn log_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install a global subscriber writing to standard error.
///
/// Returns `false` if a subscriber was already installed, in which case the
/// existing one is left alone.
///
/// Enable `pty_driver::wire=debug` to see every byte sent and received.
pub fn init_logging(format: LogFormat) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(log_filter(&filter_directive()))
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    }
}
