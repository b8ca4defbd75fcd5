//! Log setup for the command-line tool.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! binary's job.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "warn";

/// Filter from `--log-level`, else `RUST_LOG`, else `warn`.
pub fn log_filter(log_level: Option<&str>) -> EnvFilter {
    match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    }
}

/// Install a stderr subscriber.
///
/// A subscriber that is already installed (tests, embedding programs) is
/// left in place.
pub fn init_logging(log_level: Option<&str>, no_color: bool) {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(!no_color)
        .with_filter(log_filter(log_level));

    // Err only when a global subscriber is already set
    let _ = tracing_subscriber::registry().with(stderr_layer).try_init();
}
