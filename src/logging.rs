/// Logging setup
/// tracing-subscriber with an env-driven filter (RUST_LOG, default: info)

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber, e.g. `RUST_LOG=workforce_planner=debug`
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// Verbose subscriber for tests; safe to call more than once
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
