//! Structured tracing setup.
//!
//! Logging is controlled by the `RUST_LOG` environment variable and defaults
//! to `warn`. Phase-level progress logs at `info`, per-test detail at
//! `debug`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// # Panics
///
/// Panics if a subscriber is already installed (call once, from `main`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Initialize tracing with an explicit filter string, for tests and
/// programmatic embedding.
pub fn init_tracing_with_filter(filter: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::new(filter))
        .init();
}
