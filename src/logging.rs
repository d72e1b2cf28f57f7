//! Tracing setup for binaries and tests embedding the renderer.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*, util::SubscriberInitExt};

const TRACING_PREFIX: &str = "[singultus]";

static TRACING_INSTALLED: Once = Once::new();

/// Installs a formatted `tracing` subscriber filtered by `RUST_LOG`
/// (`info` when unset).
///
/// Only the first call has an effect. If another global subscriber is
/// already set, a note is printed to stderr and the existing one stays.
pub fn init_tracing() {
    TRACING_INSTALLED.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let console = fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_filter(filter);

        if tracing_subscriber::registry().with(console).try_init().is_err() {
            eprintln!("{TRACING_PREFIX} tracing subscriber was already initialized");
        }
    });
}

/// Whether [`init_tracing`] has run.
#[must_use]
pub fn is_initialized() -> bool {
    TRACING_INSTALLED.is_completed()
}
