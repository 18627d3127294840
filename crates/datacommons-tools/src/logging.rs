//! Subscriber setup for binaries and tests that use this crate.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a global `tracing` subscriber that prints to stderr.
///
/// The filter comes from `RUST_LOG`, falling back to `default_filter`
/// (e.g. `"datacommons_tools=info"`). Records emitted through the `log`
/// facade are forwarded to the same subscriber. Returns false when a
/// subscriber was already installed.
pub fn init_logging(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .is_ok();
    if !installed {
        return false;
    }

    if let Err(e) = tracing_log::LogTracer::init() {
        tracing::debug!("log records are not forwarded: {}", e);
    }
    true
}
