//! Diagnostic logging setup.

use tracing_subscriber::EnvFilter;

use crate::config::ENV_LOG;

/// Install the global fmt subscriber
///
/// The filter comes from `ECOSYSTEM_LOG`, then `RUST_LOG`, defaulting to
/// `info`. Calling it again is a no-op.
pub fn init() {
    let filter = std::env::var(ENV_LOG)
        .ok()
        .and_then(|s| EnvFilter::try_new(s).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
