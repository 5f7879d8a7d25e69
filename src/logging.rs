//! Log output setup.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` fmt subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter` when set. Calling this
/// more than once, or after another subscriber was installed, is a no-op.
///
/// # Examples
///
/// ```
/// taskdeck::init_logging("taskdeck=debug");
/// taskdeck::init_logging("taskdeck=info");
/// ```
pub fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(default_filter, "logging initialized");
    }
}
