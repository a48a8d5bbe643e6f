//! Structured logging setup.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! embedding application's call. [`init_tracing`] is a convenience for
//! binaries and tests that want the engine's logs on stderr.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "u_carbon_schedule=info";

/// Installs an fmt subscriber filtered by `RUST_LOG` (falling back to
/// [`DEFAULT_FILTER`]). Does nothing if a global subscriber already exists.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    install(filter);
}

/// Installs an fmt subscriber with an explicit filter directive, e.g.
/// `"u_carbon_schedule::scheduler=debug"`.
pub fn init_tracing_with(directive: &str) {
    install(EnvFilter::new(directive));
}

fn install(filter: EnvFilter) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
