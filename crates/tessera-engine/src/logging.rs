//! Tracing subscriber setup.
//!
//! Libraries in this workspace only emit `tracing` events; binaries and
//! tests call [`init_tracing`] once to print them. `RUST_LOG` overrides the
//! default filter.

use tracing_subscriber::EnvFilter;

/// Install a formatting subscriber filtered by `RUST_LOG`, falling back to
/// `info`.
///
/// Returns `false` if a global subscriber was already set, which makes
/// repeated calls harmless.
pub fn init_tracing() -> bool {
    init_tracing_with("info")
}

/// Like [`init_tracing`] with a caller-chosen fallback filter such as
/// `"tessera_world=debug,warn"`.
pub fn init_tracing_with(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
