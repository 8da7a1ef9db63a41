//! Tracing subscriber setup
//!
//! The library itself only emits `tracing` events: `debug` for registry and
//! data source mutations, `warn` for skipped predicates and misuse. Binaries
//! and tests install a subscriber with [`init_tracing`].

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_DIRECTIVE: &str = "this_filters=info";

/// Install a formatting subscriber honouring `RUST_LOG`
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    // A subscriber installed earlier (another test, the host binary) wins
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
