//! tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "idlebattle=info";

/// Log to stderr. `RUST_LOG` overrides `default_filter`. Safe to call more
/// than once; later calls are ignored.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
