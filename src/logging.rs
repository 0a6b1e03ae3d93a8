//! Subscriber setup for the binaries. The library itself only emits `tracing` events.

use tracing_subscriber::EnvFilter;

/// Maps `-v` occurrences to a default filter.
pub const fn verbosity_to_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Installs a stderr formatter. `RUST_LOG` wins over `verbosity` when it is set.
pub fn init(verbosity: u8) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(verbosity_to_filter(verbosity))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
