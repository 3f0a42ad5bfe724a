//! # Logging
//!
//! Structured logging via `tracing`.
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - Show debug messages
//! - `RUST_LOG=numo_runtime=trace` - Trace the dispatch loop only
//! - Default: `info`, with `debug` for Numo crates

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
const DEFAULT_FILTER: &str = "info,numo=debug";

/// Initializes the global tracing subscriber.
///
/// Returns `false` if a subscriber was already installed; calling this more
/// than once is harmless.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        assert!(!init_tracing());
        tracing::info!("tracing initialised twice without panicking");
    }
}
