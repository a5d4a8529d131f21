//! Tracing setup for binaries and integration tests
//!
//! Library code only emits `tracing` events; whoever owns `main` decides
//! where they go. `RUST_LOG` always wins over the defaults below.
//!
//!   RUST_LOG=simple_mongo=trace   # driver command events
//!   RUST_LOG=simple_sqls=debug    # rendered SQL

use tracing_subscriber::EnvFilter;

/// Tracing configuration options
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Default to `debug` instead of `info` when RUST_LOG is unset
    pub debug: bool,
}

/// Initialize compact console tracing.
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(
    config: &TracingConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = if config.debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.debug)
        .compact()
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_fails() {
        let config = TracingConfig { debug: true };
        // The first call may race other tests installing a subscriber, the
        // second one can never succeed.
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}
