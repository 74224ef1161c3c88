//! Tracing subscriber installation.
//!
//! Commands are logged by verb only. `USE` may carry a device password and
//! `LICENSE SERVER` a license key, so full command lines never reach a log.

use tracing_subscriber::EnvFilter;
use vhctl_config::LoggingConfig;

/// Build the filter for `config`. `RUST_LOG`, when set and valid, wins.
pub fn filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install a global `fmt` subscriber.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case the existing one is left in place.
pub fn init(config: &LoggingConfig) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter(config))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig::default();
        // Another test may have installed a subscriber first, so only the
        // second call's result is certain.
        init(&config);
        assert!(!init(&config));
    }

    #[test]
    fn test_filter_uses_configured_level() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig {
            level: "debug".to_string(),
        };
        assert_eq!(filter(&config).to_string(), "debug");
    }
}
