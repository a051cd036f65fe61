pub mod metrics;

pub use metrics::{ExecutionMetrics, MetricsSnapshot};

use crate::config::ObservabilityConfig;
use crate::error::ConfigError;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Parse a configured log level (`trace|debug|info|warn|error`, any case).
pub fn parse_level(raw: &str) -> Result<Level, ConfigError> {
    raw.trim().parse::<Level>().map_err(|_| {
        ConfigError::Validation(format!(
            "observability.log_level must be one of trace, debug, info, warn, error, got '{raw}'"
        ))
    })
}

/// Install the global fmt subscriber. Fails if the level is unknown or a
/// subscriber is already installed.
pub fn init_tracing(config: &ObservabilityConfig) -> anyhow::Result<()> {
    let level = parse_level(&config.log_level)?;
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_level_is_case_insensitive() {
        assert_eq!(parse_level("DEBUG").unwrap(), Level::DEBUG);
        assert_eq!(parse_level(" warn ").unwrap(), Level::WARN);
    }

    #[test]
    fn parse_level_rejects_unknown() {
        let err = parse_level("chatty").unwrap_err();
        assert!(err.to_string().contains("chatty"));
    }

    #[test]
    fn init_tracing_rejects_bad_level_before_installing() {
        let config = ObservabilityConfig {
            log_level: "verbose".into(),
        };
        assert!(init_tracing(&config).is_err());
    }
}
