//! Tracing subscriber setup shared by the service binaries

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::env::{string_or, Lookup};

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line, for log aggregation
    #[default]
    Json,
    /// Human-readable text
    Text,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" | "pretty" | "plain" => Ok(LogFormat::Text),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub format: LogFormat,
    /// Default filter directive; `RUST_LOG` takes precedence
    pub filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            filter: "info".into(),
        }
    }
}

impl TelemetryConfig {
    /// Read `LOG_FORMAT` and `LOG_LEVEL`, falling back to JSON at info
    pub fn from_lookup(env: &impl Lookup) -> Self {
        let defaults = Self::default();
        let format = env
            .get("LOG_FORMAT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.format);
        let filter = string_or(env, "LOG_LEVEL", &defaults.filter);

        Self { format, filter }
    }
}

/// Install the global subscriber
///
/// Call once at startup. Returns an error if a subscriber is already set.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_target(true).with_current_span(false))
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("TEXT".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_config_from_lookup() {
        let env: HashMap<&str, &str> = [("LOG_FORMAT", "text"), ("LOG_LEVEL", "debug")]
            .into_iter()
            .collect();
        let config = TelemetryConfig::from_lookup(&env);
        assert_eq!(config.format, LogFormat::Text);
        assert_eq!(config.filter, "debug");

        let config = TelemetryConfig::from_lookup(&HashMap::<&str, &str>::new());
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.filter, "info");
    }
}
