//! Telemetry configuration from environment variables.

use std::env;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Filter directive (trace, debug, info, warn, error, or `EnvFilter` syntax)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Whether to include the event target (module path)
    pub with_targets: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            with_targets: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ETHER_BUS_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `ETHER_BUS_JSON_LOGS`: Enable JSON logs (default: false)
    /// - `ETHER_BUS_LOG_TARGETS`: Include targets (default: true)
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("ETHER_BUS_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("ETHER_BUS_JSON_LOGS")
                .map(|v| parse_bool(&v))
                .unwrap_or(false),

            with_targets: env::var("ETHER_BUS_LOG_TARGETS")
                .map(|v| parse_bool(&v))
                .unwrap_or(true),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
