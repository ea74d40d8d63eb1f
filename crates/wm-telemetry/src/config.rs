//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to log lines
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error or a full directive)
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "wallet-mediator".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// - `WM_SERVICE_NAME`: Service name (default: wallet-mediator)
    /// - `WM_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `WM_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `WM_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    pub fn from_env() -> Self {
        let is_container = env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("WM_SERVICE_NAME")
                .unwrap_or_else(|_| "wallet-mediator".to_string()),

            log_level: env::var("WM_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("WM_CONSOLE_OUTPUT")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),

            json_logs: env::var("WM_JSON_LOGS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(is_container),
        }
    }

    /// Override the log level, keeping everything else.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}
