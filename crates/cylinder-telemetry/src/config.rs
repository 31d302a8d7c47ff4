//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for log output.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name stamped on every span
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error, or a full
    /// `EnvFilter` directive)
    pub log_level: String,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Whether to include thread ids (useful with many rank tasks)
    pub thread_ids: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "cylinders".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            thread_ids: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CY_SERVICE_NAME`: Service name (default: cylinders)
    /// - `CY_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `CY_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    /// - `CY_THREAD_IDS`: Include thread ids (default: false)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("CY_SERVICE_NAME").unwrap_or_else(|_| "cylinders".to_string()),

            log_level: env::var("CY_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("CY_JSON_LOGS")
                .map(|v| flag(&v))
                .unwrap_or(is_container),

            thread_ids: env::var("CY_THREAD_IDS").map(|v| flag(&v)).unwrap_or(false),
        }
    }
}

/// `true`/`1`/`yes`, case-insensitive.
pub fn flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}
