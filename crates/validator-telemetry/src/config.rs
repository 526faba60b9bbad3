//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for structured logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name for logs and metrics.
    pub service_name: String,

    /// Component identifier (e.g. "session-manager", "coordinator").
    pub component: String,

    /// Log level filter (trace, debug, info, warn, error).
    pub log_level: String,

    /// Whether to enable console output (for development).
    pub console_output: bool,

    /// Whether to enable JSON formatted logs.
    pub json_logs: bool,

    /// Prometheus metrics port.
    pub metrics_port: u16,

    /// Host-ledger network identifier (testnet, mainnet, devnet).
    pub network: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "universal-validator".to_string(),
            component: "node".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics_port: 9100,
            network: "testnet".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `UV_SERVICE_NAME`: Service name (default: universal-validator)
    /// - `UV_COMPONENT`: Component name (default: node)
    /// - `UV_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `UV_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `UV_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `UV_METRICS_PORT`: Prometheus metrics port (default: 9100)
    /// - `UV_NETWORK`: Host-ledger network name (default: testnet)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("UV_SERVICE_NAME")
                .unwrap_or_else(|_| "universal-validator".to_string()),

            component: env::var("UV_COMPONENT").unwrap_or_else(|_| "node".to_string()),

            log_level: env::var("UV_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("UV_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: env::var("UV_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            metrics_port: env::var("UV_METRICS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(9100),

            network: env::var("UV_NETWORK").unwrap_or_else(|_| "testnet".to_string()),
        }
    }

    /// Create configuration for a specific component.
    pub fn for_component(component: &str) -> Self {
        let mut config = Self::from_env();
        config.component = component.to_string();
        config
    }

    /// Get the full service name including component.
    pub fn full_service_name(&self) -> String {
        if self.component == "node" {
            self.service_name.clone()
        } else {
            format!("{}-{}", self.service_name, self.component)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "universal-validator");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.metrics_port, 9100);
    }

    #[test]
    fn test_for_component() {
        let config = TelemetryConfig::for_component("coordinator");
        assert_eq!(config.component, "coordinator");
    }

    #[test]
    fn test_full_service_name() {
        let mut config = TelemetryConfig::default();
        assert_eq!(config.full_service_name(), "universal-validator");

        config.component = "coordinator".to_string();
        assert_eq!(config.full_service_name(), "universal-validator-coordinator");
    }
}
