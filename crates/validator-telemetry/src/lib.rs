//! # Validator Telemetry
//!
//! Structured logging and Prometheus metrics for the validator node.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use validator_telemetry::{TelemetryConfig, init_telemetry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(config).expect("failed to init telemetry");
//!
//!     // Your application code here
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `UV_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `UV_JSON_LOGS` | `false` outside containers | Emit JSON-formatted logs |
//! | `UV_METRICS_PORT` | `9100` | Prometheus metrics port |
//! | `UV_COMPONENT` | `node` | Component identifier in logs/metrics |

#![warn(missing_docs)]
#![allow(missing_docs)] // TODO: document the remaining public macros

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::StructuredLogger;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, CHAIN_DB_ROWS_DELETED, COMPONENT_ERRORS,
    COORDINATOR_ELECTED_SELF, COORDINATOR_ELECTIONS, EVENTS_PENDING, EVENT_STATUS_TRANSITIONS,
    OUTBOUND_RESOLUTION_DURATION, OUTBOUND_RESOLVED, PEER_MESSAGES_RECEIVED, PEER_MESSAGES_SENT,
    SESSIONS_ACTIVE, SESSIONS_FINISHED, SESSIONS_STARTED, SESSION_DURATION, SWEEPER_PASSES,
    SWEEPER_REVERTS, VERIFIER_DECISIONS,
};

use thiserror::Error;

/// Telemetry initialization errors.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The tracing subscriber or its env filter could not be built.
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    /// The Prometheus registry could not be populated.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// The supplied `TelemetryConfig` was invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize structured logging and metrics registration.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    let logging_handle = logging::init_logging(&config)?;

    Ok(TelemetryGuard {
        _logging: logging_handle,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active. Drop to shut down cleanly.
pub struct TelemetryGuard {
    _logging: StructuredLogger,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("shutting down telemetry");
    }
}

/// Convenience macro for creating a span tagged with the originating component.
#[macro_export]
macro_rules! component_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Convenience macro for recording a metric with a value.
#[macro_export]
macro_rules! metric_observe {
    ($metric:expr, $value:expr) => {
        $metric.observe($value)
    };
    ($metric:expr, $labels:expr, $value:expr) => {
        $metric.with_label_values($labels).observe($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "universal-validator");
    }
}
