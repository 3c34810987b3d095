//! Observability for Bulwark.
//!
//! - **Logging**: structured JSON or pretty output through `tracing-subscriber`
//! - **Metrics**: Prometheus-format metrics via the `metrics` crate
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `bulwark_requests_total` | Counter | `status` | Total request count |
//! | `bulwark_request_duration_seconds` | Histogram | - | Request latency |
//! | `bulwark_in_flight_requests` | Gauge | - | Currently processing requests |
//! | `bulwark_rejections_total` | Counter | `reason` | `ip_blocked` or `browser_unsupported` |
//! | `bulwark_faults_total` | Counter | `code` | Faults answered with 500 |
//!
//! # Example
//!
//! ```rust,ignore
//! use bulwark_telemetry::{TelemetryConfig, init_telemetry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TelemetryConfig::builder()
//!         .service_name("bulwark")
//!         .metrics_addr("0.0.0.0:9090")
//!         .build();
//!
//!     init_telemetry(&config).expect("Failed to init telemetry");
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, record_request, render_metrics, InFlightGuard, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// Must be called from within a Tokio runtime when metrics are enabled.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_with_everything_disabled() {
        let config = TelemetryConfig::builder()
            .logging(LogConfig {
                enabled: false,
                ..Default::default()
            })
            .without_metrics()
            .build();

        assert!(init_telemetry(&config).is_ok());
    }
}
