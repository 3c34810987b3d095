//! Prometheus metrics for Bulwark.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `bulwark_requests_total` | Counter | `status` | Total requests |
//! | `bulwark_request_duration_seconds` | Histogram | - | Request latency |
//! | `bulwark_in_flight_requests` | Gauge | - | In-flight requests |
//! | `bulwark_rejections_total` | Counter | `reason` | Short-circuited requests |
//! | `bulwark_faults_total` | Counter | `code` | Faults caught by the error boundary |
//!
//! Recording without an installed recorder is a no-op, so the helpers are
//! safe to call from tests.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

/// Metric names.
pub mod names {
    /// Total requests, labelled by `status`.
    pub const REQUESTS_TOTAL: &str = "bulwark_requests_total";
    /// Request latency histogram.
    pub const REQUEST_DURATION_SECONDS: &str = "bulwark_request_duration_seconds";
    /// Requests currently in flight.
    pub const IN_FLIGHT_REQUESTS: &str = "bulwark_in_flight_requests";
    /// Rejections, labelled by `reason`.
    pub const REJECTIONS_TOTAL: &str = "bulwark_rejections_total";
    /// Faults, labelled by `code`.
    pub const FAULTS_TOTAL: &str = "bulwark_faults_total";
}

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Address to expose metrics on (e.g., "0.0.0.0:9090").
    pub addr: String,

    /// Histogram buckets for request duration.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: "0.0.0.0:9090".to_string(),
            // 1ms .. 10s
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

/// Installs the Prometheus recorder and spawns its scrape listener.
///
/// Must be called from within a Tokio runtime.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for an unparsable address and
/// `TelemetryError::MetricsInit` if the exporter cannot be built or a
/// recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;

    let (recorder, exporter) = PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Full(names::REQUEST_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .build()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let handle = recorder.handle();
    metrics::set_global_recorder(recorder)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    let _ = METRICS_HANDLE.set(handle);

    tokio::spawn(async move {
        if let Err(error) = exporter.await {
            tracing::error!(error = ?error, "Prometheus exporter stopped");
        }
    });

    register_metric_descriptions();
    tracing::info!(addr = %addr, "Metrics exporter listening");

    Ok(())
}

/// Returns the global metrics handle if initialized.
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Renders metrics in Prometheus format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(
        names::REQUESTS_TOTAL,
        "Total number of HTTP requests processed"
    );
    describe_histogram!(
        names::REQUEST_DURATION_SECONDS,
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        names::IN_FLIGHT_REQUESTS,
        "Number of HTTP requests currently being processed"
    );
    describe_counter!(
        names::REJECTIONS_TOTAL,
        "Requests short-circuited by access control, by reason"
    );
    describe_counter!(
        names::FAULTS_TOTAL,
        "Pipeline faults converted to 500 responses, by code"
    );
}

/// Records a completed request.
///
/// Updates `bulwark_requests_total` and `bulwark_request_duration_seconds`.
pub fn record_request(status_code: u16, duration: Duration) {
    counter!(names::REQUESTS_TOTAL, "status" => status_code.to_string()).increment(1);
    histogram!(names::REQUEST_DURATION_SECONDS).record(duration.as_secs_f64());
}

/// Increments the in-flight requests gauge.
pub fn increment_in_flight() {
    gauge!(names::IN_FLIGHT_REQUESTS).increment(1.0);
}

/// Decrements the in-flight requests gauge.
pub fn decrement_in_flight() {
    gauge!(names::IN_FLIGHT_REQUESTS).decrement(1.0);
}

/// Guard that decrements in-flight requests on drop.
///
/// The counter is decremented even when the request future is cancelled.
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Creates a new guard and increments the in-flight counter.
    #[must_use]
    pub fn new() -> Self {
        increment_in_flight();
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        decrement_in_flight();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert_eq!(config.addr, "0.0.0.0:9090");
        assert_eq!(config.duration_buckets.len(), 12);
    }

    #[test]
    fn test_metric_names_are_prefixed() {
        for name in [
            names::REQUESTS_TOTAL,
            names::REQUEST_DURATION_SECONDS,
            names::IN_FLIGHT_REQUESTS,
            names::REJECTIONS_TOTAL,
            names::FAULTS_TOTAL,
        ] {
            assert!(name.starts_with("bulwark_"), "{name}");
        }
    }

    #[test]
    fn test_in_flight_guard() {
        let guard = InFlightGuard::new();
        drop(guard);
    }

    #[test]
    fn test_record_request_without_recorder() {
        record_request(200, Duration::from_millis(10));
        record_request(403, Duration::from_millis(1));
    }

    #[test]
    fn test_disabled_metrics_skip_install() {
        let config = MetricsConfig {
            enabled: false,
            addr: "not an address".to_string(),
            ..Default::default()
        };
        assert!(init_metrics(&config).is_ok());
    }

    #[test]
    fn test_invalid_address() {
        let config = MetricsConfig {
            addr: "nowhere".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            init_metrics(&config),
            Err(TelemetryError::InvalidAddress(_))
        ));
    }
}
