//! # Bulwark
//!
//! **Access-control front door for HTTP services**
//!
//! Bulwark places an ordered middleware pipeline in front of a service:
//!
//! - **IP allow-list** – requests from unlisted addresses get 403
//! - **Browser rules** – refused vendor/version combinations get 400
//! - **Environment-driven order** – Development skips both checks
//! - **Error boundary** – faults become a 500 envelope
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bulwark::config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().with_file("bulwark.toml")?.load()?;
//!     bulwark::init_telemetry(&config)?;
//!     bulwark::build_server(&config)?.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → ErrorBoundary → Finalization → IpCheck → BrowserCheck
//!                                                         ↓
//!           Content ← BrowserShortCircuit ← IpShortCircuit
//!              ↓ (/api paths)
//!           RestApi
//! ```

#![doc(html_root_url = "https://docs.rs/bulwark/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use bulwark_config::{BulwarkConfig, ConfigError, LogFormat};
use bulwark_middleware::{Pipeline, PipelineSettings, SupportInfo};
use bulwark_server::{RestApi, Server, ServerConfig};
use bulwark_telemetry::{LogConfig, MetricsConfig, TelemetryConfig};
use std::time::Duration;

pub use bulwark_config as config;
pub use bulwark_core as core;
pub use bulwark_middleware as middleware;
pub use bulwark_server as server;
pub use bulwark_telemetry as telemetry;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service name reported by logs.
pub const SERVICE_NAME: &str = "bulwark";

/// Maps the logging and metrics sections onto telemetry settings.
#[must_use]
pub fn telemetry_config(config: &BulwarkConfig) -> TelemetryConfig {
    let logging = LogConfig {
        level: config.logging.level.clone(),
        json_format: config.logging.format == LogFormat::Json,
        file_line_info: config.logging.include_location,
        include_target: config.logging.include_target,
        service_name: SERVICE_NAME.to_string(),
        ..LogConfig::default()
    };
    let metrics = MetricsConfig {
        enabled: config.metrics.enabled,
        addr: config.metrics.addr.clone(),
        ..MetricsConfig::default()
    };

    TelemetryConfig::builder()
        .service_name(SERVICE_NAME)
        .logging(logging)
        .metrics(metrics)
        .build()
}

/// Installs logging and metrics from `config`.
///
/// Must be called from within a Tokio runtime when metrics are enabled.
///
/// # Errors
///
/// Fails if a subscriber or recorder is already installed, or the metrics
/// address is invalid.
pub fn init_telemetry(config: &BulwarkConfig) -> anyhow::Result<()> {
    bulwark_telemetry::init_telemetry(&telemetry_config(config))?;
    Ok(())
}

/// Builds pipeline settings from the environment, fault exposure and support
/// sections.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` for an unknown environment name.
pub fn pipeline_settings(config: &BulwarkConfig) -> Result<PipelineSettings, ConfigError> {
    let environment = config.environment()?;
    let support = SupportInfo {
        contact: config.support.contact.clone(),
        access_policy_url: config.support.access_policy_url.clone(),
        browser_support_url: config.support.browser_support_url.clone(),
        alternative_browsers: config.support.alternative_browsers.clone(),
    };

    Ok(PipelineSettings::new(environment)
        .expose_fault_details(config.expose_fault_details(environment))
        .support(support))
}

/// Builds the pipeline for the configured environment, ending in [`RestApi`].
///
/// # Errors
///
/// See [`pipeline_settings`].
pub fn build_pipeline(config: &BulwarkConfig) -> Result<Pipeline, ConfigError> {
    let settings = pipeline_settings(config)?;
    let policy = config.access_policy();
    tracing::info!(
        environment = %settings.environment,
        allowed_addresses = policy.allow_list().len(),
        browser_rules = policy.browser_rules().len(),
        "Access policy loaded"
    );
    Ok(Pipeline::for_environment(
        policy.clone(),
        settings,
        RestApi::new(policy),
    ))
}

/// Maps the server section onto listener settings.
#[must_use]
pub fn server_config(config: &BulwarkConfig) -> ServerConfig {
    ServerConfig::builder()
        .http_addr(config.server.http_addr.clone())
        .request_timeout(Duration::from_secs(config.server.request_timeout_secs))
        .shutdown_timeout(Duration::from_secs(config.server.shutdown_timeout_secs))
        .max_body_size(config.server.max_body_size)
        .http2_enabled(config.server.http2_enabled)
        .build()
}

/// Builds a ready-to-run server from `config`.
///
/// # Errors
///
/// See [`pipeline_settings`].
pub fn build_server(config: &BulwarkConfig) -> Result<Server, ConfigError> {
    Ok(Server::new(server_config(config), build_pipeline(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulwark_config::{AccessConfig, BrowserRuleConfig};
    use bulwark_core::Environment;

    #[test]
    fn test_telemetry_config_mapping() {
        let config = BulwarkConfig::development();
        let telemetry = telemetry_config(&config);

        assert_eq!(telemetry.service_name, SERVICE_NAME);
        assert_eq!(telemetry.logging.level, "debug");
        assert!(!telemetry.logging.json_format);
        assert!(telemetry.logging.file_line_info);
        assert_eq!(telemetry.metrics.addr, config.metrics.addr);
    }

    #[test]
    fn test_production_settings_hide_fault_details() {
        let settings = pipeline_settings(&BulwarkConfig::production()).unwrap();
        assert_eq!(settings.environment, Environment::Production);
        assert!(!settings.expose_fault_details);
    }

    #[test]
    fn test_support_section_reaches_settings() {
        let mut config = BulwarkConfig::default();
        config.support.contact = "help@corp.example".to_string();

        let settings = pipeline_settings(&config).unwrap();
        assert_eq!(settings.support.contact, "help@corp.example");
    }

    #[test]
    fn test_unknown_environment_is_rejected() {
        let mut config = BulwarkConfig::default();
        config.environment = "Moon".to_string();
        assert!(pipeline_settings(&config).is_err());
        assert!(build_pipeline(&config).is_err());
    }

    #[test]
    fn test_pipeline_order_follows_environment() {
        let development = build_pipeline(&BulwarkConfig::development()).unwrap();
        assert_eq!(development.stage_count(), 2);

        let config = BulwarkConfig::builder()
            .environment(Environment::Staging)
            .access(AccessConfig {
                allowed_ips: vec!["10.0.0.1".to_string()],
                invalid_browsers: vec![BrowserRuleConfig {
                    vendor: "Firefox".to_string(),
                    versions: vec!["<=3.6".to_string()],
                }],
                expose_fault_details: None,
            })
            .build();
        assert_eq!(build_pipeline(&config).unwrap().stage_count(), 7);
    }

    #[test]
    fn test_server_config_mapping() {
        let mut config = BulwarkConfig::default();
        config.server.http_addr = "127.0.0.1:9999".to_string();
        config.server.request_timeout_secs = 3;
        config.server.http2_enabled = true;

        let server = server_config(&config);
        assert_eq!(server.http_addr(), "127.0.0.1:9999");
        assert_eq!(server.request_timeout(), Duration::from_secs(3));
        assert!(server.http2_enabled());
    }
}
