//! Typed configuration for Bulwark.
//!
//! This crate provides a strongly-typed configuration system with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Overview
//!
//! [`BulwarkConfig`] holds every setting a Bulwark process needs:
//!
//! - `environment` - selects the pipeline order (Development, Staging, Production)
//! - [`ServerConfig`] - listener address, timeouts, body limit
//! - [`LoggingConfig`] - level and output format
//! - [`MetricsConfig`] - Prometheus exporter
//! - [`AccessConfig`] - IP allow-list and refused browsers
//! - [`SupportConfig`] - contact details quoted in rejections
//!
//! # Example
//!
//! ```no_run
//! use bulwark_config::ConfigLoader;
//!
//! # fn main() -> Result<(), bulwark_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("bulwark.toml")?
//!     .with_env_prefix("BULWARK")
//!     .load()?;
//!
//! let policy = config.access_policy();
//! println!("{} allowed addresses", policy.allow_list().len());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! environment = "Production"
//!
//! [server]
//! http_addr = "0.0.0.0:8080"
//! request_timeout_secs = 30
//! shutdown_timeout_secs = 30
//! max_body_size = 1048576
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = true
//! addr = "0.0.0.0:9090"
//!
//! [access]
//! allowed_ips = ["127.0.0.1", "192.168.1.10"]
//!
//! [[access.invalid_browsers]]
//! vendor = "Firefox"
//! versions = ["<=3.6", "57.x"]
//!
//! [support]
//! contact = "support@example.com"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden via environment variables using the format
//! `PREFIX__SECTION__KEY`. List values are comma-separated:
//!
//! - `BULWARK__ENVIRONMENT=Staging`
//! - `BULWARK__SERVER__HTTP_ADDR=0.0.0.0:9000`
//! - `BULWARK__ACCESS__ALLOWED_IPS=10.0.0.1,10.0.0.2`
//! - `BULWARK__METRICS__ENABLED=false`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::*;
