//! Configuration schema types.
//!
//! This module defines the structure of every configuration section.

use serde::{Deserialize, Serialize};

/// Server configuration section.
///
/// Controls the HTTP listener, per-request limits, and shutdown behavior.
///
/// # Example
///
/// ```
/// use bulwark_config::ServerConfig;
///
/// let config = ServerConfig {
///     http_addr: "127.0.0.1:3000".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(config.request_timeout_secs, 30);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP server bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Per-request timeout in seconds. Elapsing yields 504.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Maximum accepted request body in bytes.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Reserved; the listener only speaks HTTP/1.1.
    #[serde(default)]
    pub http2_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            request_timeout_secs: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            max_body_size: default_max_body_size(),
            http2_enabled: false,
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_max_body_size() -> usize {
    1024 * 1024
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,

    /// Include the event target (module path).
    #[serde(default = "default_true")]
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
            include_target: true,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Enable the Prometheus exporter.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Prometheus scrape endpoint address.
    #[serde(default = "default_metrics_addr")]
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: default_metrics_addr(),
        }
    }
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}

/// Versions of one browser vendor that are refused.
///
/// Each entry of `versions` is an exact version (`"3.6"`), an inclusive upper
/// bound (`"<=3.6"`), or a whole major line (`"57.x"`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BrowserRuleConfig {
    /// Browser vendor name, matched case-insensitively.
    pub vendor: String,

    /// Version predicates for this vendor.
    #[serde(default)]
    pub versions: Vec<String>,
}

/// Access-control section: who may reach the application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AccessConfig {
    /// Client addresses allowed through the IP check.
    #[serde(default = "default_allowed_ips")]
    pub allowed_ips: Vec<String>,

    /// Browsers refused by the browser check.
    #[serde(default)]
    pub invalid_browsers: Vec<BrowserRuleConfig>,

    /// Overrides whether fault responses carry the failure description.
    /// Unset means "derive from the environment".
    #[serde(default)]
    pub expose_fault_details: Option<bool>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            allowed_ips: default_allowed_ips(),
            invalid_browsers: Vec::new(),
            expose_fault_details: None,
        }
    }
}

fn default_allowed_ips() -> Vec<String> {
    vec!["127.0.0.1".to_string()]
}

/// Support details quoted in rejection responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SupportConfig {
    /// Support contact address.
    #[serde(default = "default_contact")]
    pub contact: String,

    /// Documentation for the IP access policy.
    #[serde(default = "default_access_policy_url")]
    pub access_policy_url: String,

    /// Documentation for supported browsers.
    #[serde(default = "default_browser_support_url")]
    pub browser_support_url: String,

    /// Browsers suggested to rejected clients.
    #[serde(default = "default_alternative_browsers")]
    pub alternative_browsers: Vec<String>,
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            contact: default_contact(),
            access_policy_url: default_access_policy_url(),
            browser_support_url: default_browser_support_url(),
            alternative_browsers: default_alternative_browsers(),
        }
    }
}

fn default_contact() -> String {
    "support@example.com".to_string()
}

fn default_access_policy_url() -> String {
    "https://example.com/access-policy".to_string()
}

fn default_browser_support_url() -> String {
    "https://example.com/browser-support".to_string()
}

fn default_alternative_browsers() -> Vec<String> {
    ["Google Chrome", "Microsoft Edge", "Safari", "Brave"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_true() -> bool {
    true
}
