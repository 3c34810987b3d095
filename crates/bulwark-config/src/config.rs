//! Main configuration types.
//!
//! This module provides the top-level [`BulwarkConfig`] struct and its builder.

use std::net::SocketAddr;

use bulwark_core::{AccessPolicy, AllowList, BrowserRuleSet, Environment};
use serde::{Deserialize, Serialize};

use crate::{AccessConfig, ConfigError, LoggingConfig, MetricsConfig, ServerConfig, SupportConfig};

/// Complete Bulwark configuration.
///
/// This is the root configuration type that contains all configuration sections.
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use bulwark_config::BulwarkConfig;
///
/// let config = BulwarkConfig::default();
/// assert_eq!(config.environment, "Production");
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BulwarkConfig {
    /// Deployment environment name (Development, Staging, Production).
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// IP allow-list and browser rules.
    #[serde(default)]
    pub access: AccessConfig,

    /// Support details for rejection responses.
    #[serde(default)]
    pub support: SupportConfig,
}

impl Default for BulwarkConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
            access: AccessConfig::default(),
            support: SupportConfig::default(),
        }
    }
}

fn default_environment() -> String {
    Environment::Production.as_str().to_string()
}

impl BulwarkConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use bulwark_config::{BulwarkConfig, ServerConfig};
    ///
    /// let config = BulwarkConfig::builder()
    ///     .server(ServerConfig {
    ///         http_addr: "127.0.0.1:3000".to_string(),
    ///         ..Default::default()
    ///     })
    ///     .build();
    ///
    /// assert_eq!(config.server.http_addr, "127.0.0.1:3000");
    /// ```
    #[must_use]
    pub fn builder() -> BulwarkConfigBuilder {
        BulwarkConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// Malformed browser version strings are not rejected here; the rule set
    /// drops them with a warning when it is built.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The environment name is not recognized
    /// - Server or metrics address is invalid
    /// - A timeout is zero
    /// - An allow-list entry is blank
    /// - A browser rule has no vendor
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.environment()?;

        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.metrics.enabled && self.metrics.addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "metrics.addr",
                format!("invalid socket address: {}", self.metrics.addr),
            ));
        }

        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_secs",
                "must be greater than zero",
            ));
        }

        if self.server.shutdown_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "server.shutdown_timeout_secs",
                "must be greater than zero",
            ));
        }

        if let Some(index) = self
            .access
            .allowed_ips
            .iter()
            .position(|entry| entry.trim().is_empty())
        {
            return Err(ConfigError::invalid_value(
                format!("access.allowed_ips[{index}]"),
                "entry is empty",
            ));
        }

        if let Some(index) = self
            .access
            .invalid_browsers
            .iter()
            .position(|rule| rule.vendor.trim().is_empty())
        {
            return Err(ConfigError::invalid_value(
                format!("access.invalid_browsers[{index}].vendor"),
                "vendor is empty",
            ));
        }

        Ok(())
    }

    /// Parsed deployment environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an unrecognized name.
    pub fn environment(&self) -> Result<Environment, ConfigError> {
        self.environment
            .parse()
            .map_err(|err: bulwark_core::UnknownEnvironment| {
                ConfigError::invalid_value("environment", err.to_string())
            })
    }

    /// Whether fault responses carry failure descriptions.
    ///
    /// The explicit `access.expose_fault_details` setting wins; otherwise
    /// every environment except Production exposes them.
    #[must_use]
    pub fn expose_fault_details(&self, environment: Environment) -> bool {
        self.access
            .expose_fault_details
            .unwrap_or_else(|| environment.exposes_fault_details())
    }

    /// Build the access policy from the `access` section.
    #[must_use]
    pub fn access_policy(&self) -> AccessPolicy {
        let allow_list = AllowList::new(self.access.allowed_ips.iter().map(String::as_str));
        let browser_rules = BrowserRuleSet::from_config(
            self.access
                .invalid_browsers
                .iter()
                .map(|rule| (rule.vendor.as_str(), rule.versions.clone())),
        );
        AccessPolicy::new(allow_list, browser_rules)
    }

    /// Create a development configuration preset.
    ///
    /// This preset targets local work:
    /// - Development environment (no access control stages)
    /// - Pretty log formatting with source locations
    /// - Debug log level
    ///
    /// # Example
    ///
    /// ```
    /// use bulwark_config::BulwarkConfig;
    ///
    /// let config = BulwarkConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.environment = Environment::Development.as_str().to_string();

        config.logging.level = "debug".to_string();
        config.logging.format = crate::LogFormat::Pretty;
        config.logging.include_location = true;

        config.server.http_addr = "127.0.0.1:8080".to_string();
        config.metrics.addr = "127.0.0.1:9090".to_string();

        config
    }

    /// Create a production configuration preset.
    ///
    /// This preset uses the Production environment with JSON logs at info
    /// level and hides fault details.
    ///
    /// # Example
    ///
    /// ```
    /// use bulwark_config::BulwarkConfig;
    ///
    /// let config = BulwarkConfig::production();
    /// assert_eq!(config.logging.format, bulwark_config::LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.environment = Environment::Production.as_str().to_string();

        config.logging.level = "info".to_string();
        config.logging.format = crate::LogFormat::Json;
        config.logging.include_location = false;

        config.access.expose_fault_details = Some(false);

        config
    }
}

/// Builder for [`BulwarkConfig`].
#[derive(Debug, Default)]
pub struct BulwarkConfigBuilder {
    environment: Option<Environment>,
    server: Option<ServerConfig>,
    logging: Option<LoggingConfig>,
    metrics: Option<MetricsConfig>,
    access: Option<AccessConfig>,
    support: Option<SupportConfig>,
}

impl BulwarkConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deployment environment.
    #[must_use]
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Set the server configuration.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Set the metrics configuration.
    #[must_use]
    pub fn metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Set the access configuration.
    #[must_use]
    pub fn access(mut self, access: AccessConfig) -> Self {
        self.access = Some(access);
        self
    }

    /// Set the support configuration.
    #[must_use]
    pub fn support(mut self, support: SupportConfig) -> Self {
        self.support = Some(support);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> BulwarkConfig {
        BulwarkConfig {
            environment: self
                .environment
                .map_or_else(default_environment, |env| env.as_str().to_string()),
            server: self.server.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
            metrics: self.metrics.unwrap_or_default(),
            access: self.access.unwrap_or_default(),
            support: self.support.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<BulwarkConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;
    use crate::BrowserRuleConfig;

    #[test]
    fn test_default_config() {
        let config = BulwarkConfig::default();
        assert_eq!(config.environment, "Production");
        assert_eq!(config.server.http_addr, "0.0.0.0:8080");
        assert_eq!(config.access.allowed_ips, vec!["127.0.0.1"]);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_builder_sections() {
        let config = BulwarkConfig::builder()
            .environment(Environment::Staging)
            .server(ServerConfig {
                http_addr: "127.0.0.1:3000".to_string(),
                ..Default::default()
            })
            .metrics(MetricsConfig {
                enabled: false,
                ..Default::default()
            })
            .build();

        assert_eq!(config.environment, "Staging");
        assert_eq!(config.server.http_addr, "127.0.0.1:3000");
        assert!(!config.metrics.enabled);
        // Other sections use defaults
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(BulwarkConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_environment() {
        let config = BulwarkConfig {
            environment: "Qa".to_string(),
            ..Default::default()
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("environment"));
        assert!(err.to_string().contains("Qa"));
    }

    #[test]
    fn test_validate_invalid_server_addr() {
        let config = BulwarkConfig::builder()
            .server(ServerConfig {
                http_addr: "not-an-address".to_string(),
                ..Default::default()
            })
            .build();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http_addr"));
    }

    #[test]
    fn test_validate_invalid_metrics_addr_only_when_enabled() {
        let mut config = BulwarkConfig::builder()
            .metrics(MetricsConfig {
                enabled: true,
                addr: "invalid".to_string(),
            })
            .build();
        assert!(config.validate().unwrap_err().to_string().contains("metrics.addr"));

        config.metrics.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_timeouts() {
        let config = BulwarkConfig::builder()
            .server(ServerConfig {
                request_timeout_secs: 0,
                ..Default::default()
            })
            .build();
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("request_timeout_secs"));

        let config = BulwarkConfig::builder()
            .server(ServerConfig {
                shutdown_timeout_secs: 0,
                ..Default::default()
            })
            .build();
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("shutdown_timeout_secs"));
    }

    #[test]
    fn test_validate_blank_allowed_ip() {
        let config = BulwarkConfig::builder()
            .access(AccessConfig {
                allowed_ips: vec!["127.0.0.1".to_string(), "  ".to_string()],
                ..Default::default()
            })
            .build();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("allowed_ips[1]"));
    }

    #[test]
    fn test_validate_blank_browser_vendor() {
        let config = BulwarkConfig::builder()
            .access(AccessConfig {
                invalid_browsers: vec![BrowserRuleConfig {
                    vendor: String::new(),
                    versions: vec!["1.0".to_string()],
                }],
                ..Default::default()
            })
            .build();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("invalid_browsers[0].vendor"));
    }

    #[test]
    fn test_malformed_version_is_not_a_config_error() {
        let config = BulwarkConfig::builder()
            .access(AccessConfig {
                invalid_browsers: vec![BrowserRuleConfig {
                    vendor: "Firefox".to_string(),
                    versions: vec!["banana".to_string(), "<=3.6".to_string()],
                }],
                ..Default::default()
            })
            .build();

        assert!(config.validate().is_ok());
        assert_eq!(config.access_policy().browser_rules().len(), 1);
    }

    #[test]
    fn test_environment_parsing() {
        let config = BulwarkConfig::development();
        assert_eq!(config.environment().unwrap(), Environment::Development);
        assert_eq!(
            BulwarkConfig::default().environment().unwrap(),
            Environment::Production
        );
    }

    #[test]
    fn test_expose_fault_details_override() {
        let mut config = BulwarkConfig::default();
        assert!(!config.expose_fault_details(Environment::Production));
        assert!(!config.expose_fault_details(Environment::Staging));
        assert!(config.expose_fault_details(Environment::Development));

        config.access.expose_fault_details = Some(true);
        assert!(config.expose_fault_details(Environment::Production));

        config.access.expose_fault_details = Some(false);
        assert!(!config.expose_fault_details(Environment::Development));
    }

    #[test]
    fn test_access_policy() {
        let config = BulwarkConfig::builder()
            .access(AccessConfig {
                allowed_ips: vec!["10.0.0.7".to_string()],
                invalid_browsers: vec![BrowserRuleConfig {
                    vendor: "Firefox".to_string(),
                    versions: vec!["<=3.6".to_string(), "57.x".to_string()],
                }],
                expose_fault_details: None,
            })
            .build();

        let policy = config.access_policy();
        assert!(policy
            .allow_list()
            .is_allowed(Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)))));
        assert!(!policy.allow_list().is_allowed(Some(IpAddr::V4(Ipv4Addr::LOCALHOST))));
        assert_eq!(policy.browser_rules().len(), 2);
        assert!(policy.browser_rules().evaluate("Firefox/3.5"));
        assert!(!policy.browser_rules().evaluate("Firefox/120.0"));
    }

    #[test]
    fn test_development_preset() {
        let config = BulwarkConfig::development();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, crate::LogFormat::Pretty);
        assert!(config.logging.include_location);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_preset() {
        let config = BulwarkConfig::production();
        assert_eq!(config.environment, "Production");
        assert_eq!(config.logging.format, crate::LogFormat::Json);
        assert_eq!(config.access.expose_fault_details, Some(false));
    }

    #[test]
    fn test_build_validated_failure() {
        let result = BulwarkConfig::builder()
            .server(ServerConfig {
                http_addr: "invalid".to_string(),
                ..Default::default()
            })
            .build_validated();

        assert!(result.is_err());
    }

    #[test]
    fn test_toml_serialization() {
        let config = BulwarkConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("environment = \"Production\""));
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[access]"));
    }

    #[test]
    fn test_unknown_section_rejected() {
        let toml_str = r#"
            [telemetry]
            service_name = "x"
        "#;

        let result: Result<BulwarkConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }
}
