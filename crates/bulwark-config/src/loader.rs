//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::env;
use std::fs;
use std::path::Path;

use crate::{BrowserRuleConfig, BulwarkConfig, ConfigError, LogFormat};

/// Default prefix for environment variable overrides.
pub const DEFAULT_ENV_PREFIX: &str = "BULWARK";

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use bulwark_config::ConfigLoader;
///
/// # fn main() -> Result<(), bulwark_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("bulwark.toml")?
///     .with_env_prefix("BULWARK")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: BulwarkConfig,
    env_prefix: Option<String>,
    file_loaded: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: BulwarkConfig::default(),
            env_prefix: None,
            file_loaded: false,
        }
    }

    /// Start with default configuration values.
    ///
    /// This is called automatically by `new()`, but can be chained for clarity.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = BulwarkConfig::default();
        self
    }

    /// Start with development preset configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use bulwark_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.environment, "Development");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = BulwarkConfig::development();
        self
    }

    /// Start with production preset configuration.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = BulwarkConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// Supports TOML (.toml) and JSON (.json) formats, chosen by extension.
    /// The file replaces the current configuration; sections it omits take
    /// their default values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        self.file_loaded = true;

        Ok(self)
    }

    /// Load configuration from an optional file.
    ///
    /// If the file exists, loads it. If not, silently continues.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string.
    ///
    /// `format` is `"toml"` or `"json"`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the format is unknown.
    ///
    /// # Example
    ///
    /// ```
    /// use bulwark_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     environment = "Staging"
    ///
    ///     [access]
    ///     allowed_ips = ["10.0.0.1"]
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.access.allowed_ips, vec!["10.0.0.1"]);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => return Err(ConfigError::UnsupportedFormat(format.to_string())),
        };
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`.
    /// For example, with prefix "BULWARK":
    /// - `BULWARK__ENVIRONMENT=Staging`
    /// - `BULWARK__SERVER__HTTP_ADDR=0.0.0.0:9000`
    /// - `BULWARK__ACCESS__ALLOWED_IPS=10.0.0.1,10.0.0.2`
    /// - `BULWARK__ACCESS__INVALID_BROWSERS__FIREFOX=<=3.6,57.x`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file from the working directory, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if a `.env` file exists but is malformed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(err) if err.not_found() => Ok(self),
            Err(err) => Err(err.into()),
        }
    }

    /// Whether a configuration file was loaded.
    #[must_use]
    pub fn file_loaded(&self) -> bool {
        self.file_loaded
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment variable overrides (if a prefix was set) and
    /// validates the final configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an environment variable cannot be parsed or
    /// validation fails.
    pub fn load(mut self) -> Result<BulwarkConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix, env::vars())?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Finalize without validation or environment overrides.
    #[must_use]
    pub fn load_unvalidated(self) -> BulwarkConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<BulwarkConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    fn apply_env_overrides<I>(&mut self, prefix: &str, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let marker = format!("{prefix}__");
        for (key, value) in vars.into_iter().filter(|(k, _)| k.starts_with(&marker)) {
            self.apply_env_var(&key, &value, prefix)?;
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();

        match parts.as_slice() {
            ["ENVIRONMENT"] => {
                self.config.environment = value.to_string();
            }

            // Server section
            ["SERVER", "HTTP_ADDR"] => {
                self.config.server.http_addr = value.to_string();
            }
            ["SERVER", "REQUEST_TIMEOUT_SECS"] => {
                self.config.server.request_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                self.config.server.shutdown_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "MAX_BODY_SIZE"] => {
                self.config.server.max_body_size = parse_number(key, value)?;
            }
            ["SERVER", "HTTP2_ENABLED"] => {
                self.config.server.http2_enabled = parse_flag(key, value)?;
            }

            // Logging section
            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "INCLUDE_LOCATION"] => {
                self.config.logging.include_location = parse_flag(key, value)?;
            }
            ["LOGGING", "INCLUDE_TARGET"] => {
                self.config.logging.include_target = parse_flag(key, value)?;
            }

            // Metrics section
            ["METRICS", "ENABLED"] => {
                self.config.metrics.enabled = parse_flag(key, value)?;
            }
            ["METRICS", "ADDR"] => {
                self.config.metrics.addr = value.to_string();
            }

            // Access section
            ["ACCESS", "ALLOWED_IPS"] => {
                self.config.access.allowed_ips = split_list(value);
            }
            ["ACCESS", "EXPOSE_FAULT_DETAILS"] => {
                self.config.access.expose_fault_details = if value.is_empty() {
                    None
                } else {
                    Some(parse_flag(key, value)?)
                };
            }
            ["ACCESS", "INVALID_BROWSERS", vendor] => {
                let vendor = vendor.replace('_', " ");
                let versions = split_list(value);
                let rules = &mut self.config.access.invalid_browsers;
                match rules
                    .iter_mut()
                    .find(|rule| rule.vendor.eq_ignore_ascii_case(&vendor))
                {
                    Some(rule) => rule.versions = versions,
                    None => rules.push(BrowserRuleConfig { vendor, versions }),
                }
            }

            // Support section
            ["SUPPORT", "CONTACT"] => {
                self.config.support.contact = value.to_string();
            }
            ["SUPPORT", "ACCESS_POLICY_URL"] => {
                self.config.support.access_policy_url = value.to_string();
            }
            ["SUPPORT", "BROWSER_SUPPORT_URL"] => {
                self.config.support.browser_support_url = value.to_string();
            }
            ["SUPPORT", "ALTERNATIVE_BROWSERS"] => {
                self.config.support.alternative_browsers = split_list(value);
            }

            // Unknown key - ignore
            _ => {}
        }

        Ok(())
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

/// Split a comma-separated list, dropping blank items.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config.server.http_addr, "0.0.0.0:8080");
        assert_eq!(config.environment, "Production");
    }

    #[test]
    fn test_loader_with_development() {
        let config = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_loader_with_production() {
        let config = ConfigLoader::new().with_production().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_loader_with_string_toml() {
        let toml = r#"
            environment = "Staging"

            [server]
            http_addr = "127.0.0.1:3000"
        "#;

        let config = ConfigLoader::new()
            .with_string(toml, "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.environment, "Staging");
        assert_eq!(config.server.http_addr, "127.0.0.1:3000");
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"access": {"allowed_ips": ["192.168.1.10"]}}"#;

        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.access.allowed_ips, vec!["192.168.1.10"]);
    }

    #[test]
    fn test_loader_with_string_unknown_format() {
        let result = ConfigLoader::new().with_string("a: b", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_loader_unknown_environment_fails_load() {
        let result = ConfigLoader::new()
            .with_string(r#"environment = "Qa""#, "toml")
            .unwrap()
            .load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/bulwark.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let loader = ConfigLoader::new()
            .with_optional_file("/nonexistent/bulwark.toml")
            .unwrap();
        assert!(!loader.file_loaded());

        let config = loader.load().unwrap();
        assert_eq!(config.server.http_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_loader_load_unvalidated() {
        let config = ConfigLoader::new()
            .with_string(r#"environment = "Qa""#, "toml")
            .unwrap()
            .load_unvalidated();

        assert_eq!(config.environment, "Qa");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));

        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("no"), Some(false));
        assert_eq!(parse_bool("off"), Some(false));

        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("10.0.0.1, 10.0.0.2,,"), vec!["10.0.0.1", "10.0.0.2"]);
        assert!(split_list("").is_empty());
    }

    // Tests run in parallel, so the process environment is left alone and
    // overrides are fed through apply_env_overrides directly.

    #[test]
    fn test_env_overrides_environment_and_server() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_overrides(
                "TEST",
                vars(&[
                    ("TEST__ENVIRONMENT", "Development"),
                    ("TEST__SERVER__HTTP_ADDR", "192.168.1.1:9000"),
                    ("TEST__SERVER__REQUEST_TIMEOUT_SECS", "5"),
                    ("OTHER__SERVER__HTTP_ADDR", "10.0.0.1:1"),
                ]),
            )
            .unwrap();

        assert_eq!(loader.config.environment, "Development");
        assert_eq!(loader.config.server.http_addr, "192.168.1.1:9000");
        assert_eq!(loader.config.server.request_timeout_secs, 5);
    }

    #[test]
    fn test_env_override_allowed_ips_comma_separated() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__ACCESS__ALLOWED_IPS", "10.0.0.1, ::1", "TEST")
            .unwrap();
        assert_eq!(loader.config.access.allowed_ips, vec!["10.0.0.1", "::1"]);
    }

    #[test]
    fn test_env_override_invalid_browsers() {
        let mut loader = ConfigLoader::new()
            .with_string(
                r#"
                [[access.invalid_browsers]]
                vendor = "Firefox"
                versions = ["<=3.6"]
                "#,
                "toml",
            )
            .unwrap();

        loader
            .apply_env_var("TEST__ACCESS__INVALID_BROWSERS__FIREFOX", "57.x", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__ACCESS__INVALID_BROWSERS__INTERNET_EXPLORER", "<=11.0", "TEST")
            .unwrap();

        let rules = &loader.config.access.invalid_browsers;
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].vendor, "Firefox");
        assert_eq!(rules[0].versions, vec!["57.x"]);
        assert_eq!(rules[1].vendor, "INTERNET EXPLORER");

        let policy = loader.load_unvalidated().access_policy();
        assert!(policy.browser_rules().evaluate("Mozilla/4.0 (compatible; MSIE 8.0; Windows NT 6.1)"));
    }

    #[test]
    fn test_env_override_expose_fault_details() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__ACCESS__EXPOSE_FAULT_DETAILS", "yes", "TEST")
            .unwrap();
        assert_eq!(loader.config.access.expose_fault_details, Some(true));

        loader
            .apply_env_var("TEST__ACCESS__EXPOSE_FAULT_DETAILS", "", "TEST")
            .unwrap();
        assert_eq!(loader.config.access.expose_fault_details, None);
    }

    #[test]
    fn test_env_override_log_format() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__LOGGING__FORMAT", "pretty", "TEST")
            .unwrap();
        assert_eq!(loader.config.logging.format, LogFormat::Pretty);

        let result = loader.apply_env_var("TEST__LOGGING__FORMAT", "xml", "TEST");
        assert!(result.is_err());
    }

    #[test]
    fn test_env_override_invalid_integer() {
        let mut loader = ConfigLoader::new();
        let result = loader.apply_env_var("TEST__SERVER__MAX_BODY_SIZE", "lots", "TEST");
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));
    }

    #[test]
    fn test_env_override_unknown_key_ignored() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__SERVER__KEEP_ALIVE", "10", "TEST")
            .unwrap();
        assert_eq!(loader.config, BulwarkConfig::default());
    }
}
