//! File-based configuration loading.

use std::io::Write;

use bulwark_config::{BulwarkConfig, ConfigError, ConfigLoader, LogFormat};
use bulwark_core::Environment;
use tempfile::{Builder, NamedTempFile};

fn write_config(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = Builder::new()
        .prefix("bulwark")
        .suffix(suffix)
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn loads_complete_toml_file() {
    let file = write_config(
        ".toml",
        r#"
        environment = "Staging"

        [server]
        http_addr = "127.0.0.1:8081"
        request_timeout_secs = 10
        shutdown_timeout_secs = 5
        max_body_size = 4096

        [logging]
        level = "debug"
        format = "pretty"
        include_location = true

        [metrics]
        enabled = false

        [access]
        allowed_ips = ["127.0.0.1", "192.168.1.10", "::1"]
        expose_fault_details = false

        [[access.invalid_browsers]]
        vendor = "Firefox"
        versions = ["<=3.6", "57.x"]

        [[access.invalid_browsers]]
        vendor = "Internet Explorer"
        versions = ["<=11.0"]

        [support]
        contact = "help@corp.example"
        alternative_browsers = ["Firefox"]
        "#,
    );

    let loader = ConfigLoader::new().with_file(file.path()).unwrap();
    assert!(loader.file_loaded());
    let config = loader.load().unwrap();

    assert_eq!(config.environment().unwrap(), Environment::Staging);
    assert_eq!(config.server.request_timeout_secs, 10);
    assert_eq!(config.server.max_body_size, 4096);
    assert_eq!(config.logging.format, LogFormat::Pretty);
    assert!(!config.metrics.enabled);
    assert!(!config.expose_fault_details(Environment::Staging));
    assert_eq!(config.support.contact, "help@corp.example");
    // Omitted support fields keep their defaults.
    assert_eq!(config.support.access_policy_url, "https://example.com/access-policy");

    let policy = config.access_policy();
    assert_eq!(policy.allow_list().len(), 3);
    assert_eq!(policy.browser_rules().len(), 3);
    assert!(policy.browser_rules().evaluate(
        "Mozilla/5.0 (X11; Linux x86_64; rv:57.0) Gecko/20100101 Firefox/57.0"
    ));
    assert!(!policy.browser_rules().evaluate(
        "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0"
    ));
}

#[test]
fn loads_json_file() {
    let file = write_config(
        ".json",
        r#"{
            "environment": "Development",
            "access": { "allowed_ips": ["10.1.1.1"] }
        }"#,
    );

    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(config.environment().unwrap(), Environment::Development);
    assert_eq!(config.access.allowed_ips, vec!["10.1.1.1"]);
}

#[test]
fn unknown_field_in_file_is_rejected() {
    let file = write_config(
        ".toml",
        r#"
        [access]
        allowed_ips = ["127.0.0.1"]
        denied_ips = ["10.0.0.1"]
        "#,
    );

    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::TomlError(_))));
}

#[test]
fn unsupported_extension_is_rejected() {
    let file = write_config(".yaml", "environment: Production\n");

    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
}

#[test]
fn unknown_environment_in_file_fails_validation() {
    let file = write_config(".toml", r#"environment = "Sandbox""#);

    let err = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap_err();
    assert!(err.to_string().contains("Sandbox"));
}

#[test]
fn optional_file_is_loaded_when_present() {
    let file = write_config(".toml", "[server]\nhttp_addr = \"127.0.0.1:7000\"\n");

    let config = ConfigLoader::new()
        .with_optional_file(file.path())
        .unwrap()
        .load()
        .unwrap();
    assert_eq!(config.server.http_addr, "127.0.0.1:7000");
}

#[test]
fn empty_file_yields_defaults() {
    let file = write_config(".toml", "");

    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap();
    assert_eq!(config, BulwarkConfig::default());
}
