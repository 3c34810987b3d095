//! Bulwark - Entry point
//!
//! Loads configuration, installs telemetry and serves the pipeline until
//! SIGINT or SIGTERM.

use std::path::PathBuf;

use anyhow::Context;
use bulwark::config::{BulwarkConfig, ConfigLoader, DEFAULT_ENV_PREFIX};

/// Configuration file used when neither `--config` nor `BULWARK_CONFIG` is set.
const DEFAULT_CONFIG_FILE: &str = "bulwark.toml";

/// Environment variable naming the configuration file.
const CONFIG_PATH_VAR: &str = "BULWARK_CONFIG";

/// Command-line arguments.
struct Args {
    /// Explicit configuration file; must exist.
    config: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = args.next().map(PathBuf::from);
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("bulwark {}", bulwark::VERSION);
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        Self { config }
    }
}

fn print_help() {
    println!(
        r"Bulwark - IP allow-list and browser gatekeeping for HTTP services

USAGE:
    bulwark [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Configuration file (TOML or JSON), must exist
    -h, --help             Print help information
    -v, --version          Print version information

Without --config, BULWARK_CONFIG or ./bulwark.toml is read if present.
A .env file in the working directory is loaded first.

ENVIRONMENT VARIABLES:
    BULWARK__ENVIRONMENT                  Development, Staging or Production
    BULWARK__SERVER__HTTP_ADDR            Listen address (default: 0.0.0.0:8080)
    BULWARK__ACCESS__ALLOWED_IPS          Comma-separated allow-list
    BULWARK__ACCESS__INVALID_BROWSERS__<VENDOR>
                                          Comma-separated refused versions
    BULWARK__LOGGING__LEVEL               Log filter (RUST_LOG takes precedence)
    BULWARK__METRICS__ENABLED             Prometheus exporter on/off
"
    );
}

/// Loads `.env`, the configuration file and `BULWARK__*` overrides.
///
/// Returns the validated configuration and whether a file was read.
fn load_config(args: &Args) -> anyhow::Result<(BulwarkConfig, bool)> {
    let loader = ConfigLoader::new().with_defaults().with_dotenv()?;

    let loader = match &args.config {
        Some(path) => loader
            .with_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            let path = std::env::var_os(CONFIG_PATH_VAR)
                .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from);
            loader
                .with_optional_file(&path)
                .with_context(|| format!("loading {}", path.display()))?
        }
    };

    let file_loaded = loader.file_loaded();
    let config = loader
        .with_env_prefix(DEFAULT_ENV_PREFIX)
        .load()
        .context("invalid configuration")?;

    Ok((config, file_loaded))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let (config, file_loaded) = load_config(&args)?;

    bulwark::init_telemetry(&config).context("initializing telemetry")?;
    if !file_loaded {
        tracing::info!("No configuration file found; using defaults and environment");
    }

    tracing::info!(
        version = bulwark::VERSION,
        environment = %config.environment,
        addr = %config.server.http_addr,
        "Starting Bulwark"
    );

    let server = bulwark::build_server(&config)?;
    server.run().await?;
    Ok(())
}
