//! VibeFeeder server entry point.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use vibefeeder::app::{self, AppState};
use vibefeeder_config::ConfigLoader;
use vibefeeder_server::{HealthCheck, Server};

const DEFAULT_CONFIG_FILE: &str = "vibefeeder.toml";

/// Command-line arguments.
struct Args {
    /// Path to a configuration file.
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
                    println!("vibefeeder {}", env!("CARGO_PKG_VERSION"));
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
        r"VibeFeeder - feed reader web application

USAGE:
    vibefeeder [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Configuration file (TOML or JSON), default ./vibefeeder.toml if present
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES:
    SERVER_ADDRESS         Listen address (default: localhost:8080)
    LOG_LEVEL              debug, info, warn or error (default: info)
    LOG_FORMAT             text or json (default: json)
    AUTH_COOKIE_SECURE     'true' to mark cookies Secure
    VIBEFEEDER__<SECTION>__<KEY>
                           Any configuration key, e.g. VIBEFEEDER__SERVER__MAX_BODY_BYTES
    RUST_LOG               Overrides LOG_LEVEL with a tracing filter
"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::new().with_file(path)?,
        None => ConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE)?,
    };
    let config = loader
        .with_dotenv()?
        .with_env()
        .load()
        .context("failed to load configuration")?;

    vibefeeder_telemetry::init_logging(&config.log.to_log_config())
        .context("failed to initialize logging")?;
    if let Err(e) = vibefeeder_telemetry::install_prometheus() {
        warn!(error = %e, "Metrics disabled");
    }

    match app::load_manifest(&config) {
        Ok(Some(manifest)) => {
            info!(entries = manifest.len(), "Loaded asset manifest");
            vibefeeder_view::install_manifest(manifest);
        }
        Ok(None) => info!("No asset manifest, serving unversioned asset URLs"),
        Err(e) => warn!(error = %e, "Ignoring unreadable asset manifest"),
    }

    let state = AppState::new(HealthCheck::new());
    let server = Server::builder()
        .address(config.server.address.clone())
        .shutdown_timeout(Duration::from_secs(config.server.shutdown_timeout_secs))
        .max_body_bytes(config.server.max_body_bytes)
        .pipeline(app::pipeline(&config, state.renderer.clone()))
        .router(app::static_files(&config).mount(app::router(&state)))
        .bind()
        .await?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        address = %server.local_addr()?,
        "Starting VibeFeeder"
    );
    server.run().await?;
    Ok(())
}
