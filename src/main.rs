//! SharePoint connection check
//!
//! Verifies environment, runtime components, authentication and read access
//! for the configured site. Exits 0 when every check passed, 1 otherwise.

use clap::Parser;
use sharepoint_connect::{
    auth::AzureIdentityClient, config::LogFormat, diagnostics::Diagnostics, load_settings,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// SharePoint connection check - verify Azure AD credentials against a site
#[derive(Parser, Debug)]
#[command(name = "shp-check")]
#[command(version, about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SHP_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Log output format
    #[arg(long, env = "SHP_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env before parsing so it can feed the env-backed arguments too
    let dotenv = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    match args.log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init(),
    }

    info!(version = env!("CARGO_PKG_VERSION"), "Starting SharePoint connection check");
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => error!(error = %e, "Failed to load .env file"),
    }

    let settings =
        load_settings().inspect_err(|e| error!(error = %e, "Failed to load configuration"))?;

    let identity = Arc::new(
        AzureIdentityClient::new()
            .inspect_err(|e| error!(error = %e, "Failed to create identity client"))?,
    );

    let report = Diagnostics::new(settings, identity).run().await;
    print!("{report}");

    Ok(ExitCode::from(report.exit_status()))
}
