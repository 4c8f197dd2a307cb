//! Command-line entrypoint for organisation activity collection.

use std::io::{self, Write};
use std::process::ExitCode;

use org_activity::{ActivityError, HttpGraphQlGateway, OrgActivityConfig, RetryingGateway};
use ortho_config::OrthoConfig;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

const DEFAULT_LOG_FILTER: &str = "info";

fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), ActivityError> {
    let config = load_config()?;
    let gateway = build_gateway(&config)?;

    if config.validate_only {
        cli::validate::run(&config, &gateway)
    } else {
        cli::collect::run(&config, &gateway)
    }
}

/// Installs a stderr `fmt` subscriber filtered by `RUST_LOG`.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`ActivityError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<OrgActivityConfig, ActivityError> {
    OrgActivityConfig::load().map_err(|error| ActivityError::Configuration {
        message: error.to_string(),
    })
}

/// HTTP transport wrapped in rate-limit retries.
fn build_gateway(
    config: &OrgActivityConfig,
) -> Result<RetryingGateway<HttpGraphQlGateway>, ActivityError> {
    let token = config.resolve_token()?;
    let http = HttpGraphQlGateway::new(&token, config.gateway_config()?)?;
    Ok(RetryingGateway::new(http, config.retry_policy()))
}
