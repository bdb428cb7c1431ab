//! CEP weather services.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────┐              ┌──────────────────────────┐
//!   POST /        │   gateway (svc A)    │  GET /{cep}  │    aggregator (svc B)    │
//!   {"cep":...} ─▶│ validate → forward   │─────────────▶│ validate → resolve city  │──▶ postal provider
//!                 │ span: handleCEP      │  traceparent │ span: handleTemperature  │
//!   ◀─────────────│   └ callServiceB     │◀─────────────│   ├ fetchCEP             │──▶ weather provider
//!   relayed as-is └──────────────────────┘              │   └ fetchTemperature     │
//!                                                       └──────────────────────────┘
//!                            both export spans to one OTLP collector
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use cep_weather::config;
use cep_weather::lifecycle::{self, ServiceKind};
use cep_weather::observability::logging;

#[derive(Parser)]
#[command(name = "cep-weather")]
#[command(about = "Postal code to temperature services with distributed tracing", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "CEP_WEATHER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the front-facing validator/forwarder (service A)
    Gateway,
    /// Run the postal + weather aggregator (service B)
    Aggregator,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = config::load(cli.config.as_deref())?;
    logging::init_logging(&config.observability)?;

    let kind = match cli.command {
        Commands::Gateway => ServiceKind::Gateway,
        Commands::Aggregator => ServiceKind::Aggregator,
    };

    tracing::info!(
        service = kind.name(),
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        "cep-weather starting"
    );

    lifecycle::run(kind, config).await?;
    Ok(())
}
