//! Startup orchestration.
//!
//! Both services start the same way; only the handler state and listener
//! address differ.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::http::{aggregator, gateway, AggregatorState, GatewayState, HttpServer};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::{init_tracer_provider, metrics, shutdown_tracer_provider, Telemetry, TelemetryError};

/// Which of the two services this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Gateway,
    Aggregator,
}

impl ServiceKind {
    pub fn name(self) -> &'static str {
        match self {
            ServiceKind::Gateway => "gateway",
            ServiceKind::Aggregator => "aggregator",
        }
    }

    pub fn bind_address(self, config: &ServiceConfig) -> &str {
        match self {
            ServiceKind::Gateway => &config.gateway.bind_address,
            ServiceKind::Aggregator => &config.aggregator.bind_address,
        }
    }

    /// `service.name` resource attribute and tracer scope.
    pub fn service_name(self, config: &ServiceConfig) -> &str {
        match self {
            ServiceKind::Gateway => &config.gateway.service_name,
            ServiceKind::Aggregator => &config.aggregator.service_name,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("tracing setup failed: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("metrics setup failed: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),

    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the un-layered router for `kind`.
pub fn build_app(
    kind: ServiceKind,
    config: &ServiceConfig,
    telemetry: Telemetry,
) -> Result<Router, reqwest::Error> {
    let app = match kind {
        ServiceKind::Gateway => gateway::router(GatewayState::from_config(config, telemetry)?),
        ServiceKind::Aggregator => {
            aggregator::router(AggregatorState::from_config(config, telemetry)?)
        }
    };
    Ok(app)
}

/// Run `kind` until a shutdown signal, then flush spans.
pub async fn run(kind: ServiceKind, config: ServiceConfig) -> Result<(), StartupError> {
    let service_name = kind.service_name(&config).to_string();

    let provider = init_tracer_provider(&config.observability, &service_name)?;
    let telemetry = Telemetry::new(&provider, service_name.clone());

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let app = build_app(kind, &config, telemetry)?;
    let server = HttpServer::new(
        kind.name(),
        app,
        Duration::from_secs(config.timeouts.request_secs),
    );

    let listener = TcpListener::bind(kind.bind_address(&config)).await?;
    tracing::info!(
        service = %service_name,
        address = %listener.local_addr()?,
        outbound_timeout_secs = config.timeouts.outbound_secs,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::trigger_on_signal(shutdown));

    let result = server.run(listener, server_shutdown).await;

    shutdown_tracer_provider(&provider);
    tracing::info!(service = %service_name, "Shutdown complete");
    result.map_err(StartupError::from)
}
