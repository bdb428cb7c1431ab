//! Metrics collection and exposition.
//!
//! # Metrics
//! - `cep_weather_requests_total` (counter): handled requests by service, status
//! - `cep_weather_request_duration_seconds` (histogram): latency by service
//! - `cep_weather_weather_fallbacks_total` (counter): simulated readings by reason
//!
//! Recording is a no-op until a recorder is installed, so handlers record
//! unconditionally.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one handled inbound request.
pub fn record_request(service: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "cep_weather_requests_total",
        "service" => service,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("cep_weather_request_duration_seconds", "service" => service)
        .record(start.elapsed().as_secs_f64());
}

/// Record that the weather fetcher substituted a simulated reading.
pub fn record_weather_fallback(reason: &'static str) {
    metrics::counter!("cep_weather_weather_fallbacks_total", "reason" => reason).increment(1);
}
