//! Configuration schema definitions.
//!
//! One file configures both services; each reads the sections it needs.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Front-facing validator/forwarder (service A).
    pub gateway: GatewayConfig,

    /// Resolver/aggregator (service B).
    pub aggregator: AggregatorConfig,

    /// External providers used by the aggregator.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Gateway listener and forwarding target.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Base URL of the aggregator; the CEP is appended as the path.
    pub aggregator_url: String,

    /// `service.name` reported to the collector.
    pub service_name: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            aggregator_url: "http://service-b:8081".to_string(),
            service_name: "service-a".to_string(),
        }
    }
}

/// Aggregator listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Bind address (e.g., "0.0.0.0:8081").
    pub bind_address: String,

    /// `service.name` reported to the collector.
    pub service_name: String,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8081".to_string(),
            service_name: "service-b".to_string(),
        }
    }
}

/// Postal-lookup and weather provider endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Postal lookup base; requests go to `{postal_base_url}/{cep}/json/`.
    pub postal_base_url: String,

    /// Weather "current conditions" endpoint.
    pub weather_url: String,

    /// Weather provider access key. Usually supplied via `WEATHER_API_KEY`.
    pub weather_api_key: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            postal_base_url: "https://viacep.com.br/ws".to_string(),
            weather_url: "http://api.weatherapi.com/v1/current.json".to_string(),
            weather_api_key: String::new(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upper bound for every outbound call, in seconds.
    pub outbound_secs: u64,

    /// Upper bound for handling an inbound request, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            outbound_secs: 10,
            request_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Export spans over OTLP. When off, spans are still created and propagated.
    pub tracing_enabled: bool,

    /// OTLP/gRPC collector endpoint.
    pub otlp_endpoint: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            tracing_enabled: true,
            otlp_endpoint: "http://otel-collector:4317".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
