//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and URLs parse
//! - Validate value ranges (timeouts > 0)
//! - Inbound request timeout must outlast two sequential outbound calls
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServiceConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: invalid URL {value:?}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error(
        "timeouts.request_secs: {request_secs}s must exceed two outbound calls ({outbound_secs}s each)"
    )]
    RequestTimeoutTooShort { request_secs: u64, outbound_secs: u64 },

    #[error("observability.log_level: unknown level {0:?}")]
    UnknownLogLevel(String),
}

/// Check every section, collecting all problems.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "gateway.bind_address", &config.gateway.bind_address);
    check_address(&mut errors, "aggregator.bind_address", &config.aggregator.bind_address);

    check_url(&mut errors, "gateway.aggregator_url", &config.gateway.aggregator_url);
    check_url(&mut errors, "upstream.postal_base_url", &config.upstream.postal_base_url);
    check_url(&mut errors, "upstream.weather_url", &config.upstream.weather_url);

    if config.timeouts.outbound_secs == 0 {
        errors.push(ValidationError::ZeroTimeout { field: "timeouts.outbound_secs" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout { field: "timeouts.request_secs" });
    }
    let timeouts = &config.timeouts;
    if timeouts.outbound_secs > 0
        && timeouts.request_secs > 0
        && timeouts.request_secs <= timeouts.outbound_secs.saturating_mul(2)
    {
        errors.push(ValidationError::RequestTimeoutTooShort {
            request_secs: timeouts.request_secs,
            outbound_secs: timeouts.outbound_secs,
        });
    }

    let obs = &config.observability;
    if !LOG_LEVELS.contains(&obs.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::UnknownLogLevel(obs.log_level.clone()));
    }
    if obs.tracing_enabled {
        check_url(&mut errors, "observability.otlp_endpoint", &obs.otlp_endpoint);
    }
    if obs.metrics_enabled {
        check_address(&mut errors, "observability.metrics_address", &obs.metrics_address);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false);
    if !valid {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&ServiceConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = ServiceConfig::default();
        config.gateway.bind_address = "not-an-addr".into();
        config.gateway.aggregator_url = "service-b:8081".into();
        config.timeouts.request_secs = 0;
        config.observability.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::ZeroTimeout {
            field: "timeouts.request_secs"
        }));
        assert!(errors.contains(&ValidationError::UnknownLogLevel("loud".into())));
    }

    #[test]
    fn request_timeout_must_outlast_two_outbound_calls() {
        let mut config = ServiceConfig::default();
        config.timeouts.outbound_secs = 10;

        config.timeouts.request_secs = 20;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::RequestTimeoutTooShort {
                request_secs: 20,
                outbound_secs: 10,
            }])
        );

        config.timeouts.request_secs = 21;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn otlp_endpoint_ignored_when_tracing_disabled() {
        let mut config = ServiceConfig::default();
        config.observability.tracing_enabled = false;
        config.observability.otlp_endpoint = String::new();

        assert!(validate_config(&config).is_ok());
    }
}
