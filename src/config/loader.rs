//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Overrides the weather provider access key.
pub const ENV_WEATHER_API_KEY: &str = "WEATHER_API_KEY";
/// Overrides the gateway's forwarding target.
pub const ENV_AGGREGATOR_URL: &str = "AGGREGATOR_URL";
/// Overrides the collector endpoint (standard OTel variable).
pub const ENV_OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration for a service process.
///
/// Reads `path` if given (defaults otherwise), applies environment overrides,
/// then validates the result.
pub fn load(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => toml::from_str(&fs::read_to_string(path)?)?,
        None => ServiceConfig::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides using `lookup` to resolve variables.
///
/// Empty values are ignored.
pub fn apply_overrides<F>(config: &mut ServiceConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(key) = get(ENV_WEATHER_API_KEY) {
        config.upstream.weather_api_key = key;
    }
    if let Some(url) = get(ENV_AGGREGATOR_URL) {
        config.gateway.aggregator_url = url;
    }
    if let Some(endpoint) = get(ENV_OTLP_ENDPOINT) {
        config.observability.otlp_endpoint = endpoint;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogFormat;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn loads_partial_file_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[aggregator]
bind_address = "127.0.0.1:9001"

[observability]
log_format = "json"
tracing_enabled = false
"#
        )
        .unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.aggregator.bind_address, "127.0.0.1:9001");
        assert_eq!(config.gateway.bind_address, "0.0.0.0:8080");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert!(!config.observability.tracing_enabled);
        assert_eq!(config.timeouts.outbound_secs, 10);
    }

    #[test]
    fn rejects_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[gateway\nbind_address = ").unwrap();

        assert!(matches!(load(Some(file.path())), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn reports_validation_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[timeouts]\noutbound_secs = 0").unwrap();

        let err = load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("outbound_secs"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load(Some(Path::new("/nonexistent/cep-weather.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn file_timeouts_are_checked_against_each_other() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[timeouts]\noutbound_secs = 10\nrequest_secs = 15").unwrap();

        let err = load(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("timeouts.request_secs"), "{err}");
    }

    #[test]
    fn env_overrides_replace_configured_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_WEATHER_API_KEY, "secret"),
            (ENV_AGGREGATOR_URL, "http://localhost:8081"),
            (ENV_OTLP_ENDPOINT, "  "),
        ]);
        let mut config = ServiceConfig::default();

        apply_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.upstream.weather_api_key, "secret");
        assert_eq!(config.gateway.aggregator_url, "http://localhost:8081");
        // blank values do not override
        assert_eq!(
            config.observability.otlp_endpoint,
            "http://otel-collector:4317"
        );
    }
}
