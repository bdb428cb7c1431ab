//! City → current Celsius temperature.
//!
//! Transport failures propagate. Provider-side trouble (non-200 status or a
//! payload that does not parse) degrades to a deterministic simulated reading.

use opentelemetry::{
    trace::{SpanKind, TraceContextExt},
    Context, KeyValue,
};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::observability::metrics;
use crate::observability::tracing::{fail_span, Telemetry};
use crate::resilience::classify;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

/// Where a reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingSource {
    Provider,
    /// Provider answered with a non-200 status.
    FallbackStatus,
    /// Provider answered 200 with an unusable body.
    FallbackPayload,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherReading {
    pub celsius: f64,
    pub source: ReadingSource,
}

impl WeatherReading {
    pub fn is_simulated(&self) -> bool {
        self.source != ReadingSource::Provider
    }
}

/// `20 + (len % 15)`, where `len` counts characters, not bytes, so accented
/// names get the same reading as their unaccented spelling.
pub fn simulated_celsius(city: &str) -> f64 {
    20.0 + (city.chars().count() % 15) as f64
}

/// A 200 body without `current.temp_c` does not match and is simulated.
#[derive(Debug, Deserialize)]
struct CurrentPayload {
    current: Current,
}

#[derive(Debug, Deserialize)]
struct Current {
    temp_c: f64,
}

/// Client for the weather provider.
#[derive(Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    telemetry: Telemetry,
}

impl WeatherClient {
    pub fn new(
        http: reqwest::Client,
        url: impl Into<String>,
        api_key: impl Into<String>,
        telemetry: Telemetry,
    ) -> Self {
        Self {
            http,
            url: url.into(),
            api_key: api_key.into(),
            telemetry,
        }
    }

    /// Current temperature for `city` under a `fetchTemperature` span
    /// parented on `parent`.
    pub async fn current_celsius(
        &self,
        city: &str,
        parent: &Context,
    ) -> Result<WeatherReading, WeatherError> {
        let cx = self
            .telemetry
            .start_span("fetchTemperature", SpanKind::Client, parent);
        let result = self.fetch(city, &cx).await;

        match &result {
            Ok(reading) => {
                cx.span().set_attribute(KeyValue::new("weather.temp_c", reading.celsius));
                cx.span()
                    .set_attribute(KeyValue::new("weather.simulated", reading.is_simulated()));
                cx.span().end();
            }
            Err(e) => fail_span(&cx, e.to_string()),
        }
        result
    }

    async fn fetch(&self, city: &str, cx: &Context) -> Result<WeatherReading, WeatherError> {
        let response = self
            .http
            .get(&self.url)
            .query(&[("key", self.api_key.as_str()), ("q", city), ("aqi", "no")])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(city, kind = classify(&e).as_str(), error = %e, "Weather request failed");
                WeatherError::Transport(e)
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let celsius = simulated_celsius(city);
            tracing::warn!(
                city,
                status = status.as_u16(),
                celsius,
                "Weather provider returned an error status, using simulated temperature"
            );
            record_fallback(cx, "status");
            return Ok(WeatherReading {
                celsius,
                source: ReadingSource::FallbackStatus,
            });
        }

        let body = response.bytes().await.map_err(WeatherError::Transport)?;

        match serde_json::from_slice::<CurrentPayload>(&body) {
            Ok(payload) => Ok(WeatherReading {
                celsius: payload.current.temp_c,
                source: ReadingSource::Provider,
            }),
            Err(e) => {
                let celsius = simulated_celsius(city);
                tracing::warn!(
                    city,
                    error = %e,
                    celsius,
                    "Weather payload did not parse, using simulated temperature"
                );
                record_fallback(cx, "payload");
                Ok(WeatherReading {
                    celsius,
                    source: ReadingSource::FallbackPayload,
                })
            }
        }
    }
}

fn record_fallback(cx: &Context, reason: &'static str) {
    cx.span()
        .add_event("fallback", vec![KeyValue::new("reason", reason)]);
    metrics::record_weather_fallback(reason);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_value_counts_characters() {
        assert_eq!(simulated_celsius("Sao Paulo"), 29.0);
        // 10 bytes in UTF-8, 9 characters
        assert_eq!(simulated_celsius("São Paulo"), 29.0);
        assert_eq!(simulated_celsius(""), 20.0);
        // 15 characters wrap to zero
        assert_eq!(simulated_celsius("abcdefghijklmno"), 20.0);
    }

    #[test]
    fn payload_shape_matches_provider() {
        let body = r#"{"location":{"name":"Sao Paulo"},"current":{"temp_c":25.0,"temp_f":77.0}}"#;
        let payload: CurrentPayload = serde_json::from_str(body).unwrap();
        assert_eq!(payload.current.temp_c, 25.0);
    }

    #[test]
    fn payload_without_current_temperature_does_not_match() {
        for body in [
            r#"{"location":{"name":"Sao Paulo"}}"#,
            r#"{"current":{"temp_f":77.0}}"#,
            r#"{"current":{"temp_c":"25"}}"#,
        ] {
            assert!(serde_json::from_str::<CurrentPayload>(body).is_err(), "{body}");
        }
    }

    #[test]
    fn provider_reading_is_not_simulated() {
        let reading = WeatherReading {
            celsius: 1.0,
            source: ReadingSource::Provider,
        };
        assert!(!reading.is_simulated());
        let reading = WeatherReading {
            celsius: 1.0,
            source: ReadingSource::FallbackPayload,
        };
        assert!(reading.is_simulated());
    }
}
