//! Postal code → city resolution.

use opentelemetry::{
    trace::{SpanKind, TraceContextExt},
    Context, KeyValue,
};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::PostalCode;
use crate::observability::tracing::{fail_span, Telemetry};
use crate::resilience::classify;

/// Outcome of a failed lookup. `NotFound` is distinct from infrastructure
/// trouble so callers can answer 404 instead of 500.
#[derive(Debug, Error)]
pub enum PostalError {
    #[error("CEP not found")]
    NotFound,

    #[error("postal lookup request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("postal lookup returned malformed JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct LookupPayload {
    #[serde(default)]
    localidade: Option<String>,
    #[serde(default)]
    erro: Option<serde_json::Value>,
}

/// The provider flags unknown codes with `"erro": "true"` (sometimes `"True"`).
/// Any other value, including non-strings, means found.
fn is_not_found(indicator: Option<&serde_json::Value>) -> bool {
    matches!(indicator, Some(serde_json::Value::String(s)) if s == "true" || s == "True")
}

/// Decode a lookup response body into the city name.
///
/// An empty `localidade` without an error flag is returned as-is.
pub fn parse_lookup(body: &[u8]) -> Result<String, PostalError> {
    let payload: LookupPayload = serde_json::from_slice(body).map_err(PostalError::Decode)?;
    if is_not_found(payload.erro.as_ref()) {
        return Err(PostalError::NotFound);
    }
    Ok(payload.localidade.unwrap_or_default())
}

/// Client for the postal-lookup provider.
#[derive(Clone)]
pub struct PostalClient {
    http: reqwest::Client,
    base_url: String,
    telemetry: Telemetry,
}

impl PostalClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, telemetry: Telemetry) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            telemetry,
        }
    }

    fn lookup_url(&self, cep: &PostalCode) -> String {
        format!("{}/{}/json/", self.base_url.trim_end_matches('/'), cep)
    }

    /// Resolve `cep` to a city under a `fetchCEP` span parented on `parent`.
    pub async fn resolve(&self, cep: &PostalCode, parent: &Context) -> Result<String, PostalError> {
        let cx = self.telemetry.start_span("fetchCEP", SpanKind::Client, parent);
        let result = self.fetch(cep).await;

        match &result {
            Ok(city) => {
                cx.span().set_attribute(KeyValue::new("cep.city", city.clone()));
                cx.span().end();
            }
            Err(PostalError::NotFound) => {
                cx.span().add_event("not_found", vec![KeyValue::new("cep", cep.to_string())]);
                cx.span().end();
            }
            Err(e) => fail_span(&cx, e.to_string()),
        }
        result
    }

    async fn fetch(&self, cep: &PostalCode) -> Result<String, PostalError> {
        let url = self.lookup_url(cep);
        tracing::debug!(%cep, %url, "Looking up postal code");

        let response = self.http.get(&url).send().await.map_err(|e| {
            tracing::warn!(%cep, kind = classify(&e).as_str(), error = %e, "Postal lookup failed");
            PostalError::Transport(e)
        })?;
        let body = response.bytes().await.map_err(PostalError::Transport)?;

        parse_lookup(&body)
    }
}
