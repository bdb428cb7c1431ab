//! Gateway handler (service A).
//!
//! Validates a JSON-submitted CEP and forwards it to the aggregator, carrying
//! the trace context across the hop. The aggregator's status and body are
//! relayed unchanged.
//!
//! Each request starts a new trace: `traceparent` sent by callers is ignored,
//! so clients cannot choose trace ids.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use opentelemetry::{
    trace::{SpanKind, TraceContextExt},
    Context, KeyValue,
};
use serde::Deserialize;
use thiserror::Error;

use crate::config::ServiceConfig;
use crate::domain::PostalCode;
use crate::http::request::{request_id, X_REQUEST_ID};
use crate::http::response::{
    error_response, method_not_allowed, ERROR_CALLING_AGGREGATOR, INVALID_REQUEST_BODY,
    INVALID_ZIPCODE,
};
use crate::observability::metrics;
use crate::observability::tracing::{fail_span, finish_span, trace_id, Telemetry};
use crate::resilience::{build_client, classify};

const SERVICE: &str = "gateway";

/// Inbound request body.
#[derive(Debug, Default, Deserialize)]
pub struct CepRequest {
    /// Missing field decodes to an empty string and then fails validation.
    #[serde(default)]
    pub cep: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("aggregator request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

/// Gateway state injected into the handler.
#[derive(Clone)]
pub struct GatewayState {
    client: reqwest::Client,
    aggregator_url: Arc<str>,
    telemetry: Telemetry,
}

impl GatewayState {
    pub fn new(client: reqwest::Client, aggregator_url: &str, telemetry: Telemetry) -> Self {
        Self {
            client,
            aggregator_url: Arc::from(aggregator_url.trim_end_matches('/')),
            telemetry,
        }
    }

    /// Build state from configuration, with the outbound timeout applied.
    pub fn from_config(config: &ServiceConfig, telemetry: Telemetry) -> Result<Self, reqwest::Error> {
        let client = build_client(std::time::Duration::from_secs(config.timeouts.outbound_secs))?;
        Ok(Self::new(client, &config.gateway.aggregator_url, telemetry))
    }
}

/// Every path is served by the handler.
pub fn router(state: GatewayState) -> Router {
    Router::new().fallback(handle_cep).with_state(state)
}

async fn handle_cep(
    State(state): State<GatewayState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let cx = state
        .telemetry
        .start_span("handleCEP", SpanKind::Server, &Context::new());

    let response = process(&state, &cx, &method, &headers, &body).await;

    finish_span(&cx, response.status());
    metrics::record_request(SERVICE, response.status().as_u16(), start);
    response
}

async fn process(
    state: &GatewayState,
    cx: &Context,
    method: &Method,
    headers: &HeaderMap,
    body: &[u8],
) -> Response {
    if method != Method::POST {
        return method_not_allowed();
    }

    // `null` is well-formed and decodes to an empty candidate.
    let request = match serde_json::from_slice::<Option<CepRequest>>(body) {
        Ok(r) => r.unwrap_or_default(),
        Err(e) => {
            tracing::debug!(error = %e, "Rejected request body");
            return error_response(StatusCode::BAD_REQUEST, INVALID_REQUEST_BODY);
        }
    };

    let cep = match PostalCode::parse(&request.cep) {
        Ok(cep) => cep,
        Err(_) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, INVALID_ZIPCODE),
    };
    cx.span().set_attribute(KeyValue::new("cep", cep.to_string()));

    match call_aggregator(state, cx, &cep, headers).await {
        Ok((status, body)) => (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(GatewayError::Upstream(e)) => {
            tracing::error!(
                %cep,
                trace_id = %trace_id(cx),
                kind = classify(&e).as_str(),
                error = %e,
                "Error calling aggregator"
            );
            error_response(StatusCode::INTERNAL_SERVER_ERROR, ERROR_CALLING_AGGREGATOR)
        }
    }
}

/// `GET {aggregator}/{cep}` under a `callServiceB` span whose context is
/// injected into the outbound headers.
async fn call_aggregator(
    state: &GatewayState,
    parent: &Context,
    cep: &PostalCode,
    inbound: &HeaderMap,
) -> Result<(StatusCode, Bytes), GatewayError> {
    let cx = state
        .telemetry
        .start_span("callServiceB", SpanKind::Client, parent);
    let url = format!("{}/{}", state.aggregator_url, cep);

    let mut headers = HeaderMap::new();
    state.telemetry.inject(&cx, &mut headers);
    if let Some(id) = request_id(inbound) {
        headers.insert(X_REQUEST_ID, id.clone());
    }

    let result = async {
        let response = state.client.get(&url).headers(headers).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok::<_, GatewayError>((status, body))
    }
    .await;

    match &result {
        Ok((status, _)) => finish_span(&cx, *status),
        Err(e) => fail_span(&cx, e.to_string()),
    }
    result
}
