//! Aggregator handler (service B).
//!
//! `GET /{cep}` → postal lookup → weather lookup → converted temperatures.
//! The caller's trace context is extracted before the handler span starts, so
//! the whole subtree hangs off the gateway's outbound span.

use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use opentelemetry::{
    trace::{SpanKind, TraceContextExt},
    Context, KeyValue,
};

use crate::config::ServiceConfig;
use crate::domain::{PostalCode, TemperatureResponse};
use crate::http::response::{
    error_response, method_not_allowed, ERROR_FETCHING_CEP, ERROR_FETCHING_TEMPERATURE,
    INVALID_ZIPCODE, ZIPCODE_NOT_FOUND,
};
use crate::observability::metrics;
use crate::observability::tracing::{finish_span, trace_id, Telemetry};
use crate::resilience::build_client;
use crate::upstream::{PostalClient, PostalError, WeatherClient};

const SERVICE: &str = "aggregator";

/// Aggregator state injected into the handler.
#[derive(Clone)]
pub struct AggregatorState {
    postal: PostalClient,
    weather: WeatherClient,
    telemetry: Telemetry,
}

impl AggregatorState {
    pub fn new(postal: PostalClient, weather: WeatherClient, telemetry: Telemetry) -> Self {
        Self {
            postal,
            weather,
            telemetry,
        }
    }

    /// Build both provider clients from configuration. They share one
    /// connection pool and the outbound timeout.
    pub fn from_config(config: &ServiceConfig, telemetry: Telemetry) -> Result<Self, reqwest::Error> {
        let http = build_client(Duration::from_secs(config.timeouts.outbound_secs))?;
        let upstream = &config.upstream;
        if upstream.weather_api_key.is_empty() {
            tracing::warn!("No weather API key configured; readings will be simulated");
        }

        let postal = PostalClient::new(http.clone(), &upstream.postal_base_url, telemetry.clone());
        let weather = WeatherClient::new(
            http,
            &upstream.weather_url,
            &upstream.weather_api_key,
            telemetry.clone(),
        );
        Ok(Self::new(postal, weather, telemetry))
    }
}

/// Every path is served by the handler; the path is the CEP.
pub fn router(state: AggregatorState) -> Router {
    Router::new().fallback(handle_temperature).with_state(state)
}

async fn handle_temperature(
    State(state): State<AggregatorState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let start = Instant::now();
    let parent = state.telemetry.extract(&headers);
    let cx = state
        .telemetry
        .start_span("handleTemperature", SpanKind::Server, &parent);

    let response = process(&state, &cx, &method, &uri).await;

    finish_span(&cx, response.status());
    metrics::record_request(SERVICE, response.status().as_u16(), start);
    response
}

async fn process(state: &AggregatorState, cx: &Context, method: &Method, uri: &Uri) -> Response {
    if method != Method::GET {
        return method_not_allowed();
    }

    let raw = uri.path().strip_prefix('/').unwrap_or(uri.path());
    let cep = match PostalCode::parse(raw) {
        Ok(cep) => cep,
        Err(_) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, INVALID_ZIPCODE),
    };
    cx.span().set_attribute(KeyValue::new("cep", cep.to_string()));

    let city = match state.postal.resolve(&cep, cx).await {
        Ok(city) => city,
        Err(PostalError::NotFound) => {
            tracing::info!(%cep, "Postal code not found");
            return error_response(StatusCode::NOT_FOUND, ZIPCODE_NOT_FOUND);
        }
        Err(e) => {
            tracing::error!(%cep, trace_id = %trace_id(cx), error = %e, "Error fetching CEP");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, ERROR_FETCHING_CEP);
        }
    };

    // TODO: decide whether an empty locality should map to 404; it is passed
    // through to the weather lookup for now.
    if city.is_empty() {
        tracing::warn!(%cep, "Postal lookup returned an empty locality");
    }

    let reading = match state.weather.current_celsius(&city, cx).await {
        Ok(reading) => reading,
        Err(e) => {
            tracing::error!(
                %cep,
                city = %city,
                trace_id = %trace_id(cx),
                error = %e,
                "Error fetching temperature"
            );
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, ERROR_FETCHING_TEMPERATURE);
        }
    };

    tracing::debug!(
        %cep,
        city = %city,
        celsius = reading.celsius,
        simulated = reading.is_simulated(),
        "Temperature resolved"
    );
    (
        StatusCode::OK,
        Json(TemperatureResponse::from_celsius(city, reading.celsius)),
    )
        .into_response()
}
