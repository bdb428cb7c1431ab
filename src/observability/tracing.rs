//! Distributed tracing support.
//!
//! # Responsibilities
//! - Build the per-process tracer provider (OTLP export, `service.name`)
//! - Extract trace context from incoming request headers
//! - Inject trace context into outbound request headers
//! - Start and finish spans for handler operations
//!
//! # Design Decisions
//! - One provider per process, built before the listener and shut down after it
//! - `Telemetry` is cloned into handler state instead of read from a global
//! - W3C Trace Context only; baggage is not carried

use std::borrow::Cow;

use axum::http::{HeaderMap, StatusCode};
use opentelemetry::{
    propagation::TextMapPropagator,
    trace::{SpanKind, Status, TraceContextExt, Tracer, TracerProvider as _},
    Context, KeyValue,
};
use opentelemetry_http::{HeaderExtractor, HeaderInjector};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    propagation::TraceContextPropagator,
    trace::{Sampler, SdkTracer, SdkTracerProvider},
    Resource,
};
use thiserror::Error;

use crate::config::ObservabilityConfig;

/// Span attribute carrying the response status code.
pub const HTTP_RESPONSE_STATUS_CODE: &str = "http.response.status_code";

/// Errors raised while setting up the tracing pipeline.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to build OTLP span exporter: {0}")]
    Exporter(#[from] opentelemetry_otlp::ExporterBuildError),
}

/// Build the tracer provider for one service.
///
/// With `tracing_enabled` the provider batches spans to the OTLP/gRPC collector;
/// otherwise it has no exporter, but spans still get real ids so context keeps
/// flowing across the hop. Must be called inside the Tokio runtime.
pub fn init_tracer_provider(
    config: &ObservabilityConfig,
    service_name: &str,
) -> Result<SdkTracerProvider, TelemetryError> {
    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    let mut builder = SdkTracerProvider::builder()
        .with_sampler(Sampler::AlwaysOn)
        .with_resource(resource);

    if config.tracing_enabled {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(config.otlp_endpoint.clone())
            .build()?;
        builder = builder.with_batch_exporter(exporter);
        tracing::info!(
            service = service_name,
            endpoint = %config.otlp_endpoint,
            "OTLP span export enabled"
        );
    } else {
        tracing::info!(service = service_name, "Span export disabled");
    }

    Ok(builder.build())
}

/// Flush pending spans and shut the provider down.
pub fn shutdown_tracer_provider(provider: &SdkTracerProvider) {
    if let Err(e) = provider.force_flush() {
        tracing::warn!(error = %e, "Failed to flush spans");
    }
    if let Err(e) = provider.shutdown() {
        tracing::warn!(error = %e, "Tracer provider shutdown failed");
    }
}

/// Span factory and propagator shared by every handler of a service.
#[derive(Clone)]
pub struct Telemetry {
    tracer: SdkTracer,
    propagator: TraceContextPropagator,
}

impl Telemetry {
    /// Take a tracer named `scope` from `provider`.
    pub fn new(provider: &SdkTracerProvider, scope: impl Into<Cow<'static, str>>) -> Self {
        Self {
            tracer: provider.tracer(scope),
            propagator: TraceContextPropagator::new(),
        }
    }

    /// Read the caller's context from inbound headers.
    ///
    /// Returns an empty context when no valid `traceparent` is present, so the
    /// next span starts a new trace.
    pub fn extract(&self, headers: &HeaderMap) -> Context {
        self.propagator.extract(&HeaderExtractor(headers))
    }

    /// Write `cx`'s active span into outbound headers.
    pub fn inject(&self, cx: &Context, headers: &mut HeaderMap) {
        self.propagator.inject_context(cx, &mut HeaderInjector(headers));
    }

    /// Start a span as a child of `parent` and return a context holding it.
    pub fn start_span(&self, name: &'static str, kind: SpanKind, parent: &Context) -> Context {
        let span = self
            .tracer
            .span_builder(name)
            .with_kind(kind)
            .start_with_context(&self.tracer, parent);
        parent.with_span(span)
    }
}

/// Record the response status on the span held by `cx` and end it.
pub fn finish_span(cx: &Context, status: StatusCode) {
    let span = cx.span();
    span.set_attribute(KeyValue::new(
        HTTP_RESPONSE_STATUS_CODE,
        i64::from(status.as_u16()),
    ));
    if status.is_server_error() {
        span.set_status(Status::error(status.to_string()));
    }
    span.end();
}

/// Mark the span held by `cx` as failed with `message` and end it.
pub fn fail_span(cx: &Context, message: String) {
    let span = cx.span();
    span.set_status(Status::error(message));
    span.end();
}

/// Hex trace id of the span held by `cx`, for log correlation.
pub fn trace_id(cx: &Context) -> String {
    cx.span().span_context().trace_id().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::{SpanId, TraceId};
    use opentelemetry_sdk::trace::InMemorySpanExporter;

    fn test_telemetry() -> (Telemetry, InMemorySpanExporter, SdkTracerProvider) {
        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        (Telemetry::new(&provider, "test"), exporter, provider)
    }

    #[test]
    fn extract_without_headers_yields_invalid_context() {
        let (telemetry, _, _provider) = test_telemetry();
        let cx = telemetry.extract(&HeaderMap::new());
        assert!(!cx.span().span_context().is_valid());
    }

    #[test]
    fn extract_reads_traceparent() {
        let (telemetry, _, _provider) = test_telemetry();
        let mut headers = HeaderMap::new();
        headers.insert(
            "traceparent",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"
                .parse()
                .unwrap(),
        );

        let cx = telemetry.extract(&headers);
        let sc = cx.span().span_context().clone();
        assert!(sc.is_remote());
        assert!(sc.is_sampled());
        assert_eq!(
            sc.trace_id(),
            TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap()
        );
        assert_eq!(sc.span_id(), SpanId::from_hex("00f067aa0ba902b7").unwrap());
    }

    #[test]
    fn injected_context_round_trips_into_child_span() {
        let (telemetry, exporter, _provider) = test_telemetry();

        let client_cx = telemetry.start_span("client", SpanKind::Client, &Context::new());
        let mut headers = HeaderMap::new();
        telemetry.inject(&client_cx, &mut headers);
        assert!(headers.contains_key("traceparent"));

        let server_parent = telemetry.extract(&headers);
        let server_cx = telemetry.start_span("server", SpanKind::Server, &server_parent);
        finish_span(&server_cx, StatusCode::OK);
        finish_span(&client_cx, StatusCode::OK);

        let spans = exporter.get_finished_spans().unwrap();
        let server = spans.iter().find(|s| s.name == "server").unwrap();
        let client = spans.iter().find(|s| s.name == "client").unwrap();
        assert_eq!(server.span_context.trace_id(), client.span_context.trace_id());
        assert_eq!(server.parent_span_id, client.span_context.span_id());
    }

    #[test]
    fn finish_span_marks_server_errors() {
        let (telemetry, exporter, _provider) = test_telemetry();

        let cx = telemetry.start_span("op", SpanKind::Internal, &Context::new());
        finish_span(&cx, StatusCode::INTERNAL_SERVER_ERROR);

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans.len(), 1);
        assert!(matches!(spans[0].status, Status::Error { .. }));
        assert!(spans[0]
            .attributes
            .iter()
            .any(|kv| kv.key.as_str() == HTTP_RESPONSE_STATUS_CODE
                && kv.value == opentelemetry::Value::I64(500)));
    }
}
