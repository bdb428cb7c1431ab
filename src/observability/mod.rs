//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, histograms)
//!     → tracing.rs (OpenTelemetry spans, W3C context propagation)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//!     → OTLP collector (spans from both services share one trace)
//! ```
//!
//! # Design Decisions
//! - The tracer is handed to handlers explicitly; no global provider is read on
//!   the request path
//! - Propagation uses W3C `traceparent`/`tracestate` headers
//! - Exporting can be turned off while spans keep being created and propagated

pub mod logging;
pub mod metrics;
pub mod tracing;

pub use self::tracing::{init_tracer_provider, shutdown_tracer_provider, Telemetry, TelemetryError};
