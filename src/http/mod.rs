//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! client
//!     → server.rs (middleware: request ID, timeout, access trace)
//!     → gateway.rs (POST {"cep"} → validate → inject context → GET aggregator)
//!     → [network hop, traceparent header]
//!     → server.rs (same middleware in the aggregator process)
//!     → aggregator.rs (extract context → postal lookup → weather → convert)
//!     → response.rs (JSON payload or {"message"} envelope)
//! ```

pub mod aggregator;
pub mod gateway;
pub mod request;
pub mod response;
pub mod server;

pub use aggregator::AggregatorState;
pub use gateway::GatewayState;
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::ErrorResponse;
pub use server::HttpServer;
