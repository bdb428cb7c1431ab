//! CEP → temperature services with distributed tracing.

pub mod config;
pub mod domain;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod upstream;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::{ServiceKind, Shutdown};
