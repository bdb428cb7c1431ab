//! Request identification.
//!
//! # Responsibilities
//! - Generate a request ID (UUID v4) when the caller did not send one
//! - Echo it back on the response
//! - Expose it so the gateway can forward it to the aggregator
//!
//! # Design Decisions
//! - Request ID added as early as possible, before the trace layer logs
//! - Correlation across services relies on trace context; the request ID is a
//!   convenience for log search

use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let value = HeaderValue::from_str(&Uuid::new_v4().to_string()).ok()?;
        Some(RequestId::new(value))
    }
}

/// Request ID carried by `headers`, if any.
pub fn request_id(headers: &HeaderMap) -> Option<&HeaderValue> {
    headers.get(&X_REQUEST_ID)
}
