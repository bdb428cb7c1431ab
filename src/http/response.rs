//! Response construction shared by both services.
//!
//! # Responsibilities
//! - Single-field error envelope (`{"message": ...}`)
//! - Fixed client-facing messages
//! - Plain-text 405 for wrong methods
//!
//! # Design Decisions
//! - Handlers build one `Response` value per request, so a success payload and an
//!   error payload can never both be written
//! - Messages are part of the external contract and must not change

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

pub const INVALID_REQUEST_BODY: &str = "invalid request body";
pub const INVALID_ZIPCODE: &str = "invalid zipcode";
pub const ZIPCODE_NOT_FOUND: &str = "can not find zipcode";
pub const ERROR_FETCHING_CEP: &str = "error fetching CEP";
pub const ERROR_FETCHING_TEMPERATURE: &str = "error fetching temperature";
pub const ERROR_CALLING_AGGREGATOR: &str = "error calling service B";

/// Error payload returned on every failure path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// JSON error response with the given status.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            message: message.to_string(),
        }),
    )
        .into_response()
}

/// Plain-text 405.
pub fn method_not_allowed() -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response()
}
