//! Timeout enforcement for outbound HTTP calls.
//!
//! A timed-out call is indistinguishable from any other transport failure to
//! callers; `classify` exists only so logs can say which one happened.

use std::time::Duration;

/// Build the shared outbound client. Every request it sends is bounded by
/// `timeout`, covering connect, send and body read.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(concat!("cep-weather/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Coarse reason an outbound call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Connect,
    Body,
    Other,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Connect => "connect",
            FailureKind::Body => "body",
            FailureKind::Other => "other",
        }
    }
}

/// Classify a transport error for logging.
pub fn classify(err: &reqwest::Error) -> FailureKind {
    if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_connect() {
        FailureKind::Connect
    } else if err.is_body() || err.is_decode() {
        FailureKind::Body
    } else {
        FailureKind::Other
    }
}
