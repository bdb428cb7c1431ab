//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound call (aggregator, postal provider, weather provider):
//!     → timeouts.rs (client with a fixed deadline per call)
//!     → on timeout: surfaced as a transport failure
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Every call is attempted exactly once; there is no retry layer

pub mod timeouts;

pub use timeouts::{build_client, classify, FailureKind};
