//! Clients for the external providers the aggregator depends on.
//!
//! # Data Flow
//! ```text
//! PostalCode
//!     → postal.rs  (GET {base}/{cep}/json/  → city | NotFound | failure)
//!     → weather.rs (GET {url}?key=&q=city&aqi=no → Celsius | simulated | failure)
//! ```
//!
//! # Design Decisions
//! - Each call runs under its own child span of the handler span
//! - Trace headers are not sent to third-party providers
//! - One attempt per call, bounded by the shared client's timeout

pub mod postal;
pub mod weather;

pub use postal::{PostalClient, PostalError};
pub use weather::{simulated_celsius, ReadingSource, WeatherClient, WeatherError, WeatherReading};
