//! Domain types shared by both services.
//!
//! # Data Flow
//! ```text
//! raw CEP string
//!     → postal_code.rs (8-digit validation, PostalCode newtype)
//!     → [upstream lookups resolve city + Celsius reading]
//!     → temperature.rs (derive °F and K, assemble response payload)
//! ```
//!
//! # Design Decisions
//! - Celsius is the only stored reading; other scales are derived on output
//! - A PostalCode can only be built through validation

pub mod postal_code;
pub mod temperature;

pub use postal_code::{is_valid_postal_code, InvalidPostalCode, PostalCode};
pub use temperature::{celsius_to_fahrenheit, celsius_to_kelvin, TemperatureResponse};
