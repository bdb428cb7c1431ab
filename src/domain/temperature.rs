//! Temperature scale conversion and the aggregated response payload.

use serde::{Deserialize, Serialize};

/// `F = C * 1.8 + 32`.
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 1.8 + 32.0
}

/// `K = C + 273`. The offset is 273, not 273.15; clients depend on it.
pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + 273.0
}

/// Successful aggregator payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureResponse {
    pub city: String,
    #[serde(rename = "temp_C")]
    pub temp_c: f64,
    #[serde(rename = "temp_F")]
    pub temp_f: f64,
    #[serde(rename = "temp_K")]
    pub temp_k: f64,
}

impl TemperatureResponse {
    /// Build the payload from a single Celsius reading.
    pub fn from_celsius(city: impl Into<String>, celsius: f64) -> Self {
        Self {
            city: city.into(),
            temp_c: celsius,
            temp_f: celsius_to_fahrenheit(celsius),
            temp_k: celsius_to_kelvin(celsius),
        }
    }
}
