//! Weather snapshot returned by the enrichment layer.

use serde::{Deserialize, Serialize};

/// Current conditions at a coordinate, already converted to model units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Air temperature (°C). Absent when the provider omitted it.
    pub temperature: Option<f64>,
    /// Relative humidity (%). Absent when the provider omitted it.
    pub humidity: Option<f64>,
    /// Wind speed (km/h).
    pub wind_speed: f64,
    /// Wind direction (degrees, meteorological "from" convention).
    pub wind_direction: f64,
    /// Provider condition label, e.g. `"Clear"`.
    pub conditions: String,
}
