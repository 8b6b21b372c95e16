//! Prediction parameters, results and persisted records.
//!
//! Parameters are resolved in three tiers: explicit request values win,
//! then values fetched by enrichment, then the engine defaults in
//! [`parameter_defaults`]. [`PredictionParameters`] holds whatever is known
//! so far; [`ResolvedParameters`] is the fully concrete set the engine runs on.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::geojson::Polygon;

/// Model type tag stored on every wildfire prediction record.
pub const MODEL_TYPE_WILDFIRE: &str = "wildfire";

/// Confidence recorded when a result carries no `model_confidence` factor.
pub const DEFAULT_RECORD_CONFIDENCE: f64 = 0.7;

/// Key of the aggregate score inside [`PredictionResult::confidence_factors`].
pub const MODEL_CONFIDENCE_KEY: &str = "model_confidence";

/// Engine fallbacks for parameters nobody supplied.
pub mod parameter_defaults {
    /// Wind speed (km/h).
    pub const WIND_SPEED: f64 = 10.0;
    /// Wind direction (degrees).
    pub const WIND_DIRECTION: f64 = 0.0;
    /// Vegetation density (0-1).
    pub const VEGETATION_DENSITY: f64 = 0.5;
    /// Temperature (°C).
    pub const TEMPERATURE: f64 = 20.0;
    /// Relative humidity (%).
    pub const HUMIDITY: f64 = 50.0;
    /// Forecast horizon (hours).
    pub const FORECAST_HOURS: u32 = 6;

    /// Accepted forecast horizon.
    pub const FORECAST_HOURS_RANGE: std::ops::RangeInclusive<u32> = 1..=72;
}

// ============================================================================
// Parameters
// ============================================================================

/// Partially known prediction inputs. `None` means "not provided".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionParameters {
    /// Wind speed (km/h, >= 0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    /// Wind direction (degrees 0-360, direction the wind blows from).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_direction: Option<f64>,
    /// Vegetation density (0-1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vegetation_density: Option<f64>,
    /// Temperature (°C).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Relative humidity (%, 0-100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    /// Forecast horizon (hours, 1-72).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_hours: Option<u32>,
}

impl PredictionParameters {
    /// True when both wind fields were supplied.
    pub const fn has_wind(&self) -> bool {
        self.wind_speed.is_some() && self.wind_direction.is_some()
    }

    /// Fill every missing field with the engine default.
    pub fn resolve(&self) -> ResolvedParameters {
        use parameter_defaults as d;
        ResolvedParameters {
            wind_speed: self.wind_speed.unwrap_or(d::WIND_SPEED),
            wind_direction: self.wind_direction.unwrap_or(d::WIND_DIRECTION),
            vegetation_density: self.vegetation_density.unwrap_or(d::VEGETATION_DENSITY),
            temperature: self.temperature.unwrap_or(d::TEMPERATURE),
            humidity: self.humidity.unwrap_or(d::HUMIDITY),
            forecast_hours: self.forecast_hours.unwrap_or(d::FORECAST_HOURS),
        }
    }

    /// Range-check every supplied field. All violations are reported together.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        check_range(self.wind_speed, "wind_speed", 0.0, f64::INFINITY, &mut errors);
        check_range(self.wind_direction, "wind_direction", 0.0, 360.0, &mut errors);
        check_range(self.vegetation_density, "vegetation_density", 0.0, 1.0, &mut errors);
        check_range(self.temperature, "temperature", f64::NEG_INFINITY, f64::INFINITY, &mut errors);
        check_range(self.humidity, "humidity", 0.0, 100.0, &mut errors);

        if let Some(hours) = self.forecast_hours {
            if !parameter_defaults::FORECAST_HOURS_RANGE.contains(&hours) {
                errors.push(format!("forecast_hours must be within 1..=72, got {hours}"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_range(value: Option<f64>, name: &str, min: f64, max: f64, errors: &mut Vec<String>) {
    let Some(v) = value else { return };
    if !v.is_finite() {
        errors.push(format!("{name} must be a finite number, got {v}"));
    } else if v < min || v > max {
        let bounds = match (min.is_finite(), max.is_finite()) {
            (true, true) => format!("within {min}..={max}"),
            (true, false) => format!(">= {min}"),
            (false, true) => format!("<= {max}"),
            (false, false) => "finite".to_string(),
        };
        errors.push(format!("{name} must be {bounds}, got {v}"));
    }
}

/// The concrete parameter set a prediction ran with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedParameters {
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub vegetation_density: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub forecast_hours: u32,
}

impl Default for ResolvedParameters {
    fn default() -> Self {
        PredictionParameters::default().resolve()
    }
}

/// Which resolution tier supplied a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterSource {
    Explicit,
    Enriched,
    Default,
}

// ============================================================================
// Request
// ============================================================================

/// Wildfire prediction request as received from the routing layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WildfirePredictionRequest {
    pub event_id: String,
    #[serde(flatten)]
    pub parameters: PredictionParameters,
}

impl WildfirePredictionRequest {
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            parameters: PredictionParameters::default(),
        }
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = match self.parameters.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => errors,
        };
        if self.event_id.trim().is_empty() {
            errors.insert(0, "event_id must not be empty".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// ============================================================================
// Result + Record
// ============================================================================

/// Output of a spread model. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Closed GeoJSON polygon of the predicted burned area.
    pub predicted_perimeter: Polygon,
    pub spread_distance_km: f64,
    pub area_affected_km2: f64,
    /// Infrastructure at risk. `None` means unknown.
    pub at_risk_infrastructure: Option<Vec<serde_json::Value>>,
    /// Population at risk. `None` means unknown.
    pub at_risk_population: Option<u64>,
    /// Named 0-1 sub-scores, including the aggregate `model_confidence`.
    pub confidence_factors: BTreeMap<String, f64>,
}

impl PredictionResult {
    pub fn model_confidence(&self) -> Option<f64> {
        self.confidence_factors.get(MODEL_CONFIDENCE_KEY).copied()
    }
}

/// Audit data stored next to each prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionMetadata {
    pub model_name: String,
    pub model_version: String,
    pub parameters_used: ResolvedParameters,
    pub parameter_sources: BTreeMap<String, ParameterSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_conditions: Option<String>,
}

/// A persisted prediction. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction_id: String,
    pub event_id: String,
    pub model_type: String,
    pub forecast_hours: u32,
    pub generated_at: DateTime<Utc>,
    pub confidence: f64,
    pub result: PredictionResult,
    pub metadata: PredictionMetadata,
}
