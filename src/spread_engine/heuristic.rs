//! Rule-based wildfire spread model.
//!
//! A deterministic stand-in for a trained model: wind drives an elliptical
//! perimeter, vegetation scales the spread distance, and temperature and
//! humidity nudge a bounded confidence score.

use std::collections::BTreeMap;

use super::anchor::SpatialAnchor;
use super::geometry::{build_spread_polygon, estimate_area, BASE_SPREAD_RATE};
use super::SpreadModel;
use crate::types::{PredictionResult, ResolvedParameters, MODEL_CONFIDENCE_KEY};

pub const MODEL_NAME: &str = "wildfire_heuristic_v1";
pub const MODEL_VERSION: &str = "1.0.0";

/// Confidence tuning. Order of application matters for reproducibility.
pub mod confidence {
    pub const BASE: f64 = 0.7;
    pub const VEGETATION_WEIGHT: f64 = 0.1;
    pub const STEP: f64 = 0.1;
    pub const HOT_ABOVE_C: f64 = 30.0;
    pub const COLD_BELOW_C: f64 = 10.0;
    pub const DRY_BELOW_PCT: f64 = 30.0;
    pub const HUMID_ABOVE_PCT: f64 = 70.0;
    pub const MIN: f64 = 0.5;
    pub const MAX: f64 = 0.9;

    /// Fixed placeholder until wind inputs carry a quality signal.
    pub const WIND_QUALITY: f64 = 0.8;
}

/// The heuristic spread model. Stateless; cheap to share.
#[derive(Debug, Clone, Copy, Default)]
pub struct WildfireHeuristicModel;

impl WildfireHeuristicModel {
    pub const fn new() -> Self {
        Self
    }
}

impl SpreadModel for WildfireHeuristicModel {
    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn model_version(&self) -> &str {
        MODEL_VERSION
    }

    fn predict(&self, center: SpatialAnchor, params: &ResolvedParameters) -> PredictionResult {
        let model_confidence =
            aggregate_confidence(params.vegetation_density, params.temperature, params.humidity);

        let predicted_perimeter = build_spread_polygon(
            center.lon,
            center.lat,
            params.wind_speed,
            params.wind_direction,
            params.forecast_hours,
        );
        let area_affected_km2 = estimate_area(&predicted_perimeter);

        let spread_distance_km = BASE_SPREAD_RATE
            * params.wind_speed
            * f64::from(params.forecast_hours)
            * (1.0 + params.vegetation_density);

        let mut confidence_factors =
            confidence_breakdown(params.vegetation_density, params.temperature, params.humidity);
        confidence_factors.insert(MODEL_CONFIDENCE_KEY.to_string(), model_confidence);

        PredictionResult {
            predicted_perimeter,
            spread_distance_km,
            area_affected_km2,
            at_risk_infrastructure: None,
            at_risk_population: None,
            confidence_factors,
        }
    }
}

/// Aggregate confidence in `[0.5, 0.9]`.
///
/// Exactly 30 °C / 10 °C and 30 % / 70 % humidity fall through unchanged.
pub fn aggregate_confidence(vegetation_density: f64, temperature: f64, humidity: f64) -> f64 {
    use confidence::*;

    let mut score = BASE;
    score += vegetation_density * VEGETATION_WEIGHT;

    if temperature > HOT_ABOVE_C {
        score += STEP;
    } else if temperature < COLD_BELOW_C {
        score -= STEP;
    }

    if humidity < DRY_BELOW_PCT {
        score += STEP;
    } else if humidity > HUMID_ABOVE_PCT {
        score -= STEP;
    }

    score.clamp(MIN, MAX)
}

/// Per-factor sub-scores, excluding the aggregate.
fn confidence_breakdown(vegetation_density: f64, temperature: f64, humidity: f64) -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("wind_quality".to_string(), confidence::WIND_QUALITY),
        ("vegetation_quality".to_string(), 0.6 + vegetation_density * 0.4),
        ("temperature_impact".to_string(), ((temperature - 10.0) / 30.0).clamp(0.0, 1.0)),
        ("humidity_impact".to_string(), ((100.0 - humidity) / 70.0).clamp(0.0, 1.0)),
    ])
}
