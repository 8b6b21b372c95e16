//! Three-tier parameter resolution: explicit > enriched > default.

use std::collections::BTreeMap;

use crate::types::{ParameterSource, PredictionParameters, ResolvedParameters, WeatherSnapshot};

/// Outcome of resolution: concrete values plus where each came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Every field populated.
    pub parameters: PredictionParameters,
    pub resolved: ResolvedParameters,
    pub sources: BTreeMap<String, ParameterSource>,
    pub weather_conditions: Option<String>,
}

/// Accumulates parameter values tier by tier. Values already present are
/// never overwritten.
#[derive(Debug, Clone)]
pub struct ParameterResolver {
    params: PredictionParameters,
    sources: BTreeMap<String, ParameterSource>,
    weather_conditions: Option<String>,
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>, name: &str, sources: &mut BTreeMap<String, ParameterSource>) {
    if slot.is_none() {
        if let Some(v) = value {
            *slot = Some(v);
            sources.insert(name.to_string(), ParameterSource::Enriched);
        }
    }
}

impl ParameterResolver {
    /// Start from the caller's explicit values.
    pub fn new(explicit: &PredictionParameters) -> Self {
        let mut sources = BTreeMap::new();
        let p = explicit;
        for (name, present) in [
            ("wind_speed", p.wind_speed.is_some()),
            ("wind_direction", p.wind_direction.is_some()),
            ("vegetation_density", p.vegetation_density.is_some()),
            ("temperature", p.temperature.is_some()),
            ("humidity", p.humidity.is_some()),
            ("forecast_hours", p.forecast_hours.is_some()),
        ] {
            if present {
                sources.insert(name.to_string(), ParameterSource::Explicit);
            }
        }
        Self {
            params: explicit.clone(),
            sources,
            weather_conditions: None,
        }
    }

    /// Weather is only consulted when either wind field is missing.
    pub const fn needs_weather(&self) -> bool {
        !self.params.has_wind()
    }

    pub const fn needs_vegetation(&self) -> bool {
        self.params.vegetation_density.is_none()
    }

    /// Fill still-missing wind, temperature and humidity from a snapshot.
    pub fn apply_weather(&mut self, weather: &WeatherSnapshot) {
        let p = &mut self.params;
        let s = &mut self.sources;
        fill(&mut p.wind_speed, Some(weather.wind_speed), "wind_speed", s);
        fill(&mut p.wind_direction, Some(weather.wind_direction), "wind_direction", s);
        fill(&mut p.temperature, weather.temperature, "temperature", s);
        fill(&mut p.humidity, weather.humidity, "humidity", s);
        self.weather_conditions = Some(weather.conditions.clone());
    }

    pub fn apply_vegetation(&mut self, density: f64) {
        fill(
            &mut self.params.vegetation_density,
            Some(density),
            "vegetation_density",
            &mut self.sources,
        );
    }

    /// Fall back to engine defaults for anything still missing.
    pub fn finish(mut self) -> Resolution {
        let resolved = self.params.resolve();
        for name in [
            "wind_speed",
            "wind_direction",
            "vegetation_density",
            "temperature",
            "humidity",
            "forecast_hours",
        ] {
            self.sources
                .entry(name.to_string())
                .or_insert(ParameterSource::Default);
        }

        Resolution {
            parameters: PredictionParameters {
                wind_speed: Some(resolved.wind_speed),
                wind_direction: Some(resolved.wind_direction),
                vegetation_density: Some(resolved.vegetation_density),
                temperature: Some(resolved.temperature),
                humidity: Some(resolved.humidity),
                forecast_hours: Some(resolved.forecast_hours),
            },
            resolved,
            sources: self.sources,
            weather_conditions: self.weather_conditions,
        }
    }
}
