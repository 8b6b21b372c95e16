//! Prediction Orchestration Service
//!
//! Resolves parameters (explicit > enriched > default), runs the spread
//! model, assigns an id, persists the record, and answers lookups. Knows
//! nothing about HTTP; absence is `Ok(None)`, never a status code.

pub mod resolver;

pub use resolver::{ParameterResolver, Resolution};

use std::sync::Arc;

use chrono::Utc;
use futures::future::OptionFuture;
use tracing::{debug, info, warn};

use crate::enrichment::EnrichmentSource;
use crate::spread_engine::{SpatialAnchor, SpreadModel, SpreadModelError};
use crate::storage::{PredictionStore, StoreError};
use crate::types::{
    EventRecord, Prediction, PredictionMetadata, WildfirePredictionRequest,
    DEFAULT_RECORD_CONFIDENCE, MODEL_TYPE_WILDFIRE,
};

/// Orchestration errors
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<SpreadModelError> for PredictionError {
    fn from(e: SpreadModelError) -> Self {
        match e {
            SpreadModelError::InvalidInput(msg) => Self::InvalidInput(msg),
        }
    }
}

pub struct PredictionService {
    model: Arc<dyn SpreadModel>,
    enrichment: Arc<dyn EnrichmentSource>,
    store: Arc<dyn PredictionStore>,
}

impl PredictionService {
    pub fn new(
        model: Arc<dyn SpreadModel>,
        enrichment: Arc<dyn EnrichmentSource>,
        store: Arc<dyn PredictionStore>,
    ) -> Self {
        Self {
            model,
            enrichment,
            store,
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    pub fn model_version(&self) -> &str {
        self.model.model_version()
    }

    pub fn store_backend(&self) -> &'static str {
        self.store.backend_name()
    }

    pub fn prediction_count(&self) -> Result<usize, PredictionError> {
        Ok(self.store.len()?)
    }

    /// Generate, store and return a wildfire prediction for `event`.
    ///
    /// The caller has already checked that the event exists and is a
    /// wildfire. Enrichment failures never fail the prediction.
    pub async fn predict_wildfire(
        &self,
        request: &WildfirePredictionRequest,
        event: &EventRecord,
    ) -> Result<Prediction, PredictionError> {
        request
            .validate()
            .map_err(|errors| PredictionError::InvalidInput(errors.join("; ")))?;

        let prediction_id = uuid::Uuid::new_v4().to_string();
        let mut resolver = ParameterResolver::new(&request.parameters);

        let wants_weather = resolver.needs_weather();
        let wants_vegetation = resolver.needs_vegetation();
        let anchor = if wants_weather || wants_vegetation {
            match SpatialAnchor::from_geometry(&event.geometry) {
                Ok(anchor) => Some(anchor),
                Err(e) => {
                    // The model rejects the same geometry below.
                    warn!(event_id = %event.id, error = %e, "Cannot locate event, skipping enrichment");
                    None
                }
            }
        } else {
            None
        };

        if let Some(anchor) = anchor {
            let weather: OptionFuture<_> = wants_weather
                .then(|| self.enrichment.fetch_weather(anchor.lat, anchor.lon))
                .into();
            let vegetation: OptionFuture<_> = wants_vegetation
                .then(|| self.enrichment.fetch_vegetation_density(anchor.lat, anchor.lon))
                .into();
            let (weather, vegetation) = futures::join!(weather, vegetation);

            if let Some(snapshot) = weather.flatten() {
                debug!(event_id = %event.id, conditions = %snapshot.conditions, "Applying weather enrichment");
                resolver.apply_weather(&snapshot);
            }
            if let Some(density) = vegetation.flatten() {
                resolver.apply_vegetation(density);
            }
        }

        let resolution = resolver.finish();
        let result = self.model.predict_from_event(event, &resolution.parameters)?;

        let prediction = Prediction {
            prediction_id,
            event_id: request.event_id.clone(),
            model_type: MODEL_TYPE_WILDFIRE.to_string(),
            forecast_hours: resolution.resolved.forecast_hours,
            generated_at: Utc::now(),
            confidence: result.model_confidence().unwrap_or(DEFAULT_RECORD_CONFIDENCE),
            result,
            metadata: PredictionMetadata {
                model_name: self.model.model_name().to_string(),
                model_version: self.model.model_version().to_string(),
                parameters_used: resolution.resolved,
                parameter_sources: resolution.sources,
                weather_conditions: resolution.weather_conditions,
            },
        };

        self.store.insert(&prediction)?;

        info!(
            prediction_id = %prediction.prediction_id,
            event_id = %prediction.event_id,
            confidence = prediction.confidence,
            spread_km = prediction.result.spread_distance_km,
            "Wildfire prediction stored"
        );

        Ok(prediction)
    }

    pub fn get_prediction(&self, prediction_id: &str) -> Result<Option<Prediction>, PredictionError> {
        Ok(self.store.get(prediction_id)?)
    }

    /// Predictions for an event in the order they were created.
    pub fn get_predictions_for_event(&self, event_id: &str) -> Result<Vec<Prediction>, PredictionError> {
        Ok(self.store.list_by_event(event_id)?)
    }

    /// Release the enrichment session and flush the store. Safe to call
    /// more than once.
    pub async fn shutdown(&self) {
        self.enrichment.close().await;
        if let Err(e) = self.store.flush() {
            warn!(error = %e, backend = self.store.backend_name(), "Failed to flush prediction store");
        }
        info!("Prediction service shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spread_engine::WildfireHeuristicModel;
    use crate::storage::InMemoryPredictionStore;
    use crate::types::{Geometry, ParameterSource, PredictionParameters, WeatherSnapshot};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct StubEnrichment {
        weather: Option<WeatherSnapshot>,
        vegetation: Option<f64>,
        weather_calls: AtomicUsize,
        vegetation_calls: AtomicUsize,
        closes: AtomicUsize,
        last_coords: std::sync::Mutex<Option<(f64, f64)>>,
    }

    #[async_trait]
    impl EnrichmentSource for StubEnrichment {
        async fn fetch_weather(&self, lat: f64, lon: f64) -> Option<WeatherSnapshot> {
            self.weather_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_coords.lock().unwrap() = Some((lat, lon));
            self.weather.clone()
        }

        async fn fetch_vegetation_density(&self, _lat: f64, _lon: f64) -> Option<f64> {
            self.vegetation_calls.fetch_add(1, Ordering::SeqCst);
            self.vegetation
        }

        async fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn service(enrichment: Arc<StubEnrichment>) -> PredictionService {
        PredictionService::new(
            Arc::new(WildfireHeuristicModel),
            enrichment,
            Arc::new(InMemoryPredictionStore::new()),
        )
    }

    fn fire(id: &str) -> EventRecord {
        EventRecord::new(id, "wildfires", Geometry::point(-122.3321, 37.7749))
    }

    fn request(event_id: &str, params: PredictionParameters) -> WildfirePredictionRequest {
        WildfirePredictionRequest {
            event_id: event_id.to_string(),
            parameters: params,
        }
    }

    #[tokio::test]
    async fn test_reference_scenario_without_enrichment() {
        let stub = Arc::new(StubEnrichment::default());
        let svc = service(stub.clone());
        let params = PredictionParameters {
            wind_speed: Some(15.0),
            wind_direction: Some(270.0),
            vegetation_density: Some(0.5),
            temperature: Some(20.0),
            humidity: Some(50.0),
            forecast_hours: Some(6),
        };

        let p = svc.predict_wildfire(&request("e1", params), &fire("e1")).await.unwrap();

        assert!((p.result.spread_distance_km - 27.0).abs() < 1e-9);
        assert!((p.confidence - 0.75).abs() < 1e-9);
        assert_eq!(p.model_type, "wildfire");
        assert_eq!(p.forecast_hours, 6);
        assert_eq!(p.metadata.model_name, "wildfire_heuristic_v1");
        assert_eq!(p.metadata.model_version, "1.0.0");
        assert!(p.metadata.parameter_sources.values().all(|s| *s == ParameterSource::Explicit));
        assert!(uuid::Uuid::parse_str(&p.prediction_id).is_ok());
        assert_eq!(stub.weather_calls.load(Ordering::SeqCst), 0);
        assert_eq!(stub.vegetation_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_enrichment_fills_missing_fields_only() {
        let stub = Arc::new(StubEnrichment {
            weather: Some(WeatherSnapshot {
                temperature: Some(35.0),
                humidity: Some(20.0),
                wind_speed: 36.0,
                wind_direction: 90.0,
                conditions: "Clear".to_string(),
            }),
            vegetation: Some(0.9),
            ..Default::default()
        });
        let svc = service(stub.clone());
        let params = PredictionParameters {
            wind_speed: Some(12.0),
            humidity: Some(80.0),
            ..Default::default()
        };

        let p = svc.predict_wildfire(&request("e1", params), &fire("e1")).await.unwrap();
        let used = p.metadata.parameters_used;

        assert_eq!(used.wind_speed, 12.0);
        assert_eq!(used.wind_direction, 90.0);
        assert_eq!(used.temperature, 35.0);
        assert_eq!(used.humidity, 80.0);
        assert_eq!(used.vegetation_density, 0.9);
        assert_eq!(used.forecast_hours, 6);
        assert_eq!(p.metadata.weather_conditions.as_deref(), Some("Clear"));
        assert_eq!(p.metadata.parameter_sources["forecast_hours"], ParameterSource::Default);

        // Weather is looked up at (lat, lon) of the anchor.
        assert_eq!(*stub.last_coords.lock().unwrap(), Some((37.7749, -122.3321)));
    }

    #[tokio::test]
    async fn test_enrichment_failure_falls_back_to_defaults() {
        let stub = Arc::new(StubEnrichment::default());
        let svc = service(stub.clone());

        let p = svc
            .predict_wildfire(&request("e1", PredictionParameters::default()), &fire("e1"))
            .await
            .unwrap();

        assert_eq!(stub.weather_calls.load(Ordering::SeqCst), 1);
        assert_eq!(stub.vegetation_calls.load(Ordering::SeqCst), 1);
        assert_eq!(p.metadata.parameters_used, crate::types::ResolvedParameters::default());
        assert!((p.result.spread_distance_km - 18.0).abs() < 1e-9);
        assert!(p.metadata.weather_conditions.is_none());
    }

    #[tokio::test]
    async fn test_invalid_request_rejected_before_enrichment() {
        let stub = Arc::new(StubEnrichment::default());
        let svc = service(stub.clone());
        let params = PredictionParameters {
            humidity: Some(140.0),
            forecast_hours: Some(100),
            ..Default::default()
        };

        let err = svc.predict_wildfire(&request("e1", params), &fire("e1")).await.unwrap_err();
        match err {
            PredictionError::InvalidInput(msg) => {
                assert!(msg.contains("humidity"));
                assert!(msg.contains("forecast_hours"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(stub.weather_calls.load(Ordering::SeqCst), 0);
        assert_eq!(svc.prediction_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bad_geometry_is_invalid_input() {
        let svc = service(Arc::new(StubEnrichment::default()));
        let event = EventRecord::new("e1", "wildfires", Geometry::Unsupported);

        let err = svc
            .predict_wildfire(&request("e1", PredictionParameters::default()), &event)
            .await
            .unwrap_err();
        assert!(matches!(err, PredictionError::InvalidInput(_)));
        assert_eq!(svc.prediction_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_lookups() {
        let svc = service(Arc::new(StubEnrichment::default()));
        let mut ids = Vec::new();
        for _ in 0..3 {
            let p = svc
                .predict_wildfire(&request("e1", PredictionParameters::default()), &fire("e1"))
                .await
                .unwrap();
            ids.push(p.prediction_id);
        }
        svc.predict_wildfire(&request("e2", PredictionParameters::default()), &fire("e2"))
            .await
            .unwrap();

        let listed: Vec<_> = svc
            .get_predictions_for_event("e1")
            .unwrap()
            .into_iter()
            .map(|p| p.prediction_id)
            .collect();
        assert_eq!(listed, ids);
        assert_eq!(svc.get_prediction(&ids[1]).unwrap().unwrap().prediction_id, ids[1]);
        assert!(svc.get_prediction("nope").unwrap().is_none());
        assert!(svc.get_predictions_for_event("e3").unwrap().is_empty());
        assert_eq!(svc.prediction_count().unwrap(), 4);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let svc = service(Arc::new(StubEnrichment::default()));
        let mut seen = std::collections::HashSet::new();
        for _ in 0..50 {
            let p = svc
                .predict_wildfire(&request("e1", PredictionParameters::default()), &fire("e1"))
                .await
                .unwrap();
            assert!(seen.insert(p.prediction_id));
        }
    }

    #[tokio::test]
    async fn test_shutdown_closes_enrichment() {
        let stub = Arc::new(StubEnrichment::default());
        let svc = service(stub.clone());
        svc.shutdown().await;
        assert_eq!(stub.closes.load(Ordering::SeqCst), 1);
    }
}
