//! Shared data model for the inference service.

pub mod event;
pub mod geojson;
pub mod prediction;
pub mod weather;

pub use event::EventRecord;
pub use geojson::{Geometry, GeometryError, Polygon, Position, Ring};
pub use prediction::{
    parameter_defaults, ParameterSource, Prediction, PredictionMetadata, PredictionParameters,
    PredictionResult, ResolvedParameters, WildfirePredictionRequest, DEFAULT_RECORD_CONFIDENCE,
    MODEL_CONFIDENCE_KEY, MODEL_TYPE_WILDFIRE,
};
pub use weather::WeatherSnapshot;
