//! TerraPulse Inference: wildfire spread prediction
//!
//! Turns a wildfire event plus optional environmental parameters into a
//! predicted burn perimeter, spread distance, affected area and confidence.
//!
//! ## Architecture
//!
//! - **Spread Engine**: deterministic heuristic model behind the `SpreadModel` trait
//! - **Enrichment**: best-effort weather and vegetation lookups
//! - **Prediction Service**: parameter resolution, id assignment, persistence
//! - **Storage**: in-memory or sled-backed prediction repository
//! - **API**: axum routes over the prediction service

pub mod api;
pub mod config;
pub mod enrichment;
pub mod events;
pub mod service;
pub mod spread_engine;
pub mod storage;
pub mod types;

pub use config::ServiceConfig;

pub use types::{
    EventRecord, Geometry, Polygon, Prediction, PredictionMetadata, PredictionParameters,
    PredictionResult, ResolvedParameters, WeatherSnapshot, WildfirePredictionRequest,
};

pub use spread_engine::{SpatialAnchor, SpreadModel, SpreadModelError, WildfireHeuristicModel};

pub use enrichment::{EnrichmentClient, EnrichmentError, EnrichmentSource};

pub use events::{EventLookupError, EventSource, GatewayEventSource, InMemoryEventSource};

pub use service::{PredictionError, PredictionService};

pub use storage::{InMemoryPredictionStore, PredictionStore, SledPredictionStore, StoreError};
