//! Spread Prediction Engine
//!
//! Pure, deterministic computation: no I/O, no clocks, no randomness.
//!
//! ## Components
//!
//! - `geometry` - spread ellipse construction, bounding-box area, containment
//! - `anchor` - event geometry to a single center coordinate
//! - `heuristic` - the rule-based wildfire model
//!
//! The orchestration layer only sees the [`SpreadModel`] trait, so the
//! heuristic can be replaced by a trained model without touching it.

pub mod anchor;
pub mod geometry;
pub mod heuristic;

pub use anchor::SpatialAnchor;
pub use geometry::{build_spread_polygon, estimate_area, point_in_polygon};
pub use heuristic::WildfireHeuristicModel;

use crate::types::{EventRecord, PredictionParameters, PredictionResult, ResolvedParameters};

/// Errors surfaced by a spread model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpreadModelError {
    /// The caller broke the input contract (e.g. unusable event geometry).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// A wildfire spread model.
///
/// Implementations must be deterministic for identical inputs.
pub trait SpreadModel: Send + Sync {
    fn model_name(&self) -> &str;

    fn model_version(&self) -> &str;

    /// Predict spread around `center` with fully resolved parameters.
    fn predict(&self, center: SpatialAnchor, params: &ResolvedParameters) -> PredictionResult;

    /// Resolve the event's anchor, fill missing parameters with engine
    /// defaults, and predict.
    fn predict_from_event(
        &self,
        event: &EventRecord,
        params: &PredictionParameters,
    ) -> Result<PredictionResult, SpreadModelError> {
        let center = SpatialAnchor::from_geometry(&event.geometry)?;
        Ok(self.predict(center, &params.resolve()))
    }
}
