//! API route definitions
//!
//! - POST /predict/wildfire - generate and store a spread prediction
//! - GET /predictions/:prediction_id - one stored prediction
//! - GET /events/:event_id/predictions - every prediction for an event, oldest first
//! - GET /health - model, storage and event source status

use axum::{routing::{get, post}, Router};

use super::handlers::{self, ApiState};

pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/predict/wildfire", post(handlers::predict_wildfire))
        .route("/predictions/:prediction_id", get(handlers::get_prediction))
        .route("/events/:event_id/predictions", get(handlers::get_event_predictions))
        .route("/health", get(handlers::health))
        .with_state(state)
}
