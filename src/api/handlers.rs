//! HTTP handlers. Map absence to 404, validation failures to 400.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use super::envelope::ApiErrorResponse;
use crate::events::EventSource;
use crate::service::{PredictionError, PredictionService};
use crate::types::WildfirePredictionRequest;

/// Shared state for all handlers
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<PredictionService>,
    pub events: Arc<dyn EventSource>,
    /// Category an event must carry to get a wildfire prediction
    pub wildfire_category: String,
}

fn prediction_error_response(e: PredictionError) -> Response {
    match e {
        PredictionError::InvalidInput(msg) => ApiErrorResponse::bad_request(msg),
        PredictionError::Storage(e) => {
            error!(error = %e, "Prediction storage failed");
            ApiErrorResponse::internal("prediction storage failed")
        }
    }
}

/// POST /predict/wildfire
pub async fn predict_wildfire(
    State(state): State<ApiState>,
    body: Result<Json<WildfirePredictionRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return ApiErrorResponse::bad_request(rejection.body_text()),
    };

    if request.event_id.trim().is_empty() {
        return ApiErrorResponse::bad_request("event_id must not be empty");
    }

    let event = match state.events.get_event(&request.event_id).await {
        Ok(Some(event)) => event,
        Ok(None) => {
            return ApiErrorResponse::not_found(format!("Event {} not found", request.event_id))
        }
        Err(e) => {
            warn!(event_id = %request.event_id, source = state.events.source_name(), error = %e, "Event lookup failed");
            return ApiErrorResponse::bad_gateway("event lookup failed");
        }
    };

    if event.category != state.wildfire_category {
        return ApiErrorResponse::bad_request(format!(
            "Event {} is not a wildfire (category '{}')",
            event.id, event.category
        ));
    }

    match state.service.predict_wildfire(&request, &event).await {
        Ok(prediction) => Json(prediction).into_response(),
        Err(e) => prediction_error_response(e),
    }
}

/// GET /predictions/:prediction_id
pub async fn get_prediction(
    State(state): State<ApiState>,
    Path(prediction_id): Path<String>,
) -> Response {
    match state.service.get_prediction(&prediction_id) {
        Ok(Some(prediction)) => Json(prediction).into_response(),
        Ok(None) => ApiErrorResponse::not_found(format!("Prediction {prediction_id} not found")),
        Err(e) => prediction_error_response(e),
    }
}

/// GET /events/:event_id/predictions
pub async fn get_event_predictions(
    State(state): State<ApiState>,
    Path(event_id): Path<String>,
) -> Response {
    match state.service.get_predictions_for_event(&event_id) {
        Ok(predictions) => Json(predictions).into_response(),
        Err(e) => prediction_error_response(e),
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_name: String,
    pub model_version: String,
    pub storage_backend: &'static str,
    pub event_source: &'static str,
    pub stored_predictions: usize,
}

/// GET /health
pub async fn health(State(state): State<ApiState>) -> Response {
    match state.service.prediction_count() {
        Ok(stored_predictions) => Json(HealthResponse {
            status: "healthy",
            model_name: state.service.model_name().to_string(),
            model_version: state.service.model_version().to_string(),
            storage_backend: state.service.store_backend(),
            event_source: state.events.source_name(),
            stored_predictions,
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, "Health check could not read prediction store");
            ApiErrorResponse::internal("prediction store unavailable")
        }
    }
}
