//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and exercise
//! every route using `tower::ServiceExt::oneshot()`.
//! No binary spawn, no network port, no weather provider.

use terrapulse_inference::api::{create_app, ApiState};
use terrapulse_inference::config::EnrichmentConfig;
use terrapulse_inference::types::Position;
use terrapulse_inference::{
    EnrichmentClient, EventRecord, Geometry, InMemoryEventSource, InMemoryPredictionStore,
    PredictionService, WildfireHeuristicModel,
};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn square(lon: f64, lat: f64, half: f64) -> Geometry {
    let ring: Vec<Position> = vec![
        vec![lon - half, lat - half],
        vec![lon + half, lat - half],
        vec![lon + half, lat + half],
        vec![lon - half, lat + half],
        vec![lon - half, lat - half],
    ];
    Geometry::Polygon {
        coordinates: vec![ring],
    }
}

fn create_test_app() -> Router {
    let events = InMemoryEventSource::from_events([
        EventRecord::new("fire-point", "wildfires", Geometry::point(-122.3321, 37.7749))
            .with_title("Point fire"),
        EventRecord::new("fire-area", "wildfires", square(-120.0, 38.0, 0.05)),
        EventRecord::new("fire-nowhere", "wildfires", Geometry::Unsupported),
        EventRecord::new("volcano-1", "volcanoes", Geometry::point(14.99, 37.75)),
    ]);
    let service = PredictionService::new(
        Arc::new(WildfireHeuristicModel::new()),
        Arc::new(EnrichmentClient::new(&EnrichmentConfig::default())),
        Arc::new(InMemoryPredictionStore::new()),
    );
    create_app(
        ApiState {
            service: Arc::new(service),
            events: Arc::new(events),
            wildfire_category: "wildfires".to_string(),
        },
        &[],
    )
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn post_predict(app: &Router, body: Value) -> (StatusCode, Value) {
    let req = Request::post("/predict/wildfire")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

/// Reference scenario: 15 km/h, density 0.5, 6 hours -> 27 km spread.
#[tokio::test]
async fn test_reference_prediction_record() {
    let app = create_test_app();
    let (status, v) = post_predict(
        &app,
        json!({
            "event_id": "fire-point",
            "wind_speed": 15,
            "wind_direction": 270,
            "vegetation_density": 0.5,
            "forecast_hours": 6
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{v}");

    assert_eq!(v["event_id"], "fire-point");
    assert_eq!(v["model_type"], "wildfire");
    assert_eq!(v["forecast_hours"], 6);
    assert!(v["prediction_id"].as_str().is_some_and(|s| !s.is_empty()));
    assert!(v["generated_at"].as_str().is_some());

    let spread = v["result"]["spread_distance_km"].as_f64().unwrap();
    assert!((spread - 27.0).abs() < 1e-9);
    assert!(v["result"]["area_affected_km2"].as_f64().unwrap() > 0.0);
    assert!(v["result"]["at_risk_infrastructure"].is_null());
    assert!(v["result"]["at_risk_population"].is_null());

    let ring = v["result"]["predicted_perimeter"]["coordinates"][0].as_array().unwrap();
    assert!(ring.len() >= 4);
    assert_eq!(ring.first(), ring.last());

    let confidence = v["confidence"].as_f64().unwrap();
    assert!((confidence - 0.75).abs() < 1e-9);
    assert_eq!(v["result"]["confidence_factors"]["model_confidence"], v["confidence"]);

    assert_eq!(v["metadata"]["model_name"], "wildfire_heuristic_v1");
    assert_eq!(v["metadata"]["model_version"], "1.0.0");
    assert_eq!(v["metadata"]["parameters_used"]["temperature"], 20.0);
    assert_eq!(v["metadata"]["parameter_sources"]["wind_speed"], "explicit");
    assert_eq!(v["metadata"]["parameter_sources"]["humidity"], "default");
}

/// Without an API key, missing wind falls back to engine defaults.
#[tokio::test]
async fn test_defaults_without_weather_provider() {
    let app = create_test_app();
    let (status, v) = post_predict(&app, json!({"event_id": "fire-area"})).await;
    assert_eq!(status, StatusCode::OK, "{v}");

    let used = &v["metadata"]["parameters_used"];
    assert_eq!(used["wind_speed"], 10.0);
    assert_eq!(used["wind_direction"], 0.0);
    assert_eq!(used["forecast_hours"], 6);
    assert_eq!(v["metadata"]["parameter_sources"]["wind_speed"], "default");
    // Vegetation enrichment is local and always answers.
    assert_eq!(v["metadata"]["parameter_sources"]["vegetation_density"], "enriched");
    assert!(v["metadata"].get("weather_conditions").is_none());
}

#[tokio::test]
async fn test_event_predictions_are_listed_oldest_first() {
    let app = create_test_app();
    let mut ids = Vec::new();
    for hours in [1, 12, 48] {
        let (status, v) =
            post_predict(&app, json!({"event_id": "fire-point", "forecast_hours": hours})).await;
        assert_eq!(status, StatusCode::OK);
        ids.push(v["prediction_id"].as_str().unwrap().to_string());
    }
    post_predict(&app, json!({"event_id": "fire-area"})).await;

    let (status, v) = get(&app, "/events/fire-point/predictions").await;
    assert_eq!(status, StatusCode::OK);
    let listed: Vec<&str> = v
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["prediction_id"].as_str().unwrap())
        .collect();
    assert_eq!(listed, ids.iter().map(String::as_str).collect::<Vec<_>>());

    let hours: Vec<u64> = v.as_array().unwrap().iter().map(|p| p["forecast_hours"].as_u64().unwrap()).collect();
    assert_eq!(hours, vec![1, 12, 48]);
}

#[tokio::test]
async fn test_unknown_event_has_no_predictions() {
    let (status, v) = get(&create_test_app(), "/events/nobody/predictions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v, json!([]));
}

#[tokio::test]
async fn test_each_prediction_gets_a_fresh_id() {
    let app = create_test_app();
    let body = json!({"event_id": "fire-point", "wind_speed": 5, "wind_direction": 90});
    let (_, a) = post_predict(&app, body.clone()).await;
    let (_, b) = post_predict(&app, body).await;
    assert_ne!(a["prediction_id"], b["prediction_id"]);
    assert_eq!(a["result"], b["result"]);
}

#[tokio::test]
async fn test_error_envelopes() {
    let app = create_test_app();

    let cases = [
        (json!({"event_id": "missing"}), StatusCode::NOT_FOUND, "NOT_FOUND"),
        (json!({"event_id": "volcano-1"}), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        (json!({"event_id": ""}), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        (json!({"event_id": "fire-point", "humidity": 101}), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        (json!({"event_id": "fire-point", "wind_speed": -1}), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        (json!({"event_id": "fire-point", "forecast_hours": 73}), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        (json!({"event_id": "fire-nowhere"}), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        (json!({"wind_speed": 3}), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
    ];

    for (body, expected_status, expected_code) in cases {
        let (status, v) = post_predict(&app, body.clone()).await;
        assert_eq!(status, expected_status, "request {body} -> {v}");
        assert_eq!(v["error"]["code"], expected_code, "request {body}");
        assert!(v["meta"]["timestamp"].as_str().is_some());
    }

    // Nothing was stored by the failed requests.
    let (_, health) = get(&app, "/health").await;
    assert_eq!(health["stored_predictions"], 0);
}

#[tokio::test]
async fn test_health_counts_stored_predictions() {
    let app = create_test_app();
    post_predict(&app, json!({"event_id": "fire-point"})).await;
    post_predict(&app, json!({"event_id": "fire-area"})).await;

    let (status, v) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], "healthy");
    assert_eq!(v["event_source"], "InMemory");
    assert_eq!(v["stored_predictions"], 2);
}
