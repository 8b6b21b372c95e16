//! REST API module using Axum
//!
//! Thin routing layer over [`PredictionService`](crate::service::PredictionService):
//! event lookup and category checks happen here, everything else in the core.

pub mod envelope;
pub mod handlers;
mod routes;

pub use handlers::ApiState;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Prediction requests are a handful of numbers.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build a CORS layer from the configured origins.
///
/// An empty list allows no cross-origin access. `"*"` allows any origin
/// without credentials; explicit origins are allowed with credentials.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.iter().any(|o| o.trim() == "*") {
        tracing::info!("CORS: allowing any origin");
        return base.allow_origin(AllowOrigin::any());
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.trim().parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "CORS: ignoring invalid origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        return base;
    }
    tracing::info!(origins = ?origins, "CORS: allowing configured origins");
    base.allow_origin(allowed).allow_credentials(true)
}

/// Create the complete application router.
pub fn create_app(state: ApiState, allowed_origins: &[String]) -> Router {
    routes::api_routes(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(allowed_origins))
}
