//! Environmental enrichment
//!
//! Best-effort lookup of weather and vegetation data for a coordinate. Every
//! failure mode is enumerated in [`EnrichmentError`], but the trait entry
//! points collapse them into "no data" so a prediction never fails because
//! a provider did.

pub mod client;

pub use client::EnrichmentClient;

use async_trait::async_trait;

use crate::types::WeatherSnapshot;

/// Enrichment failure modes
#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    #[error("weather API key not configured")]
    MissingApiKey,
    #[error("enrichment session already closed")]
    SessionClosed,
    #[error("could not create HTTP session: {0}")]
    Session(String),
    #[error("weather request timed out")]
    Timeout,
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("weather provider returned status {0}")]
    Status(u16),
    #[error("could not decode weather response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for EnrichmentError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Http(e.to_string())
        }
    }
}

/// A source of environmental data for predictions.
///
/// Implementations must tolerate concurrent use. `close` releases any shared
/// session; later fetches return `None`.
#[async_trait]
pub trait EnrichmentSource: Send + Sync {
    /// Current weather at a coordinate, or `None` when unavailable.
    async fn fetch_weather(&self, lat: f64, lon: f64) -> Option<WeatherSnapshot>;

    /// Vegetation density (0-1) at a coordinate, or `None` when unavailable.
    async fn fetch_vegetation_density(&self, lat: f64, lon: f64) -> Option<f64>;

    /// Tear down shared resources. Idempotent.
    async fn close(&self);
}
