//! OpenWeather-backed enrichment client
//!
//! Holds one reusable HTTP session, created on first use and closed exactly
//! once at shutdown. Every request is bounded by the configured timeout.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{EnrichmentError, EnrichmentSource};
use crate::config::EnrichmentConfig;
use crate::types::WeatherSnapshot;

/// m/s → km/h
const MS_TO_KMH: f64 = 3.6;

enum SessionState {
    Idle,
    Open(reqwest::Client),
    Closed,
}

pub struct EnrichmentClient {
    api_key: String,
    weather_url: String,
    timeout: Duration,
    default_vegetation_density: f64,
    session: Mutex<SessionState>,
}

impl EnrichmentClient {
    pub fn new(config: &EnrichmentConfig) -> Self {
        Self {
            api_key: config.openweather_api_key.clone(),
            weather_url: config.weather_url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            default_vegetation_density: config.default_vegetation_density,
            session: Mutex::new(SessionState::Idle),
        }
    }

    /// Override the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// True once a session has been created and not yet closed.
    pub fn is_open(&self) -> bool {
        matches!(
            self.session.lock().as_deref(),
            Ok(SessionState::Open(_))
        )
    }

    /// Shared HTTP session, created lazily on first call.
    fn session(&self) -> Result<reqwest::Client, EnrichmentError> {
        let mut state = self
            .session
            .lock()
            .map_err(|e| EnrichmentError::Session(e.to_string()))?;

        match &*state {
            SessionState::Open(client) => Ok(client.clone()),
            SessionState::Closed => Err(EnrichmentError::SessionClosed),
            SessionState::Idle => {
                let client = reqwest::Client::builder()
                    .timeout(self.timeout)
                    .build()
                    .map_err(|e| EnrichmentError::Session(e.to_string()))?;
                debug!("Enrichment HTTP session opened");
                *state = SessionState::Open(client.clone());
                Ok(client)
            }
        }
    }

    /// Fetch current weather, reporting why it failed.
    pub async fn try_fetch_weather(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, EnrichmentError> {
        if self.api_key.is_empty() {
            return Err(EnrichmentError::MissingApiKey);
        }
        let client = self.session()?;

        let resp = client
            .get(&self.weather_url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(EnrichmentError::Status(status.as_u16()));
        }

        let body = resp.bytes().await?;
        let parsed: CurrentWeatherResponse =
            serde_json::from_slice(&body).map_err(|e| EnrichmentError::Decode(e.to_string()))?;
        Ok(parsed.into_snapshot())
    }
}

#[async_trait]
impl EnrichmentSource for EnrichmentClient {
    async fn fetch_weather(&self, lat: f64, lon: f64) -> Option<WeatherSnapshot> {
        match self.try_fetch_weather(lat, lon).await {
            Ok(snapshot) => Some(snapshot),
            Err(EnrichmentError::MissingApiKey) => {
                debug!("No weather API key configured, skipping weather enrichment");
                None
            }
            Err(e) => {
                warn!(lat, lon, error = %e, "Weather enrichment failed");
                None
            }
        }
    }

    /// Fixed regional default until a satellite vegetation index is wired in.
    async fn fetch_vegetation_density(&self, _lat: f64, _lon: f64) -> Option<f64> {
        Some(self.default_vegetation_density)
    }

    async fn close(&self) {
        let previous = match self.session.lock() {
            Ok(mut state) => std::mem::replace(&mut *state, SessionState::Closed),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), SessionState::Closed),
        };
        match previous {
            SessionState::Open(_) => info!("Enrichment session closed"),
            SessionState::Idle => debug!("Enrichment client closed before first use"),
            SessionState::Closed => {}
        }
    }
}

// ============================================================================
// OpenWeather current-weather payload
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct CurrentWeatherResponse {
    #[serde(default)]
    main: MainBlock,
    #[serde(default)]
    wind: WindBlock,
    #[serde(default)]
    weather: Vec<ConditionBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct MainBlock {
    temp: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct WindBlock {
    /// m/s
    speed: Option<f64>,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ConditionBlock {
    main: Option<String>,
}

impl CurrentWeatherResponse {
    fn into_snapshot(self) -> WeatherSnapshot {
        WeatherSnapshot {
            temperature: self.main.temp,
            humidity: self.main.humidity,
            wind_speed: self.wind.speed.unwrap_or(0.0) * MS_TO_KMH,
            wind_direction: self.wind.deg.unwrap_or(0.0),
            conditions: self
                .weather
                .into_iter()
                .next()
                .and_then(|c| c.main)
                .unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}
