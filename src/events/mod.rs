//! Event lookup
//!
//! The prediction core only needs an event's id, category and geometry.
//! Events live in the platform's gateway; [`GatewayEventSource`] fetches them
//! over HTTP and [`InMemoryEventSource`] serves a fixed set (tests, demos,
//! offline deployments seeded from a JSON file).

pub mod gateway;

pub use gateway::GatewayEventSource;

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{defaults, EventsConfig};
use crate::types::{EventRecord, Geometry};

/// Event lookup errors
#[derive(Debug, thiserror::Error)]
pub enum EventLookupError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("event service returned status {0}")]
    Status(u16),
    #[error("could not decode event: {0}")]
    Decode(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Lookup of events by id.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// `Ok(None)` when the event does not exist.
    async fn get_event(&self, event_id: &str) -> Result<Option<EventRecord>, EventLookupError>;

    /// Source name for logging
    fn source_name(&self) -> &'static str;
}

/// Build the configured event source: the gateway when a URL is set,
/// otherwise an in-memory set (seeded from `seed_file` when given).
pub fn from_config(config: &EventsConfig) -> Result<Arc<dyn EventSource>, EventLookupError> {
    if let Some(url) = config.gateway_url.as_deref() {
        let source = GatewayEventSource::new(url, Duration::from_secs(defaults::EVENT_LOOKUP_TIMEOUT_SECS))?;
        tracing::info!(gateway = %url, "Looking up events through the API gateway");
        return Ok(Arc::new(source));
    }

    match &config.seed_file {
        Some(path) => Ok(Arc::new(InMemoryEventSource::from_json_file(path)?)),
        None => {
            tracing::warn!("No event gateway or seed file configured, every event lookup will miss");
            Ok(Arc::new(InMemoryEventSource::new()))
        }
    }
}

// ============================================================================
// Platform record decoding
// ============================================================================

/// Event as stored by the platform. Geometry is usually a GeoJSON string;
/// an embedded object is accepted too.
#[derive(Debug, Deserialize)]
struct PlatformEvent {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default, alias = "category")]
    category_id: String,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    geometry: Option<Value>,
}

fn parse_geometry(raw: Option<Value>) -> Option<Geometry> {
    let geometry: Geometry = match raw? {
        Value::String(s) if !s.trim().is_empty() => serde_json::from_str(&s).ok()?,
        v @ Value::Object(_) => serde_json::from_value(v).ok()?,
        _ => return None,
    };
    match geometry {
        Geometry::Unsupported => None,
        g => Some(g),
    }
}

/// Decode one platform event record.
///
/// Falls back to a point at latitude/longitude when the geometry is
/// missing, unparsable, or of a type the core does not handle.
pub fn decode_event(value: Value) -> Result<EventRecord, EventLookupError> {
    let raw: PlatformEvent =
        serde_json::from_value(value).map_err(|e| EventLookupError::Decode(e.to_string()))?;

    let geometry = parse_geometry(raw.geometry).unwrap_or_else(|| match (raw.longitude, raw.latitude) {
        (Some(lon), Some(lat)) => Geometry::point(lon, lat),
        _ => Geometry::Unsupported,
    });

    Ok(EventRecord::new(raw.id, raw.category_id, geometry).with_title(raw.title))
}

// ============================================================================
// In-memory source
// ============================================================================

/// Fixed set of events held in memory.
#[derive(Default)]
pub struct InMemoryEventSource {
    events: RwLock<HashMap<String, EventRecord>>,
}

impl InMemoryEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: impl IntoIterator<Item = EventRecord>) -> Self {
        Self {
            events: RwLock::new(events.into_iter().map(|e| (e.id.clone(), e)).collect()),
        }
    }

    /// Load a JSON array of platform event records.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, EventLookupError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let values: Vec<Value> =
            serde_json::from_str(&content).map_err(|e| EventLookupError::Decode(e.to_string()))?;
        let events = values.into_iter().map(decode_event).collect::<Result<Vec<_>, _>>()?;

        tracing::info!(path = ?path.as_ref(), count = events.len(), "Loaded seed events");
        Ok(Self::from_events(events))
    }

    pub fn insert(&self, event: EventRecord) {
        match self.events.write() {
            Ok(mut map) => {
                map.insert(event.id.clone(), event);
            }
            Err(e) => tracing::error!(error = %e, "Event map lock poisoned, insert dropped"),
        }
    }

    pub fn len(&self) -> usize {
        self.events.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventSource for InMemoryEventSource {
    async fn get_event(&self, event_id: &str) -> Result<Option<EventRecord>, EventLookupError> {
        let map = self
            .events
            .read()
            .map_err(|e| EventLookupError::Io(std::io::Error::other(e.to_string())))?;
        Ok(map.get(event_id).cloned())
    }

    fn source_name(&self) -> &'static str {
        "InMemory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_decode_geometry_string() {
        let event = decode_event(json!({
            "id": "EONET_1",
            "title": "Camp Fire",
            "category_id": "wildfires",
            "latitude": 39.8,
            "longitude": -121.4,
            "geometry": "{\"type\":\"Point\",\"coordinates\":[-121.5,39.75]}"
        }))
        .unwrap();

        assert_eq!(event.id, "EONET_1");
        assert_eq!(event.title, "Camp Fire");
        assert_eq!(event.category, "wildfires");
        assert_eq!(event.geometry, Geometry::point(-121.5, 39.75));
    }

    #[test]
    fn test_decode_geometry_object() {
        let event = decode_event(json!({
            "id": "e",
            "category_id": "wildfires",
            "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}
        }))
        .unwrap();
        assert_eq!(event.geometry.kind(), "Polygon");
    }

    #[test]
    fn test_decode_falls_back_to_lat_lon() {
        for geometry in [json!(""), json!("not geojson"), json!({"type": "LineString", "coordinates": []}), Value::Null] {
            let event = decode_event(json!({
                "id": "e",
                "category_id": "wildfires",
                "latitude": 40.0,
                "longitude": -120.0,
                "geometry": geometry
            }))
            .unwrap();
            assert_eq!(event.geometry, Geometry::point(-120.0, 40.0));
        }
    }

    #[test]
    fn test_decode_without_any_location() {
        let event = decode_event(json!({"id": "e", "category_id": "floods"})).unwrap();
        assert_eq!(event.geometry, Geometry::Unsupported);
    }

    #[test]
    fn test_decode_rejects_missing_id() {
        assert!(matches!(
            decode_event(json!({"title": "x"})),
            Err(EventLookupError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_in_memory_lookup() {
        let source = InMemoryEventSource::from_events([EventRecord::new(
            "e1",
            "wildfires",
            Geometry::point(1.0, 2.0),
        )]);
        assert_eq!(source.get_event("e1").await.unwrap().unwrap().category, "wildfires");
        assert!(source.get_event("e2").await.unwrap().is_none());

        source.insert(EventRecord::new("e2", "volcanoes", Geometry::point(0.0, 0.0)));
        assert_eq!(source.len(), 2);
        assert!(source.get_event("e2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            json!([
                {"id": "a", "category_id": "wildfires", "latitude": 1.0, "longitude": 2.0, "geometry": ""},
                {"id": "b", "category_id": "severeStorms", "geometry": {"type": "Point", "coordinates": [5, 6]}}
            ])
        )
        .unwrap();

        let source = InMemoryEventSource::from_json_file(file.path()).unwrap();
        assert_eq!(source.len(), 2);
        assert_eq!(
            source.get_event("a").await.unwrap().unwrap().geometry,
            Geometry::point(2.0, 1.0)
        );
    }

    #[test]
    fn test_from_config_selects_source() {
        let gateway = from_config(&EventsConfig {
            gateway_url: Some("http://gateway:8080".to_string()),
            ..EventsConfig::default()
        })
        .unwrap();
        assert_eq!(gateway.source_name(), "Gateway");

        let empty = from_config(&EventsConfig::default()).unwrap();
        assert_eq!(empty.source_name(), "InMemory");
    }

    #[test]
    fn test_missing_seed_file_is_io_error() {
        assert!(matches!(
            InMemoryEventSource::from_json_file("/nonexistent/events.json"),
            Err(EventLookupError::Io(_))
        ));
    }
}
