//! Event records supplied by the monitoring platform.

use serde::{Deserialize, Serialize};

use super::geojson::Geometry;

/// A natural event as the core needs to see it: an id, a category tag and
/// a GeoJSON geometry. The platform's record has more fields; they are
/// ignored on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Category tag, e.g. `"wildfires"` (EONET category id).
    #[serde(alias = "category_id")]
    pub category: String,
    pub geometry: Geometry,
}

impl EventRecord {
    pub fn new(id: impl Into<String>, category: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            category: category.into(),
            geometry,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_gateway_field_names() {
        let event: EventRecord = serde_json::from_value(json!({
            "id": "EONET_6123",
            "title": "Dixie Fire",
            "category_id": "wildfires",
            "geometry": {"type": "Point", "coordinates": [-121.4, 40.1]},
            "severity": "high"
        }))
        .unwrap();

        assert_eq!(event.category, "wildfires");
        assert_eq!(event.geometry, Geometry::point(-121.4, 40.1));
    }
}
