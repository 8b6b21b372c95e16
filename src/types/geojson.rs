//! GeoJSON geometry subset used by event records and predicted perimeters.
//!
//! Only `Point` and `Polygon` carry meaning here. Anything else deserializes
//! as [`Geometry::Unsupported`] so an unexpected event shape surfaces as an
//! anchor-resolution error instead of a decode failure.

use serde::{Deserialize, Serialize};

/// A GeoJSON position: `[lon, lat]` with an optional trailing altitude.
pub type Position = Vec<f64>;

/// A linear ring. Closed rings repeat their first position at the end.
pub type Ring = Vec<Position>;

/// Tagged GeoJSON geometry (`{"type": "...", "coordinates": ...}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    Polygon { coordinates: Vec<Ring> },
    #[serde(other)]
    Unsupported,
}

impl Geometry {
    pub fn point(lon: f64, lat: f64) -> Self {
        Self::Point {
            coordinates: vec![lon, lat],
        }
    }

    /// GeoJSON type name, for logging.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Point { .. } => "Point",
            Self::Polygon { .. } => "Polygon",
            Self::Unsupported => "Unsupported",
        }
    }
}

/// Raised when a geometry cannot be read as a polygon.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("expected a Polygon geometry, got {0}")]
    NotAPolygon(&'static str),
    #[error("polygon has no exterior ring")]
    MissingExterior,
    #[error("position {index} has fewer than two finite components")]
    BadPosition { index: usize },
}

/// A GeoJSON polygon. Serialized with its `"type": "Polygon"` tag so the
/// wire shape matches [`Geometry::Polygon`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Geometry", try_from = "Geometry")]
pub struct Polygon {
    pub coordinates: Vec<Ring>,
}

impl Polygon {
    /// Wrap a single exterior ring.
    pub fn from_exterior(ring: Ring) -> Self {
        Self {
            coordinates: vec![ring],
        }
    }

    pub fn exterior(&self) -> Option<&Ring> {
        self.coordinates.first()
    }

    pub fn holes(&self) -> &[Ring] {
        self.coordinates.get(1..).unwrap_or(&[])
    }

    /// Exterior ring as `(lon, lat)` pairs, or an error if the ring is
    /// missing, empty, or contains a short or non-finite position.
    pub fn exterior_lon_lat(&self) -> Result<Vec<(f64, f64)>, GeometryError> {
        let ring = self
            .exterior()
            .filter(|r| !r.is_empty())
            .ok_or(GeometryError::MissingExterior)?;
        ring_lon_lat(ring)
    }

    /// True when the exterior ring's first and last positions are identical.
    pub fn is_closed(&self) -> bool {
        self.exterior()
            .is_some_and(|r| !r.is_empty() && r.first() == r.last())
    }
}

/// Convert a ring into `(lon, lat)` pairs, rejecting short or non-finite positions.
pub fn ring_lon_lat(ring: &[Position]) -> Result<Vec<(f64, f64)>, GeometryError> {
    ring.iter()
        .enumerate()
        .map(|(index, p)| match p.as_slice() {
            [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Ok((*lon, *lat)),
            _ => Err(GeometryError::BadPosition { index }),
        })
        .collect()
}

impl From<Polygon> for Geometry {
    fn from(polygon: Polygon) -> Self {
        Self::Polygon {
            coordinates: polygon.coordinates,
        }
    }
}

impl TryFrom<Geometry> for Polygon {
    type Error = GeometryError;

    fn try_from(geometry: Geometry) -> Result<Self, Self::Error> {
        match geometry {
            Geometry::Polygon { coordinates } => Ok(Self { coordinates }),
            other => Err(GeometryError::NotAPolygon(other.kind())),
        }
    }
}

impl TryFrom<&serde_json::Value> for Polygon {
    type Error = GeometryError;

    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        let geometry: Geometry = serde_json::from_value(value.clone())
            .map_err(|_| GeometryError::NotAPolygon("malformed"))?;
        Self::try_from(geometry)
    }
}
