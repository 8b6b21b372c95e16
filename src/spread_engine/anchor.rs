//! Spatial anchor: the single coordinate a prediction is centered on.

use serde::{Deserialize, Serialize};

use super::SpreadModelError;
use crate::types::geojson::ring_lon_lat;
use crate::types::Geometry;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialAnchor {
    pub lon: f64,
    pub lat: f64,
}

impl SpatialAnchor {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Derive the anchor from an event geometry.
    ///
    /// - `Point`: its first two components.
    /// - `Polygon`: the arithmetic mean of every position in the first ring
    ///   (the closing position included).
    ///
    /// Anything that does not yield two finite components is `InvalidInput`.
    pub fn from_geometry(geometry: &Geometry) -> Result<Self, SpreadModelError> {
        match geometry {
            Geometry::Point { coordinates } => match coordinates.as_slice() {
                [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Ok(Self::new(*lon, *lat)),
                _ => Err(SpreadModelError::InvalidInput(
                    "point geometry needs two finite coordinates".to_string(),
                )),
            },
            Geometry::Polygon { coordinates } => {
                let ring = coordinates
                    .first()
                    .filter(|r| !r.is_empty())
                    .ok_or_else(|| {
                        SpreadModelError::InvalidInput("polygon geometry has no exterior ring".to_string())
                    })?;
                let points = ring_lon_lat(ring)
                    .map_err(|e| SpreadModelError::InvalidInput(format!("polygon geometry: {e}")))?;

                let n = points.len() as f64;
                let (sum_lon, sum_lat) = points
                    .iter()
                    .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
                let (lon, lat) = (sum_lon / n, sum_lat / n);
                if !lon.is_finite() || !lat.is_finite() {
                    return Err(SpreadModelError::InvalidInput(
                        "polygon centroid is not finite".to_string(),
                    ));
                }
                Ok(Self::new(lon, lat))
            }
            Geometry::Unsupported => Err(SpreadModelError::InvalidInput(
                "unsupported event geometry type".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_anchor() {
        let a = SpatialAnchor::from_geometry(&Geometry::point(-120.5, 38.25)).unwrap();
        assert_eq!(a, SpatialAnchor::new(-120.5, 38.25));
    }

    #[test]
    fn test_point_with_altitude_uses_first_two() {
        let g = Geometry::Point {
            coordinates: vec![10.0, 20.0, 350.0],
        };
        assert_eq!(SpatialAnchor::from_geometry(&g).unwrap(), SpatialAnchor::new(10.0, 20.0));
    }

    #[test]
    fn test_polygon_anchor_averages_first_ring() {
        // Closing vertex counts: mean of (0,0),(4,0),(4,4),(0,4),(0,0) = (1.6, 1.6)
        let g = Geometry::Polygon {
            coordinates: vec![vec![
                vec![0.0, 0.0],
                vec![4.0, 0.0],
                vec![4.0, 4.0],
                vec![0.0, 4.0],
                vec![0.0, 0.0],
            ]],
        };
        let a = SpatialAnchor::from_geometry(&g).unwrap();
        assert!((a.lon - 1.6).abs() < 1e-12);
        assert!((a.lat - 1.6).abs() < 1e-12);
    }

    #[test]
    fn test_short_point_is_invalid() {
        let g = Geometry::Point {
            coordinates: vec![1.0],
        };
        assert!(matches!(
            SpatialAnchor::from_geometry(&g),
            Err(SpreadModelError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_empty_polygon_is_invalid() {
        let g = Geometry::Polygon {
            coordinates: vec![vec![]],
        };
        assert!(SpatialAnchor::from_geometry(&g).is_err());
    }

    #[test]
    fn test_overflowing_centroid_is_invalid() {
        let g = Geometry::Polygon {
            coordinates: vec![vec![
                vec![1e308, 0.0],
                vec![1e308, 1.0],
                vec![1e308, 2.0],
                vec![1e308, 0.0],
            ]],
        };
        assert!(matches!(
            SpatialAnchor::from_geometry(&g),
            Err(SpreadModelError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_unsupported_geometry_is_invalid() {
        assert!(SpatialAnchor::from_geometry(&Geometry::Unsupported).is_err());
    }
}
