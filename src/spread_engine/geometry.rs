//! Geometry utilities for the spread model.
//!
//! Flat-earth conversions only: 1° latitude ≈ 111 km and 1° longitude ≈
//! 111 km × cos(latitude). Good enough for perimeters tens of kilometres
//! across; not a geodesic library.

use std::f64::consts::PI;

use crate::types::{Polygon, Position};

/// Kilometres per degree of latitude.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Sample count for the spread ellipse (before closing the ring).
pub const ELLIPSE_SAMPLES: usize = 32;

/// Base spread rate: km per (km/h of wind × hour).
pub const BASE_SPREAD_RATE: f64 = 0.2;

/// Downwind semi-axis as a multiple of the base spread distance.
pub const MAJOR_AXIS_FACTOR: f64 = 1.5;

/// Crosswind semi-axis as a multiple of the base spread distance.
pub const MINOR_AXIS_FACTOR: f64 = 0.7;

/// Convert a meteorological bearing (clockwise from north, "from") to a
/// mathematical angle in degrees (counter-clockwise from east).
pub fn math_angle_degrees(wind_direction: f64) -> f64 {
    (450.0 - wind_direction).rem_euclid(360.0)
}

/// Kilometres per degree of longitude at `lat` (degrees).
pub fn km_per_degree_lon(lat: f64) -> f64 {
    KM_PER_DEGREE * lat.to_radians().cos()
}

/// Build the predicted spread ellipse around a center point.
///
/// The ellipse is centered on `(center_lon, center_lat)` with semi-axes
/// `1.5 × base` (rotated to the wind angle) and `0.7 × base`, where
/// `base = 0.2 × wind_speed × hours` km. Sampled at 32 parameter values
/// spanning `0..=2π`, then closed. Zero wind or zero hours yields a ring
/// of identical points at the center.
pub fn build_spread_polygon(
    center_lon: f64,
    center_lat: f64,
    wind_speed: f64,
    wind_direction: f64,
    hours: u32,
) -> Polygon {
    let angle = math_angle_degrees(wind_direction).to_radians();
    let (sin_a, cos_a) = angle.sin_cos();

    let base_km = BASE_SPREAD_RATE * wind_speed * f64::from(hours);
    let major = base_km * MAJOR_AXIS_FACTOR;
    let minor = base_km * MINOR_AXIS_FACTOR;

    let lon_km = km_per_degree_lon(center_lat);
    let step = 2.0 * PI / (ELLIPSE_SAMPLES - 1) as f64;

    let mut ring: Vec<Position> = (0..ELLIPSE_SAMPLES)
        .map(|i| {
            let t = step * i as f64;
            let x = major * t.cos();
            let y = minor * t.sin();

            let x_rot = x * cos_a - y * sin_a;
            let y_rot = x * sin_a + y * cos_a;

            vec![center_lon + x_rot / lon_km, center_lat + y_rot / KM_PER_DEGREE]
        })
        .collect();

    if ring.first() != ring.last() {
        if let Some(first) = ring.first().cloned() {
            ring.push(first);
        }
    }

    Polygon::from_exterior(ring)
}

/// Axis-aligned bounds of the exterior ring: `(min_lon, min_lat, max_lon, max_lat)`.
pub fn bounds(polygon: &Polygon) -> Option<(f64, f64, f64, f64)> {
    let points = polygon.exterior_lon_lat().ok()?;
    let mut iter = points.into_iter();
    let (lon, lat) = iter.next()?;
    let init = (lon, lat, lon, lat);
    Some(iter.fold(init, |(min_x, min_y, max_x, max_y), (x, y)| {
        (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
    }))
}

/// Bounding-box area of a polygon in km².
///
/// This intentionally over-approximates: it is the area of the polygon's
/// bounding box, not of the polygon. Downstream consumers calibrate against
/// it, so it stays. Width is scaled at the box's minimum latitude.
/// Malformed polygons yield `0.0`.
pub fn estimate_area(polygon: &Polygon) -> f64 {
    let Some((min_lon, min_lat, max_lon, max_lat)) = bounds(polygon) else {
        tracing::debug!("estimate_area: malformed polygon, reporting zero area");
        return 0.0;
    };

    let width_km = (max_lon - min_lon) * km_per_degree_lon(min_lat);
    let height_km = (max_lat - min_lat) * KM_PER_DEGREE;
    (width_km * height_km).abs()
}

/// Strict containment test: points on the boundary or inside a hole are
/// outside. Malformed polygons contain nothing.
pub fn point_in_polygon(lon: f64, lat: f64, polygon: &Polygon) -> bool {
    if !lon.is_finite() || !lat.is_finite() {
        return false;
    }
    let Ok(exterior) = polygon.exterior_lon_lat() else {
        return false;
    };
    if exterior.len() < 3 || !ring_contains(&exterior, lon, lat) {
        return false;
    }

    for hole in polygon.holes() {
        let Ok(hole) = crate::types::geojson::ring_lon_lat(hole) else {
            return false;
        };
        if hole.len() >= 3 && (ring_contains(&hole, lon, lat) || on_boundary(&hole, lon, lat)) {
            return false;
        }
    }
    true
}

/// Even-odd ray cast, with boundary points excluded.
fn ring_contains(ring: &[(f64, f64)], x: f64, y: f64) -> bool {
    if on_boundary(ring, x, y) {
        return false;
    }

    let mut inside = false;
    let n = ring.len();
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > y) != (yj > y) {
            let x_cross = (xj - xi) * (y - yi) / (yj - yi) + xi;
            if x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn on_boundary(ring: &[(f64, f64)], x: f64, y: f64) -> bool {
    const EPS: f64 = 1e-12;
    let n = ring.len();
    (0..n).any(|i| {
        let (x1, y1) = ring[i];
        let (x2, y2) = ring[(i + 1) % n];
        let cross = (x2 - x1) * (y - y1) - (y2 - y1) * (x - x1);
        cross.abs() <= EPS
            && x >= x1.min(x2) - EPS
            && x <= x1.max(x2) + EPS
            && y >= y1.min(y2) - EPS
            && y <= y1.max(y2) + EPS
    })
}
