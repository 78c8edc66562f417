//! Plain geographic math on latitude/longitude pairs.
//!
//! Everything here is pure and allocation-light; it backs both the selection
//! state machine (area, centroid, bounds) and the ward hit test.

use std::fmt;

/// Mean Earth radius in meters used by the area approximation
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

const SQ_METERS_PER_HECTARE: f64 = 10_000.0;

/// A geographic position in decimal degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Build from a GeoJSON position (`[lng, lat, ...]`)
    pub fn from_position(pos: &[f64]) -> Option<Self> {
        match pos {
            [lng, lat, ..] => Some(Self::new(*lat, *lng)),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.4}°{}, {:.4}°{}",
            self.lat.abs(),
            if self.lat >= 0.0 { "N" } else { "S" },
            self.lng.abs(),
            if self.lng >= 0.0 { "E" } else { "W" }
        )
    }
}

/// Axis-aligned bounding box in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Box around a single point (degenerate until expanded)
    pub fn around(p: LatLng) -> Self {
        Self {
            north: p.lat,
            south: p.lat,
            east: p.lng,
            west: p.lng,
        }
    }

    pub fn expand(&mut self, p: LatLng) {
        self.north = self.north.max(p.lat);
        self.south = self.south.min(p.lat);
        self.east = self.east.max(p.lng);
        self.west = self.west.min(p.lng);
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            north: self.north.max(other.north),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            west: self.west.min(other.west),
        }
    }

    /// North strictly above south and east strictly right of west
    pub fn is_degenerate(&self) -> bool {
        !(self.north > self.south && self.east > self.west)
    }

    pub fn contains(&self, p: LatLng) -> bool {
        p.lat <= self.north && p.lat >= self.south && p.lng <= self.east && p.lng >= self.west
    }

    pub fn center(&self) -> LatLng {
        LatLng::new((self.north + self.south) / 2.0, (self.east + self.west) / 2.0)
    }
}

/// Arithmetic mean of the vertices (not area weighted).
///
/// Returns `None` for an empty slice.
pub fn centroid(vertices: &[LatLng]) -> Option<LatLng> {
    if vertices.is_empty() {
        return None;
    }
    let n = vertices.len() as f64;
    let (lat_sum, lng_sum) = vertices
        .iter()
        .fold((0.0, 0.0), |(la, ln), v| (la + v.lat, ln + v.lng));
    Some(LatLng::new(lat_sum / n, lng_sum / n))
}

/// Min/max latitude and longitude over the vertex set
pub fn bounds(vertices: &[LatLng]) -> Option<BoundingBox> {
    let (first, rest) = vertices.split_first()?;
    let mut bbox = BoundingBox::around(*first);
    for v in rest {
        bbox.expand(*v);
    }
    Some(bbox)
}

/// Polygon area in hectares using the spherical excess approximation.
///
/// The ring is closed implicitly. Accuracy degrades for large polygons; it is
/// intended for farm-plot and ward sized shapes. Fewer than 3 vertices yields 0.
pub fn polygon_area_hectares(vertices: &[LatLng]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }

    let n = vertices.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        let lat1 = a.lat.to_radians();
        let lat2 = b.lat.to_radians();
        let dlng = (b.lng - a.lng).to_radians();
        sum += dlng * (2.0 + lat1.sin() + lat2.sin());
    }

    (sum * EARTH_RADIUS_M * EARTH_RADIUS_M / 2.0).abs() / SQ_METERS_PER_HECTARE
}

/// Even-odd ray cast. Points exactly on an edge may land either way.
pub fn point_in_ring(p: LatLng, ring: &[LatLng]) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.lat > p.lat) != (b.lat > p.lat) {
            let cross_lng = (b.lng - a.lng) * (p.lat - a.lat) / (b.lat - a.lat) + a.lng;
            if p.lng < cross_lng {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Drop a trailing vertex that repeats the first one (GeoJSON closes rings explicitly)
pub fn open_ring(mut ring: Vec<LatLng>) -> Vec<LatLng> {
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<LatLng> {
        vec![
            LatLng::new(0.20, 35.10),
            LatLng::new(0.20, 35.11),
            LatLng::new(0.21, 35.11),
            LatLng::new(0.21, 35.10),
        ]
    }

    #[test]
    fn test_area_of_small_square_near_equator() {
        // 0.01° x 0.01° near the equator is roughly 1.11km x 1.11km
        let area = polygon_area_hectares(&square());
        assert!((area - 123.6).abs() < 1.0, "area was {area}");
    }

    #[test]
    fn test_area_is_non_negative_for_either_winding() {
        let mut ring = square();
        let ccw = polygon_area_hectares(&ring);
        ring.reverse();
        let cw = polygon_area_hectares(&ring);
        assert!(ccw > 0.0);
        assert!((ccw - cw).abs() < 1e-9);
    }

    #[test]
    fn test_area_invariant_under_rotation() {
        let ring = vec![
            LatLng::new(0.10, 35.00),
            LatLng::new(0.25, 35.05),
            LatLng::new(0.30, 35.20),
            LatLng::new(0.12, 35.31),
            LatLng::new(0.02, 35.15),
        ];
        let reference = polygon_area_hectares(&ring);
        for k in 1..ring.len() {
            let mut rotated = ring.clone();
            rotated.rotate_left(k);
            let area = polygon_area_hectares(&rotated);
            assert!((area - reference).abs() < 1e-6 * reference, "rotation {k}");
        }
    }

    #[test]
    fn test_area_needs_three_vertices() {
        assert_eq!(polygon_area_hectares(&square()[..2]), 0.0);
        assert_eq!(polygon_area_hectares(&[]), 0.0);
    }

    #[test]
    fn test_centroid_within_vertex_bounds() {
        let ring = vec![
            LatLng::new(0.05, 35.02),
            LatLng::new(0.31, 35.40),
            LatLng::new(0.12, 35.11),
            LatLng::new(0.29, 35.03),
        ];
        let c = centroid(&ring).unwrap();
        let b = bounds(&ring).unwrap();
        assert!(c.lat >= b.south && c.lat <= b.north);
        assert!(c.lng >= b.west && c.lng <= b.east);
    }

    #[test]
    fn test_centroid_is_vertex_mean() {
        let c = centroid(&square()).unwrap();
        assert!((c.lat - 0.205).abs() < 1e-12);
        assert!((c.lng - 35.105).abs() < 1e-12);
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn test_bounds() {
        let b = bounds(&square()).unwrap();
        assert_eq!(b.north, 0.21);
        assert_eq!(b.south, 0.20);
        assert_eq!(b.east, 35.11);
        assert_eq!(b.west, 35.10);
        assert!(!b.is_degenerate());
        assert!(bounds(&[LatLng::new(1.0, 1.0)]).unwrap().is_degenerate());
    }

    #[test]
    fn test_point_in_ring() {
        let ring = square();
        assert!(point_in_ring(LatLng::new(0.205, 35.105), &ring));
        assert!(!point_in_ring(LatLng::new(0.25, 35.105), &ring));
        assert!(!point_in_ring(LatLng::new(0.205, 35.2), &ring));
    }

    #[test]
    fn test_open_ring_strips_closing_vertex() {
        let mut ring = square();
        ring.push(ring[0]);
        assert_eq!(open_ring(ring).len(), 4);
    }

    #[test]
    fn test_display_hemispheres() {
        assert_eq!(LatLng::new(0.2, 35.1).to_string(), "0.2000°N, 35.1000°E");
        assert_eq!(LatLng::new(-1.5, -0.25).to_string(), "1.5000°S, 0.2500°W");
    }
}
