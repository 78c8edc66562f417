//! Device position lookup and manual coordinate entry.

use thiserror::Error;
use tracing::debug;

use crate::geo::LatLng;
use crate::selection::MIN_AREA_VERTICES;

/// Why a position fix could not be obtained
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("Location access denied. Please enable location permissions and try again, or enter coordinates manually.")]
    PermissionDenied,

    #[error("Location unavailable. Please check your device GPS settings and try again.")]
    PositionUnavailable,

    #[error("Location request timed out. Please try again or enter coordinates manually.")]
    Timeout,

    #[error("GPS is disabled by policy in this environment. Please use manual coordinate input.")]
    PolicyDisabled,

    #[error("Geolocation is not supported here. Please enter coordinates manually.")]
    Unsupported,
}

/// Source of the user's current position
pub trait Geolocator {
    fn current_position(&self) -> Result<LatLng, GeolocationError>;
}

/// Position fixed by configuration; without one, geolocation is unsupported
#[derive(Clone, Debug, Default)]
pub struct ConfiguredGeolocator {
    fix: Option<LatLng>,
}

impl ConfiguredGeolocator {
    pub fn new(fix: Option<LatLng>) -> Self {
        Self { fix }
    }
}

impl Geolocator for ConfiguredGeolocator {
    fn current_position(&self) -> Result<LatLng, GeolocationError> {
        let fix = self.fix.ok_or(GeolocationError::Unsupported)?;
        debug!(%fix, "position fix");
        Ok(fix)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CoordinateError {
    #[error("Please enter valid coordinates")]
    Invalid,

    #[error("Latitude must be between -90 and 90")]
    LatitudeOutOfRange,

    #[error("Longitude must be between -180 and 180")]
    LongitudeOutOfRange,

    #[error("A polygon requires at least 3 points")]
    TooFewPoints,
}

/// Parse `"lat, lng"` (comma or whitespace separated)
pub fn parse_coordinate(input: &str) -> Result<LatLng, CoordinateError> {
    let mut parts = input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty());

    let (Some(lat), Some(lng), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(CoordinateError::Invalid);
    };
    let lat: f64 = lat.parse().map_err(|_| CoordinateError::Invalid)?;
    let lng: f64 = lng.parse().map_err(|_| CoordinateError::Invalid)?;
    if !lat.is_finite() || !lng.is_finite() {
        return Err(CoordinateError::Invalid);
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(CoordinateError::LatitudeOutOfRange);
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(CoordinateError::LongitudeOutOfRange);
    }
    Ok(LatLng::new(lat, lng))
}

/// Parse `"lat,lng; lat,lng; ..."` into polygon vertices
pub fn parse_polygon(input: &str) -> Result<Vec<LatLng>, CoordinateError> {
    let vertices = input
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_coordinate)
        .collect::<Result<Vec<_>, _>>()?;
    if vertices.len() < MIN_AREA_VERTICES {
        return Err(CoordinateError::TooFewPoints);
    }
    Ok(vertices)
}

/// Label given to a manually entered polygon
pub fn farm_area_label(vertex_count: usize) -> String {
    format!("Farm Area ({vertex_count} vertices)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinate_formats() {
        assert_eq!(parse_coordinate("0.2, 35.1"), Ok(LatLng::new(0.2, 35.1)));
        assert_eq!(parse_coordinate(" -0.5 36 "), Ok(LatLng::new(-0.5, 36.0)));
    }

    #[test]
    fn test_parse_coordinate_errors() {
        assert_eq!(parse_coordinate("abc, 35"), Err(CoordinateError::Invalid));
        assert_eq!(parse_coordinate("0.2"), Err(CoordinateError::Invalid));
        assert_eq!(parse_coordinate("1, 2, 3"), Err(CoordinateError::Invalid));
        assert_eq!(parse_coordinate("91, 35"), Err(CoordinateError::LatitudeOutOfRange));
        assert_eq!(parse_coordinate("0, -181"), Err(CoordinateError::LongitudeOutOfRange));
        assert_eq!(
            CoordinateError::LatitudeOutOfRange.to_string(),
            "Latitude must be between -90 and 90"
        );
    }

    #[test]
    fn test_parse_polygon() {
        let vertices = parse_polygon("0.20,35.10; 0.20,35.12; 0.22,35.12;").unwrap();
        assert_eq!(vertices.len(), 3);
        assert_eq!(parse_polygon("0.2,35.1; 0.3,35.2"), Err(CoordinateError::TooFewPoints));
        assert_eq!(parse_polygon("0.2,35.1; x; 0.3,35.2"), Err(CoordinateError::Invalid));
        assert_eq!(farm_area_label(4), "Farm Area (4 vertices)");
    }

    #[test]
    fn test_configured_geolocator() {
        let fix = LatLng::new(0.2, 35.1);
        assert_eq!(ConfiguredGeolocator::new(Some(fix)).current_position(), Ok(fix));
        assert_eq!(
            ConfiguredGeolocator::default().current_position(),
            Err(GeolocationError::Unsupported)
        );
    }
}
