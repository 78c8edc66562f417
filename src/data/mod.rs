//! Boundary data: county outline and ward polygons.
//!
//! The remote API hands back GeoJSON whose property names vary between
//! datasets. Normalization here tries each known key in a fixed order and
//! falls back to a sentinel instead of failing.

mod client;
mod error;

pub use client::{BoundaryClient, DEFAULT_BASE_URL};
pub use error::BoundaryError;

use geojson::{Feature, GeoJson, Geometry, JsonObject, Value};
use rayon::prelude::*;
use tracing::warn;

use crate::context::DEFAULT_COUNTY;
use crate::geo::{self, BoundingBox, LatLng};

pub const UNKNOWN_WARD: &str = "Unknown Ward";

/// Ward name keys, highest priority first
pub const WARD_NAME_KEYS: [&str; 11] = [
    "NAME",
    "name",
    "WARD_NAME",
    "Ward_Name",
    "ward_name",
    "Name",
    "ADM3_EN",
    "WARDNAME",
    "WardName",
    "ward",
    "Ward",
];

pub const SUB_COUNTY_KEYS: [&str; 5] = ["SUB_COUNTY", "sub_county", "SubCounty", "SUBCOUNTY", "ADM2_EN"];
pub const POPULATION_KEYS: [&str; 2] = ["population", "POPULATION"];
pub const ELEVATION_KEYS: [&str; 2] = ["elevation", "ELEVATION"];
pub const COUNTY_NAME_KEYS: [&str; 3] = ["name", "NAME", "COUNTY"];

/// A closed outline as open vertex list (no repeated closing vertex)
pub type Ring = Vec<LatLng>;

/// One administrative ward
#[derive(Clone, Debug, PartialEq)]
pub struct WardRecord {
    pub name: String,
    pub sub_county: Option<String>,
    pub population: Option<u64>,
    pub elevation: Option<String>,
    /// Exterior rings; more than one for multipart wards
    pub rings: Vec<Ring>,
    /// Vertex mean of the first ring, used to place the camera
    pub center: LatLng,
}

impl WardRecord {
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.rings
            .iter()
            .filter_map(|r| geo::bounds(r))
            .reduce(|a, b| a.union(&b))
    }

    pub fn contains(&self, p: LatLng) -> bool {
        self.rings.iter().any(|r| geo::point_in_ring(p, r))
    }
}

/// County outline
#[derive(Clone, Debug, PartialEq)]
pub struct CountyBoundary {
    pub name: String,
    pub rings: Vec<Ring>,
}

impl CountyBoundary {
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.rings
            .iter()
            .filter_map(|r| geo::bounds(r))
            .reduce(|a, b| a.union(&b))
    }
}

/// First non-empty string under any of the keys, in order
pub fn lookup_str(props: Option<&JsonObject>, keys: &[&str]) -> Option<String> {
    let props = props?;
    keys.iter().find_map(|key| match props.get(*key)? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lookup_u64(props: Option<&JsonObject>, keys: &[&str]) -> Option<u64> {
    let props = props?;
    keys.iter().find_map(|key| match props.get(*key)? {
        serde_json::Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        serde_json::Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    })
}

/// Resolve a ward's display name, falling back to [`UNKNOWN_WARD`]
pub fn ward_name(props: Option<&JsonObject>) -> String {
    lookup_str(props, &WARD_NAME_KEYS).unwrap_or_else(|| UNKNOWN_WARD.to_string())
}

/// Exterior rings of a polygonal geometry, positions as written (closing vertex kept)
fn raw_exterior_rings(geometry: &Geometry) -> Vec<Ring> {
    fn ring(coords: &[Vec<f64>]) -> Ring {
        coords.iter().filter_map(|c| LatLng::from_position(c)).collect()
    }

    match &geometry.value {
        Value::Polygon(rings) => rings.first().map(|r| vec![ring(r)]).unwrap_or_default(),
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .filter_map(|rings| rings.first().map(|r| ring(r)))
            .collect(),
        Value::GeometryCollection(geometries) => {
            geometries.iter().flat_map(raw_exterior_rings).collect()
        }
        _ => Vec::new(),
    }
}

/// Exterior rings of a polygonal geometry, each opened
pub fn exterior_rings(geometry: &Geometry) -> Vec<Ring> {
    raw_exterior_rings(geometry)
        .into_iter()
        .map(geo::open_ring)
        .collect()
}

/// Normalize one ward feature. Returns `None` for non-polygonal geometry.
pub fn ward_from_feature(feature: &Feature) -> Option<WardRecord> {
    let props = feature.properties.as_ref();
    let name = ward_name(props);

    let raw: Vec<Ring> = feature
        .geometry
        .as_ref()
        .map(raw_exterior_rings)
        .unwrap_or_default()
        .into_iter()
        .filter(|r| !r.is_empty())
        .collect();

    // Equal-weight mean over every position of the first ring, closing vertex included
    let Some(center) = raw.first().and_then(|r| geo::centroid(r)) else {
        warn!(ward = %name, "ward feature has no polygon geometry, skipping");
        return None;
    };
    let rings: Vec<Ring> = raw.into_iter().map(geo::open_ring).collect();

    Some(WardRecord {
        name,
        sub_county: lookup_str(props, &SUB_COUNTY_KEYS),
        population: lookup_u64(props, &POPULATION_KEYS),
        elevation: lookup_str(props, &ELEVATION_KEYS),
        rings,
        center,
    })
}

/// Normalize every ward in a GeoJSON document (features processed in parallel, order kept)
pub fn parse_wards(geojson: &GeoJson) -> Vec<WardRecord> {
    match geojson {
        GeoJson::FeatureCollection(fc) => fc.features.par_iter().filter_map(ward_from_feature).collect(),
        GeoJson::Feature(f) => ward_from_feature(f).into_iter().collect(),
        GeoJson::Geometry(_) => Vec::new(),
    }
}

/// Extract the county outline from a `Feature` or `FeatureCollection`
pub fn parse_county(geojson: &GeoJson) -> Result<CountyBoundary, BoundaryError> {
    let mut name = None;
    let mut rings = Vec::new();

    let features: Vec<&Feature> = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features.iter().collect(),
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(g) => {
            rings.extend(exterior_rings(g).into_iter().filter(|r| r.len() >= 3));
            Vec::new()
        }
    };

    for feature in features {
        if name.is_none() {
            name = lookup_str(feature.properties.as_ref(), &COUNTY_NAME_KEYS);
        }
        if let Some(geometry) = &feature.geometry {
            rings.extend(exterior_rings(geometry).into_iter().filter(|r| r.len() >= 3));
        }
    }

    if rings.is_empty() {
        return Err(BoundaryError::NoGeometry {
            what: "county boundary",
        });
    }

    Ok(CountyBoundary {
        name: name.unwrap_or_else(|| DEFAULT_COUNTY.to_string()),
        rings,
    })
}
