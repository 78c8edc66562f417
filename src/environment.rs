//! Environmental readings for a location.
//!
//! There is no real model behind these numbers. [`MockEnvironmentalDataProvider`]
//! fabricates them deterministically from the coordinate so the same place
//! always shows the same values; swap in another [`EnvironmentalDataProvider`]
//! to back the views with real data.

use crate::geo::LatLng;
use crate::hash::{hash_coord, pick_range, unit_float};

pub const SOIL_TYPES: [&str; 3] = ["Clay Loam", "Sandy Loam", "Silty Clay"];

/// One snapshot of conditions at a location
#[derive(Clone, Debug, PartialEq)]
pub struct EnvironmentalReading {
    /// Suitability score, percent
    pub suitability: u32,
    /// Annual rainfall, mm
    pub rainfall_mm: u32,
    /// Mean temperature, °C
    pub temperature_c: u32,
    pub ndvi: f64,
    pub soil_type: &'static str,
    /// Terrain elevation, m
    pub elevation_m: u32,
}

/// Thematic map overlays
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayLayer {
    Suitability,
    Ndvi,
    Rainfall,
    Temperature,
    Elevation,
    Soil,
}

impl OverlayLayer {
    pub const ALL: [OverlayLayer; 6] = [
        OverlayLayer::Suitability,
        OverlayLayer::Ndvi,
        OverlayLayer::Rainfall,
        OverlayLayer::Temperature,
        OverlayLayer::Elevation,
        OverlayLayer::Soil,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OverlayLayer::Suitability => "Suitability Zones",
            OverlayLayer::Ndvi => "NDVI (Vegetation)",
            OverlayLayer::Rainfall => "Rainfall",
            OverlayLayer::Temperature => "Temperature",
            OverlayLayer::Elevation => "Elevation (Terrain)",
            OverlayLayer::Soil => "Soil Type",
        }
    }

    /// Cycle None -> first layer -> ... -> last layer -> None
    pub fn cycle(current: Option<OverlayLayer>) -> Option<OverlayLayer> {
        match current {
            None => Some(Self::ALL[0]),
            Some(layer) => {
                let idx = Self::ALL.iter().position(|l| *l == layer).unwrap_or(0);
                Self::ALL.get(idx + 1).copied()
            }
        }
    }
}

/// Source of environmental data for the views
pub trait EnvironmentalDataProvider {
    fn reading(&self, at: LatLng) -> EnvironmentalReading;

    /// Rainfall per month (Jan..Dec), mm
    fn monthly_rainfall(&self, at: LatLng) -> [u32; 12];

    /// Layer value normalized to [0, 1] for overlay shading
    fn layer_value(&self, layer: OverlayLayer, at: LatLng) -> f64 {
        let r = self.reading(at);
        match layer {
            OverlayLayer::Suitability => (r.suitability as f64 - 65.0) / 30.0,
            OverlayLayer::Ndvi => (r.ndvi - 0.5) / 0.4,
            OverlayLayer::Rainfall => (r.rainfall_mm as f64 - 800.0) / 500.0,
            OverlayLayer::Temperature => (r.temperature_c as f64 - 20.0) / 5.0,
            OverlayLayer::Elevation => (r.elevation_m as f64 - 1300.0) / 1200.0,
            OverlayLayer::Soil => {
                let idx = SOIL_TYPES.iter().position(|s| *s == r.soil_type).unwrap_or(0);
                idx as f64 / (SOIL_TYPES.len() - 1) as f64
            }
        }
        .clamp(0.0, 1.0)
    }
}

/// Placeholder data derived from a hash of the coordinate
#[derive(Clone, Debug, Default)]
pub struct MockEnvironmentalDataProvider {
    seed: u64,
}

impl MockEnvironmentalDataProvider {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn draw(&self, at: LatLng, channel: u64) -> u64 {
        hash_coord(at, self.seed.wrapping_mul(31).wrapping_add(channel))
    }
}

impl EnvironmentalDataProvider for MockEnvironmentalDataProvider {
    fn reading(&self, at: LatLng) -> EnvironmentalReading {
        let ndvi = 0.5 + unit_float(self.draw(at, 3)) * 0.4;
        let soil_idx = pick_range(self.draw(at, 4), 0, SOIL_TYPES.len() as u32) as usize;
        EnvironmentalReading {
            suitability: pick_range(self.draw(at, 0), 65, 30),
            rainfall_mm: pick_range(self.draw(at, 1), 800, 500),
            temperature_c: pick_range(self.draw(at, 2), 20, 5),
            ndvi: (ndvi * 100.0).round() / 100.0,
            soil_type: SOIL_TYPES[soil_idx.min(SOIL_TYPES.len() - 1)],
            elevation_m: pick_range(self.draw(at, 5), 1300, 1200),
        }
    }

    fn monthly_rainfall(&self, at: LatLng) -> [u32; 12] {
        // Long rains peak Apr-May, short rains Aug-Oct
        const SEASONAL: [f64; 12] = [
            0.35, 0.45, 0.9, 1.55, 1.6, 1.0, 1.05, 1.25, 1.2, 1.0, 0.75, 0.4,
        ];
        let annual = self.reading(at).rainfall_mm as f64;
        let mut months = [0u32; 12];
        for (m, weight) in SEASONAL.iter().enumerate() {
            let jitter = 0.85 + unit_float(self.draw(at, 100 + m as u64)) * 0.3;
            months[m] = (annual / 12.0 * weight * jitter).round() as u32;
        }
        months
    }
}
