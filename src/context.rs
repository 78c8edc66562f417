//! The shared "where is the user looking" record and its one-shot restore slot.

use tracing::{debug, info};

use crate::environment::EnvironmentalReading;
use crate::geo::{BoundingBox, LatLng};
use crate::selection::{Selection, SelectionError};

pub const DEFAULT_COUNTY: &str = "Nandi County";
pub const DEFAULT_COUNTY_CENTER: LatLng = LatLng::new(0.1807, 35.4314);

/// Map zoom level accepted by the viewport (tile-map convention)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ZoomLevel(u8);

impl ZoomLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 18;

    pub const COUNTY: ZoomLevel = ZoomLevel(10);
    pub const WARD: ZoomLevel = ZoomLevel(12);
    pub const AREA: ZoomLevel = ZoomLevel(14);
    pub const POINT: ZoomLevel = ZoomLevel(15);

    pub fn new(level: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&level).then_some(Self(level))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

/// Variant payload of a [`LocationContext`]
#[derive(Clone, Debug, PartialEq)]
pub enum ContextKind {
    Ward {
        ward: String,
    },
    Point {
        buffer_m: f64,
    },
    Area {
        vertices: Vec<LatLng>,
        bounds: BoundingBox,
        area_ha: f64,
    },
}

/// Current geographic focus, shared by every view
#[derive(Clone, Debug, PartialEq)]
pub struct LocationContext {
    pub label: String,
    pub center: LatLng,
    pub zoom_hint: ZoomLevel,
    pub kind: ContextKind,
}

impl LocationContext {
    /// County-wide context the app starts with
    pub fn county() -> Self {
        Self::ward(DEFAULT_COUNTY, DEFAULT_COUNTY_CENTER, ZoomLevel::COUNTY)
    }

    pub fn ward(name: &str, center: LatLng, zoom_hint: ZoomLevel) -> Self {
        Self {
            label: name.to_string(),
            center,
            zoom_hint,
            kind: ContextKind::Ward {
                ward: name.to_string(),
            },
        }
    }

    /// Context for a finished map or manual selection
    pub fn from_selection(selection: Selection, label: Option<String>) -> Self {
        match selection {
            Selection::Point { center, buffer_m } => Self {
                label: label.unwrap_or_else(|| format!("{:.4}, {:.4}", center.lat, center.lng)),
                center,
                zoom_hint: ZoomLevel::POINT,
                kind: ContextKind::Point { buffer_m },
            },
            Selection::Area {
                vertices,
                centroid,
                bounds,
                area_ha,
            } => Self {
                label: label
                    .unwrap_or_else(|| format!("{:.4}, {:.4}", centroid.lat, centroid.lng)),
                center: centroid,
                zoom_hint: ZoomLevel::AREA,
                kind: ContextKind::Area {
                    vertices,
                    bounds,
                    area_ha,
                },
            },
        }
    }

    /// Area context built directly from vertices (manual polygon entry)
    pub fn area(vertices: Vec<LatLng>, label: Option<String>) -> Result<Self, SelectionError> {
        Selection::area(vertices).map(|s| Self::from_selection(s, label))
    }

    pub fn is_ward(&self) -> bool {
        matches!(self.kind, ContextKind::Ward { .. })
    }

    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            ContextKind::Ward { .. } => "Ward",
            ContextKind::Point { .. } => "Point",
            ContextKind::Area { .. } => "Area",
        }
    }

    /// One-line description for headers
    pub fn describe(&self) -> String {
        match &self.kind {
            ContextKind::Ward { .. } => self.label.clone(),
            ContextKind::Point { buffer_m } => {
                format!("Point {} ({:.0}m buffer)", self.label, buffer_m)
            }
            ContextKind::Area { area_ha, .. } => {
                format!("Area {} ({:.2} ha)", self.label, area_ha)
            }
        }
    }
}

/// Info-panel payload describing a selected place
#[derive(Clone, Debug, PartialEq)]
pub struct LocationDetails {
    pub name: String,
    pub kind: &'static str,
    pub county: String,
    pub sub_county: Option<String>,
    pub coordinates: LatLng,
    /// Buffer or area summary for probes
    pub extent: Option<String>,
    pub reading: EnvironmentalReading,
}

/// Snapshot taken before a transient probe
#[derive(Clone, Debug, PartialEq)]
pub struct RestorePoint {
    pub context: LocationContext,
    pub panel: Option<LocationDetails>,
}

/// Single owner of the current [`LocationContext`]
#[derive(Debug)]
pub struct LocationContextStore {
    current: LocationContext,
    restore: Option<RestorePoint>,
    revision: u64,
}

impl LocationContextStore {
    pub fn new(initial: LocationContext) -> Self {
        Self {
            current: initial,
            restore: None,
            revision: 0,
        }
    }

    pub fn current(&self) -> &LocationContext {
        &self.current
    }

    /// Bumped on every replacement so views can tell a new context apart
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace the context wholesale
    pub fn set_context(&mut self, context: LocationContext) -> &LocationContext {
        info!(kind = context.kind_label(), label = %context.label, "location context set");
        self.current = context;
        self.revision += 1;
        &self.current
    }

    /// Remember the current ward context and panel, overwriting any older snapshot.
    ///
    /// Returns false (and keeps the existing snapshot) when the current context
    /// is a point or area probe.
    pub fn capture_restore_point(&mut self, panel: Option<LocationDetails>) -> bool {
        if !self.current.is_ward() {
            debug!("restore point not captured, context is {}", self.current.kind_label());
            return false;
        }
        self.restore = Some(RestorePoint {
            context: self.current.clone(),
            panel,
        });
        true
    }

    /// Take the snapshot. A second call returns `None`.
    pub fn consume_restore_point(&mut self) -> Option<RestorePoint> {
        self.restore.take()
    }

    pub fn restore_point(&self) -> Option<&RestorePoint> {
        self.restore.as_ref()
    }
}

impl Default for LocationContextStore {
    fn default() -> Self {
        Self::new(LocationContext::county())
    }
}
