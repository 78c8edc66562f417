//! Spatial selection state machine.
//!
//! Tracks which drawing mode is bound to map clicks and the polygon being
//! drawn. Finished selections are handed back to the caller as [`Selection`]
//! values; this module never touches the shared location context itself.

use thiserror::Error;
use tracing::debug;

use crate::geo::{self, BoundingBox, LatLng};

/// Radius of the disc drawn around a picked point, meters
pub const POINT_BUFFER_M: f64 = 500.0;

/// Smallest polygon a user may finish
pub const MIN_AREA_VERTICES: usize = 3;

/// Interaction bound to map clicks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpatialMode {
    #[default]
    Idle,
    PointPick,
    AreaDraw,
}

impl SpatialMode {
    pub fn label(self) -> &'static str {
        match self {
            SpatialMode::Idle => "Browse",
            SpatialMode::PointPick => "Point",
            SpatialMode::AreaDraw => "Area",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("Please select at least 3 points to create an area ({count} selected). Press Backspace to undo points.")]
    TooFewVertices { count: usize },

    #[error("The selected area has no extent. Spread the points out and try again.")]
    DegenerateArea,

    #[error("Not drawing an area. Press 'a' to start one.")]
    NotDrawing,
}

/// A completed spatial selection
#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    Point {
        center: LatLng,
        buffer_m: f64,
    },
    Area {
        vertices: Vec<LatLng>,
        centroid: LatLng,
        bounds: BoundingBox,
        area_ha: f64,
    },
}

impl Selection {
    pub fn point(center: LatLng) -> Self {
        Selection::Point {
            center,
            buffer_m: POINT_BUFFER_M,
        }
    }

    /// Validate a vertex ring and compute its summary geometry
    pub fn area(vertices: Vec<LatLng>) -> Result<Self, SelectionError> {
        let vertices = geo::open_ring(vertices);
        if vertices.len() < MIN_AREA_VERTICES {
            return Err(SelectionError::TooFewVertices {
                count: vertices.len(),
            });
        }

        let bounds = geo::bounds(&vertices).ok_or(SelectionError::DegenerateArea)?;
        if bounds.is_degenerate() {
            return Err(SelectionError::DegenerateArea);
        }
        let centroid = geo::centroid(&vertices).ok_or(SelectionError::DegenerateArea)?;
        let area_ha = geo::polygon_area_hectares(&vertices);

        Ok(Selection::Area {
            vertices,
            centroid,
            bounds,
            area_ha,
        })
    }

    pub fn center(&self) -> LatLng {
        match self {
            Selection::Point { center, .. } => *center,
            Selection::Area { centroid, .. } => *centroid,
        }
    }
}

/// Result of an undo gesture
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UndoOutcome {
    Removed { remaining: usize },
    /// Nothing left to remove, the session went back to idle
    Exited,
    Ignored,
}

/// Transient drawing state
#[derive(Clone, Debug, Default)]
pub struct SelectionSession {
    mode: SpatialMode,
    draft: Vec<LatLng>,
}

impl SelectionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> SpatialMode {
        self.mode
    }

    pub fn draft(&self) -> &[LatLng] {
        &self.draft
    }

    pub fn is_active(&self) -> bool {
        self.mode != SpatialMode::Idle
    }

    /// Bind a mode to map clicks. Any in-progress drawing is discarded.
    pub fn activate(&mut self, mode: SpatialMode) {
        if self.mode != mode {
            debug!(from = ?self.mode, to = ?mode, "spatial mode change");
        }
        self.draft.clear();
        self.mode = mode;
    }

    /// Feed a map click. Point picks finish immediately; area clicks add a vertex.
    pub fn click(&mut self, at: LatLng) -> Option<Selection> {
        match self.mode {
            SpatialMode::Idle => None,
            SpatialMode::PointPick => Some(Selection::point(at)),
            SpatialMode::AreaDraw => {
                self.draft.push(at);
                debug!(vertices = self.draft.len(), "area vertex added");
                None
            }
        }
    }

    /// Close the polygon being drawn.
    ///
    /// On failure the session keeps its mode and vertices.
    pub fn finish(&mut self) -> Result<Selection, SelectionError> {
        if self.mode != SpatialMode::AreaDraw {
            return Err(SelectionError::NotDrawing);
        }
        if self.draft.len() < MIN_AREA_VERTICES {
            return Err(SelectionError::TooFewVertices {
                count: self.draft.len(),
            });
        }

        let selection = Selection::area(self.draft.clone())?;
        self.draft.clear();
        self.mode = SpatialMode::Idle;
        Ok(selection)
    }

    pub fn undo(&mut self) -> UndoOutcome {
        if self.mode != SpatialMode::AreaDraw {
            return UndoOutcome::Ignored;
        }
        if self.draft.pop().is_some() {
            UndoOutcome::Removed {
                remaining: self.draft.len(),
            }
        } else {
            self.mode = SpatialMode::Idle;
            UndoOutcome::Exited
        }
    }

    pub fn cancel(&mut self) {
        self.draft.clear();
        self.mode = SpatialMode::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lat: f64, lng: f64) -> LatLng {
        LatLng::new(lat, lng)
    }

    #[test]
    fn test_point_pick_is_repeatable() {
        let mut session = SelectionSession::new();
        session.activate(SpatialMode::PointPick);

        let first = session.click(p(0.21, 35.11)).unwrap();
        assert_eq!(
            first,
            Selection::Point {
                center: p(0.21, 35.11),
                buffer_m: 500.0
            }
        );
        assert_eq!(session.mode(), SpatialMode::PointPick);

        let second = session.click(p(0.22, 35.12)).unwrap();
        assert_eq!(second.center(), p(0.22, 35.12));
        assert_eq!(session.mode(), SpatialMode::PointPick);
    }

    #[test]
    fn test_idle_click_emits_nothing() {
        let mut session = SelectionSession::new();
        assert!(session.click(p(0.2, 35.1)).is_none());
        assert!(session.draft().is_empty());
    }

    #[test]
    fn test_area_draw_and_finish() {
        let mut session = SelectionSession::new();
        session.activate(SpatialMode::AreaDraw);
        for v in [p(0.20, 35.10), p(0.20, 35.12), p(0.22, 35.12), p(0.22, 35.10)] {
            assert!(session.click(v).is_none());
        }
        assert_eq!(session.draft().len(), 4);

        let Selection::Area {
            vertices,
            centroid,
            bounds,
            area_ha,
        } = session.finish().unwrap()
        else {
            panic!("expected area");
        };
        assert_eq!(vertices.len(), 4);
        assert!((centroid.lat - 0.21).abs() < 1e-12);
        assert!((centroid.lng - 35.11).abs() < 1e-12);
        assert_eq!(bounds.north, 0.22);
        assert!(area_ha > 0.0);
        assert_eq!(session.mode(), SpatialMode::Idle);
        assert!(session.draft().is_empty());
    }

    #[test]
    fn test_finish_with_two_vertices_is_rejected() {
        let mut session = SelectionSession::new();
        session.activate(SpatialMode::AreaDraw);
        session.click(p(0.20, 35.10));
        session.click(p(0.21, 35.11));

        let err = session.finish().unwrap_err();
        assert_eq!(err, SelectionError::TooFewVertices { count: 2 });
        assert_eq!(session.mode(), SpatialMode::AreaDraw);
        assert_eq!(session.draft(), &[p(0.20, 35.10), p(0.21, 35.11)]);
    }

    #[test]
    fn test_collinear_area_is_degenerate() {
        let err = Selection::area(vec![p(0.2, 35.1), p(0.2, 35.2), p(0.2, 35.3)]).unwrap_err();
        assert_eq!(err, SelectionError::DegenerateArea);
    }

    #[test]
    fn test_closing_vertex_is_not_counted() {
        let err = Selection::area(vec![p(0.2, 35.1), p(0.3, 35.2), p(0.2, 35.1)]).unwrap_err();
        assert_eq!(err, SelectionError::TooFewVertices { count: 2 });
    }

    #[test]
    fn test_mode_switch_drops_draft() {
        let mut session = SelectionSession::new();
        session.activate(SpatialMode::AreaDraw);
        session.click(p(0.20, 35.10));
        session.click(p(0.21, 35.11));

        session.activate(SpatialMode::PointPick);
        assert_eq!(session.mode(), SpatialMode::PointPick);
        assert!(session.draft().is_empty());

        session.activate(SpatialMode::AreaDraw);
        assert!(session.draft().is_empty());
    }

    #[test]
    fn test_undo_pops_then_exits() {
        let mut session = SelectionSession::new();
        session.activate(SpatialMode::AreaDraw);
        session.click(p(0.20, 35.10));
        session.click(p(0.21, 35.11));

        assert_eq!(session.undo(), UndoOutcome::Removed { remaining: 1 });
        assert_eq!(session.undo(), UndoOutcome::Removed { remaining: 0 });
        assert_eq!(session.mode(), SpatialMode::AreaDraw);
        assert_eq!(session.undo(), UndoOutcome::Exited);
        assert_eq!(session.mode(), SpatialMode::Idle);
        assert_eq!(session.undo(), UndoOutcome::Ignored);
    }

    #[test]
    fn test_cancel_discards_drawing() {
        let mut session = SelectionSession::new();
        session.activate(SpatialMode::AreaDraw);
        session.click(p(0.20, 35.10));
        session.cancel();
        assert_eq!(session.mode(), SpatialMode::Idle);
        assert!(session.draft().is_empty());
    }

    #[test]
    fn test_finish_outside_area_mode() {
        let mut session = SelectionSession::new();
        session.activate(SpatialMode::PointPick);
        assert_eq!(session.finish().unwrap_err(), SelectionError::NotDrawing);
    }
}
