use rayon::prelude::*;

use crate::braille::BrailleCanvas;
use crate::context::{ContextKind, LocationContext};
use crate::data::{CountyBoundary, WardRecord};
use crate::environment::{EnvironmentalDataProvider, OverlayLayer};
use crate::geo::{BoundingBox, LatLng};
use crate::map::geometry::{draw_circle, draw_circle_outline, draw_marker, draw_path};
use crate::map::projection::Viewport;
use crate::map::spatial::{WardIndex, WARD_CELL_DEG};

/// Number of shading bands an overlay is split into (low to high)
pub const OVERLAY_BANDS: usize = 4;

/// Sparse dot pattern used to shade overlay cells
const STIPPLE: u8 = 0x01 | 0x20;

/// Ward names are only drawn from this zoom level up
const LABEL_MIN_LEVEL: u8 = 11;

/// Display settings for map layers
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_county: bool,
    pub show_wards: bool,
    pub show_labels: bool,
    pub overlay: Option<OverlayLayer>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_county: true,
            show_wards: true,
            show_labels: true,
            overlay: None,
        }
    }
}

/// Rendered layers, composited back to front by the UI
pub struct MapLayers {
    pub overlay: [BrailleCanvas; OVERLAY_BANDS],
    pub county: BrailleCanvas,
    pub wards: BrailleCanvas,
    /// Selected ward, picked point or finished area
    pub focus: BrailleCanvas,
    /// Polygon being drawn
    pub draft: BrailleCanvas,
    /// (column, row, text) in character cells
    pub labels: Vec<(u16, u16, String)>,
}

impl MapLayers {
    fn new(width: usize, height: usize) -> Self {
        Self {
            overlay: std::array::from_fn(|_| BrailleCanvas::new(width, height)),
            county: BrailleCanvas::new(width, height),
            wards: BrailleCanvas::new(width, height),
            focus: BrailleCanvas::new(width, height),
            draft: BrailleCanvas::new(width, height),
            labels: Vec::new(),
        }
    }
}

/// What the user has selected, drawn on top of the base map
pub struct SelectionOverlay<'a> {
    pub context: &'a LocationContext,
    pub draft: &'a [LatLng],
}

/// County and ward geometry plus the layer switches
#[derive(Default)]
pub struct MapRenderer {
    county: Option<CountyBoundary>,
    wards: Vec<WardRecord>,
    index: WardIndex,
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_county(&mut self, county: CountyBoundary) {
        self.county = Some(county);
    }

    pub fn set_wards(&mut self, wards: Vec<WardRecord>) {
        self.index = WardIndex::build(&wards, WARD_CELL_DEG);
        self.wards = wards;
    }

    pub fn county(&self) -> Option<&CountyBoundary> {
        self.county.as_ref()
    }

    pub fn wards(&self) -> &[WardRecord] {
        &self.wards
    }

    pub fn has_wards(&self) -> bool {
        !self.wards.is_empty()
    }

    /// Ward whose outline contains `p`
    pub fn ward_at(&self, p: LatLng) -> Option<&WardRecord> {
        self.index
            .lookup(&self.wards, p)
            .and_then(|idx| self.wards.get(idx))
    }

    pub fn ward_named(&self, name: &str) -> Option<&WardRecord> {
        self.wards.iter().find(|w| w.name == name)
    }

    /// County outline bounds, falling back to the union of ward bounds
    pub fn data_bounds(&self) -> Option<BoundingBox> {
        self.county.as_ref().and_then(CountyBoundary::bounds).or_else(|| {
            self.wards
                .iter()
                .filter_map(WardRecord::bounds)
                .reduce(|a, b| a.union(&b))
        })
    }

    pub fn toggle_county(&mut self) {
        self.settings.show_county = !self.settings.show_county;
    }

    pub fn toggle_wards(&mut self) {
        self.settings.show_wards = !self.settings.show_wards;
    }

    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }

    pub fn cycle_overlay(&mut self) {
        self.settings.overlay = OverlayLayer::cycle(self.settings.overlay);
    }

    /// Render every layer into canvases of `width` x `height` characters
    pub fn render(
        &self,
        width: usize,
        height: usize,
        viewport: &Viewport,
        selection: &SelectionOverlay<'_>,
        provider: &(dyn EnvironmentalDataProvider + Sync),
    ) -> MapLayers {
        let mut layers = MapLayers::new(width, height);
        let visible = self.index.query_bbox(&viewport.visible_bounds());

        if let Some(layer) = self.settings.overlay {
            self.render_overlay(&mut layers, viewport, layer, provider);
        }

        if self.settings.show_county {
            if let Some(county) = &self.county {
                for ring in &county.rings {
                    draw_path(&mut layers.county, viewport, ring, true, false);
                }
            }
        }

        if self.settings.show_wards {
            for ward in visible.iter().filter_map(|&i| self.wards.get(i)) {
                for ring in &ward.rings {
                    draw_path(&mut layers.wards, viewport, ring, true, false);
                }
            }
        }

        self.render_selection(&mut layers, viewport, selection);

        if self.settings.show_labels && viewport.level() >= LABEL_MIN_LEVEL {
            for ward in visible.iter().filter_map(|&i| self.wards.get(i)) {
                let (px, py) = viewport.project(ward.center);
                if !viewport.is_visible(px, py) || px < 0 || py < 0 {
                    continue;
                }
                let half = (ward.name.chars().count() / 2) as u16;
                let col = ((px / 2) as u16).saturating_sub(half);
                layers.labels.push((col, (py / 4) as u16, ward.name.clone()));
            }
        }

        layers
    }

    /// Shade each character cell by the overlay value of the ward under it
    fn render_overlay(
        &self,
        layers: &mut MapLayers,
        viewport: &Viewport,
        layer: OverlayLayer,
        provider: &(dyn EnvironmentalDataProvider + Sync),
    ) {
        if self.wards.is_empty() {
            return;
        }
        let width = layers.county.width();
        let height = layers.county.height();

        let bands: Vec<(usize, usize, usize)> = (0..height)
            .into_par_iter()
            .flat_map_iter(|cy| {
                (0..width).filter_map(move |cx| {
                    let at = viewport.unproject(cx as i32 * 2 + 1, cy as i32 * 4 + 2);
                    let ward = self.ward_at(at)?;
                    let value = provider.layer_value(layer, ward.center);
                    let band = ((value * OVERLAY_BANDS as f64) as usize).min(OVERLAY_BANDS - 1);
                    Some((cx, cy, band))
                })
            })
            .collect();

        for (cx, cy, band) in bands {
            layers.overlay[band].stamp_cell(cx, cy, STIPPLE);
        }
    }

    fn render_selection(
        &self,
        layers: &mut MapLayers,
        viewport: &Viewport,
        selection: &SelectionOverlay<'_>,
    ) {
        let context = selection.context;
        match &context.kind {
            ContextKind::Ward { ward } => {
                if let Some(record) = self.ward_named(ward) {
                    for ring in &record.rings {
                        draw_path(&mut layers.focus, viewport, ring, true, true);
                    }
                }
            }
            ContextKind::Point { buffer_m } => {
                let (px, py) = viewport.project(context.center);
                let radius = viewport.meters_to_pixels(*buffer_m, context.center.lat);
                draw_circle_outline(&mut layers.focus, px, py, radius.round() as i32);
                draw_marker(&mut layers.focus, px, py, 2);
            }
            ContextKind::Area { vertices, .. } => {
                draw_path(&mut layers.focus, viewport, vertices, true, false);
                for v in vertices {
                    let (px, py) = viewport.project(*v);
                    draw_circle(&mut layers.focus, px, py, 1);
                }
            }
        }

        if !selection.draft.is_empty() {
            draw_path(&mut layers.draft, viewport, selection.draft, false, false);
            for v in selection.draft {
                let (px, py) = viewport.project(*v);
                draw_circle(&mut layers.draft, px, py, 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ZoomLevel;
    use crate::environment::MockEnvironmentalDataProvider;

    const KAPSABET: LatLng = LatLng::new(0.20, 35.10);

    fn ward() -> WardRecord {
        WardRecord {
            name: "Kapsabet".to_string(),
            sub_county: Some("Emgwen".to_string()),
            population: None,
            elevation: None,
            rings: vec![vec![
                LatLng::new(0.18, 35.08),
                LatLng::new(0.18, 35.12),
                LatLng::new(0.22, 35.12),
                LatLng::new(0.22, 35.08),
            ]],
            center: KAPSABET,
        }
    }

    fn renderer() -> MapRenderer {
        let mut r = MapRenderer::new();
        r.set_wards(vec![ward()]);
        r
    }

    #[test]
    fn test_ward_at_uses_index() {
        let r = renderer();
        assert_eq!(r.ward_at(KAPSABET).map(|w| w.name.as_str()), Some("Kapsabet"));
        assert!(r.ward_at(LatLng::new(1.0, 36.0)).is_none());
        assert!(r.data_bounds().is_some());
    }

    #[test]
    fn test_render_draws_wards_and_labels() {
        let r = renderer();
        let vp = Viewport::at_level(KAPSABET, ZoomLevel::WARD, 120, 80);
        let context = LocationContext::county();
        let overlay = SelectionOverlay { context: &context, draft: &[] };
        let layers = r.render(60, 20, &vp, &overlay, &MockEnvironmentalDataProvider::default());

        assert!(!layers.wards.is_blank());
        assert!(layers.focus.is_blank());
        assert!(layers.draft.is_blank());
        assert_eq!(layers.labels.len(), 1);
        assert_eq!(layers.labels[0].2, "Kapsabet");
    }

    #[test]
    fn test_render_highlights_selected_ward_and_draft() {
        let r = renderer();
        let vp = Viewport::at_level(KAPSABET, ZoomLevel::WARD, 120, 80);
        let context = LocationContext::ward("Kapsabet", KAPSABET, ZoomLevel::WARD);
        let draft = [LatLng::new(0.19, 35.09), LatLng::new(0.21, 35.11)];
        let overlay = SelectionOverlay { context: &context, draft: &draft };
        let layers = r.render(60, 20, &vp, &overlay, &MockEnvironmentalDataProvider::default());

        assert!(!layers.focus.is_blank());
        assert!(!layers.draft.is_blank());
    }

    #[test]
    fn test_overlay_shades_cells_inside_wards() {
        let mut r = renderer();
        r.cycle_overlay();
        let vp = Viewport::at_level(KAPSABET, ZoomLevel::WARD, 120, 80);
        let context = LocationContext::county();
        let overlay = SelectionOverlay { context: &context, draft: &[] };
        let layers = r.render(60, 20, &vp, &overlay, &MockEnvironmentalDataProvider::default());

        let shaded = layers.overlay.iter().filter(|c| !c.is_blank()).count();
        // One ward, one value, one band
        assert_eq!(shaded, 1);
    }
}
