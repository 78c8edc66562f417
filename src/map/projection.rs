use std::f64::consts::PI;

use glam::DVec2;

use crate::context::ZoomLevel;
use crate::geo::{BoundingBox, LatLng, EARTH_RADIUS_M};

const MAX_MERCATOR_LAT: f64 = 85.0;

/// Scale factor for a tile-map zoom level (level 2 shows the whole world)
pub fn zoom_for_level(level: ZoomLevel) -> f64 {
    f64::from(1u32 << level.get()) / 4.0
}

fn min_zoom() -> f64 {
    f64::from(1u32 << ZoomLevel::MIN) / 4.0
}

fn max_zoom() -> f64 {
    f64::from(1u32 << ZoomLevel::MAX) / 4.0
}

/// Web Mercator, normalized so the world spans [0, 1] on both axes
#[inline]
fn mercator(p: LatLng) -> DVec2 {
    let lat_rad = p.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    DVec2::new(
        (p.lng + 180.0) / 360.0,
        (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0,
    )
}

#[inline]
fn inverse_mercator(m: DVec2) -> LatLng {
    let lat_rad = (PI * (1.0 - 2.0 * m.y)).sinh().atan();
    LatLng::new(lat_rad.to_degrees(), m.x * 360.0 - 180.0)
}

/// Viewport representing the visible map area and zoom
#[derive(Clone, Debug)]
pub struct Viewport {
    pub center: LatLng,
    /// Scale factor, `2^level / 4`
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center: LatLng, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center,
            zoom: zoom.clamp(min_zoom(), max_zoom()),
            width,
            height,
        }
    }

    pub fn at_level(center: LatLng, level: ZoomLevel, width: usize, height: usize) -> Self {
        Self::new(center, zoom_for_level(level), width, height)
    }

    /// Jump to a center and zoom level
    pub fn set_view(&mut self, center: LatLng, level: ZoomLevel) {
        self.center = center;
        self.zoom = zoom_for_level(level);
    }

    /// Nearest whole zoom level
    pub fn level(&self) -> u8 {
        let level = (self.zoom * 4.0).log2().round();
        level.clamp(f64::from(ZoomLevel::MIN), f64::from(ZoomLevel::MAX)) as u8
    }

    /// Center on the box and zoom so it fills most of the canvas
    pub fn fit_bounds(&mut self, bbox: &BoundingBox) {
        let nw = mercator(LatLng::new(bbox.north, bbox.west));
        let se = mercator(LatLng::new(bbox.south, bbox.east));
        let span = (se - nw).abs().max(DVec2::splat(1e-9));
        let mid = (nw + se) / 2.0;

        let aspect = self.height.max(1) as f64 / self.width.max(1) as f64;
        let zoom = (1.0 / span.x).min(aspect / span.y) * 0.9;

        self.center = inverse_mercator(mid);
        self.zoom = zoom.clamp(min_zoom(), max_zoom());
    }

    #[inline]
    fn scale(&self) -> f64 {
        self.zoom * self.width as f64
    }

    #[inline]
    fn half_size(&self) -> DVec2 {
        DVec2::new(self.width as f64, self.height as f64) / 2.0
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let m = mercator(self.center) + DVec2::new(dx as f64, dy as f64) / self.scale();
        let mut center = inverse_mercator(DVec2::new(m.x, m.y.clamp(0.0, 1.0)));
        if center.lng > 180.0 {
            center.lng -= 360.0;
        } else if center.lng < -180.0 {
            center.lng += 360.0;
        }
        center.lat = center.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
        self.center = center;
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(max_zoom());
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(min_zoom());
    }

    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.5);
    }

    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / 1.5);
    }

    /// Zoom keeping the geographic point under the pixel fixed
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let anchor = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(min_zoom(), max_zoom());
        let (new_px, new_py) = self.project(anchor);
        self.pan(new_px - px, new_py - py);
    }

    /// Pixel coordinates back to a geographic position
    pub fn unproject(&self, px: i32, py: i32) -> LatLng {
        let offset = DVec2::new(px as f64, py as f64) - self.half_size();
        inverse_mercator(mercator(self.center) + offset / self.scale())
    }

    /// Geographic position to pixel coordinates
    #[inline]
    pub fn project(&self, p: LatLng) -> (i32, i32) {
        let px = (mercator(p) - mercator(self.center)) * self.scale() + self.half_size();
        (px.x as i32, px.y as i32)
    }

    /// Ground distance in meters as a pixel length at latitude `lat`
    pub fn meters_to_pixels(&self, meters: f64, lat: f64) -> f64 {
        let world_m = 2.0 * PI * EARTH_RADIUS_M * lat.to_radians().cos();
        meters / world_m * self.scale()
    }

    /// Geographic box currently on screen
    pub fn visible_bounds(&self) -> BoundingBox {
        let nw = self.unproject(0, 0);
        let se = self.unproject(self.width as i32, self.height as i32);
        BoundingBox {
            north: nw.lat,
            south: se.lat,
            east: se.lng,
            west: nw.lng,
        }
    }

    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10 && px < self.width as i32 + 10 && py >= -10 && py < self.height as i32 + 10
    }

    /// Rough bounding box check for a segment
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}
