mod geometry;
mod projection;
mod renderer;
mod spatial;

pub use projection::{zoom_for_level, Viewport};
pub use renderer::{DisplaySettings, MapLayers, MapRenderer, SelectionOverlay, OVERLAY_BANDS};
pub use spatial::WardIndex;
