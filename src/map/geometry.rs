use crate::braille::BrailleCanvas;
use crate::geo::LatLng;
use crate::map::projection::Viewport;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);

    loop {
        canvas.set_pixel_signed(x, y);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Thicker line for the selected ward outline
pub fn draw_thick_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    draw_line(canvas, x0, y0, x1, y1);
    draw_line(canvas, x0 + 1, y0, x1 + 1, y1);
    draw_line(canvas, x0, y0 + 1, x1, y1 + 1);
}

/// Project and draw a vertex path, closing it back to the start when `closed`.
/// Segments entirely off screen are skipped.
pub fn draw_path(
    canvas: &mut BrailleCanvas,
    viewport: &Viewport,
    points: &[LatLng],
    closed: bool,
    thick: bool,
) {
    if points.len() < 2 {
        return;
    }
    let projected: Vec<(i32, i32)> = points.iter().map(|p| viewport.project(*p)).collect();
    let closing = if closed { projected.first().copied() } else { None };

    let mut prev: Option<(i32, i32)> = None;
    for &(px, py) in projected.iter().chain(closing.iter()) {
        if let Some((x0, y0)) = prev {
            if viewport.line_might_be_visible((x0, y0), (px, py)) {
                if thick {
                    draw_thick_line(canvas, x0, y0, px, py);
                } else {
                    draw_line(canvas, x0, y0, px, py);
                }
            }
        }
        prev = Some((px, py));
    }
}

/// Draw a point marker (small cross)
pub fn draw_marker(canvas: &mut BrailleCanvas, x: i32, y: i32, size: i32) {
    for i in -size..=size {
        canvas.set_pixel_signed(x + i, y);
        canvas.set_pixel_signed(x, y + i);
    }
}

/// Filled disc, for vertex handles
pub fn draw_circle(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                canvas.set_pixel_signed(cx + dx, cy + dy);
            }
        }
    }
}

/// Circle outline (midpoint algorithm), for the point buffer
pub fn draw_circle_outline(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    if radius <= 0 {
        canvas.set_pixel_signed(cx, cy);
        return;
    }
    let (mut x, mut y) = (radius, 0);
    let mut err = 1 - radius;
    while x >= y {
        for (ox, oy) in [
            (x, y),
            (y, x),
            (-y, x),
            (-x, y),
            (-x, -y),
            (-y, -x),
            (y, -x),
            (x, -y),
        ] {
            canvas.set_pixel_signed(cx + ox, cy + oy);
        }
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ZoomLevel;

    #[test]
    fn test_line_direction_does_not_matter() {
        let mut forward = BrailleCanvas::new(5, 1);
        draw_line(&mut forward, 0, 0, 9, 0);
        let mut backward = BrailleCanvas::new(5, 1);
        draw_line(&mut backward, 9, 0, 0, 0);
        assert_eq!(forward.to_string(), "\u{2809}".repeat(5));
        assert_eq!(forward.to_string(), backward.to_string());
    }

    #[test]
    fn test_thick_line_covers_neighbour_column() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_thick_line(&mut canvas, 0, 7, 0, 0);
        assert_eq!(canvas.to_string(), "\u{28ff}\n\u{28ff}");
    }

    #[test]
    fn test_circle_outline_is_hollow() {
        let mut canvas = BrailleCanvas::new(10, 5);
        draw_circle_outline(&mut canvas, 10, 10, 8);
        assert!(!canvas.is_blank());
        // Center cell stays empty
        assert_eq!(canvas.glyph(5, 2), None);
    }

    #[test]
    fn test_closed_path_returns_to_start() {
        let vp = Viewport::at_level(LatLng::new(0.0, 0.0), ZoomLevel::POINT, 40, 40);
        let (a, b) = (vp.unproject(5, 5), vp.unproject(30, 5));
        let c = vp.unproject(30, 30);

        let mut open = BrailleCanvas::new(20, 10);
        draw_path(&mut open, &vp, &[a, b, c], false, false);
        let mut closed = BrailleCanvas::new(20, 10);
        draw_path(&mut closed, &vp, &[a, b, c], true, false);
        assert_ne!(open.to_string(), closed.to_string());
    }
}
