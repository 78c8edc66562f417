/// Braille Unicode canvas for dot-resolution terminal graphics.
/// Each character cell holds a 2x4 dot grid; patterns live in U+2800..U+28FF.
#[derive(Clone, Debug)]
pub struct BrailleCanvas {
    width: usize,  // Characters
    height: usize, // Characters
    cells: Vec<u8>,
}

/// Dot bit for (x % 2, y % 4) inside a cell:
/// ```text
/// 0x01 0x08
/// 0x02 0x10
/// 0x04 0x20
/// 0x40 0x80
/// ```
const DOT_BITS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

impl BrailleCanvas {
    /// Canvas of `width` x `height` characters (dot resolution `2w x 4h`)
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn set_pixel(&mut self, x: usize, y: usize) {
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.width || cy >= self.height {
            return;
        }
        self.cells[cy * self.width + cx] |= DOT_BITS[x % 2][y % 4];
    }

    /// Signed variant; negative coordinates are dropped
    #[inline]
    pub fn set_pixel_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize);
        }
    }

    /// OR a whole dot pattern into one character cell
    pub fn stamp_cell(&mut self, cx: usize, cy: usize, pattern: u8) {
        if cx < self.width && cy < self.height {
            self.cells[cy * self.width + cx] |= pattern;
        }
    }

    /// Braille glyph at a character cell, `None` when no dot is set
    pub fn glyph(&self, cx: usize, cy: usize) -> Option<char> {
        let bits = *self.cells.get(cy * self.width + cx).filter(|_| cx < self.width)?;
        if bits == 0 {
            return None;
        }
        char::from_u32(0x2800 + u32::from(bits))
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|&b| b == 0)
    }

    #[cfg(test)]
    pub fn to_string(&self) -> String {
        self.cells
            .chunks(self.width.max(1))
            .map(|row| {
                row.iter()
                    .map(|&b| char::from_u32(0x2800 + u32::from(b)).unwrap_or(' '))
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_layout_within_cell() {
        // Left column top to bottom, then right column
        let mut left = BrailleCanvas::new(1, 1);
        (0..4).for_each(|y| left.set_pixel(0, y));
        assert_eq!(left.glyph(0, 0), Some('\u{2847}'));

        let mut right = BrailleCanvas::new(1, 1);
        (0..4).for_each(|y| right.set_pixel(1, y));
        assert_eq!(right.glyph(0, 0), Some('\u{28b8}'));
    }

    #[test]
    fn test_pixels_land_in_their_cell() {
        let mut canvas = BrailleCanvas::new(3, 2);
        canvas.set_pixel(5, 7);
        assert_eq!(canvas.to_string(), "\u{2800}\u{2800}\u{2800}\n\u{2800}\u{2800}\u{2880}");
        assert_eq!(canvas.glyph(2, 1), Some('\u{2880}'));
        assert_eq!(canvas.glyph(0, 0), None);
    }

    #[test]
    fn test_stamp_merges_with_existing_dots() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_pixel(0, 0);
        canvas.stamp_cell(0, 0, 0x20);
        assert_eq!(canvas.glyph(0, 0), Some('\u{2821}'));
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let mut canvas = BrailleCanvas::new(2, 2);
        canvas.set_pixel(4, 0);
        canvas.set_pixel_signed(-1, 3);
        canvas.stamp_cell(5, 5, 0xff);
        assert!(canvas.is_blank());
        assert_eq!(canvas.glyph(0, 0), None);
        assert_eq!(canvas.glyph(9, 0), None);
    }

    #[test]
    fn test_stamp_and_glyph() {
        let mut canvas = BrailleCanvas::new(2, 2);
        canvas.stamp_cell(1, 1, 0x41);
        assert_eq!(canvas.glyph(1, 1), Some('\u{2841}'));
    }
}
