use std::collections::HashMap;

use crate::data::WardRecord;
use crate::geo::{BoundingBox, LatLng};

/// Grid cell size in degrees (~5.5 km, a handful of wards per cell)
pub const WARD_CELL_DEG: f64 = 0.05;

/// Coordinate-to-ward lookup.
///
/// Each ward's bounding box is indexed into every cell it overlaps, so a
/// cell query never misses a ward; false positives are removed by the ring
/// test.
#[derive(Debug, Default)]
pub struct WardIndex {
    cells: HashMap<(i32, i32), Vec<usize>>,
    bounds: Vec<Option<BoundingBox>>,
    cell_size: f64,
}

impl WardIndex {
    #[inline(always)]
    fn to_cell(&self, p: LatLng) -> (i32, i32) {
        let x = (p.lng / self.cell_size).floor() as i32;
        let y = (p.lat / self.cell_size).floor() as i32;
        (x, y)
    }

    /// Index wards by position in the slice
    pub fn build(wards: &[WardRecord], cell_size: f64) -> Self {
        let mut index = Self {
            cells: HashMap::new(),
            bounds: Vec::with_capacity(wards.len()),
            cell_size,
        };
        for (idx, ward) in wards.iter().enumerate() {
            let bbox = ward.bounds();
            index.bounds.push(bbox);
            let Some(bbox) = bbox else { continue };

            let min_cell = index.to_cell(LatLng::new(bbox.south, bbox.west));
            let max_cell = index.to_cell(LatLng::new(bbox.north, bbox.east));
            for y in min_cell.1..=max_cell.1 {
                for x in min_cell.0..=max_cell.0 {
                    index.cells.entry((x, y)).or_default().push(idx);
                }
            }
        }
        index
    }

    /// Index of the first ward (in load order) whose outline contains `p`
    pub fn lookup(&self, wards: &[WardRecord], p: LatLng) -> Option<usize> {
        let candidates = self.cells.get(&self.to_cell(p))?;
        candidates.iter().copied().find(|&idx| {
            let in_box = self
                .bounds
                .get(idx)
                .copied()
                .flatten()
                .is_some_and(|b| b.contains(p));
            in_box && wards.get(idx).is_some_and(|w| w.contains(p))
        })
    }

    /// Ward indices whose boxes touch `view`, ascending, no duplicates
    pub fn query_bbox(&self, view: &BoundingBox) -> Vec<usize> {
        let min_cell = self.to_cell(LatLng::new(view.south, view.west));
        let max_cell = self.to_cell(LatLng::new(view.north, view.east));
        let cell_count = (max_cell.0 - min_cell.0 + 1) as i64 * (max_cell.1 - min_cell.1 + 1) as i64;

        // Zoomed far out, walking the grid costs more than scanning every ward
        if cell_count > self.cells.len() as i64 {
            return (0..self.bounds.len())
                .filter(|&i| self.bounds[i].is_some_and(|b| overlaps(&b, view)))
                .collect();
        }

        let mut results = Vec::new();
        for y in min_cell.1..=max_cell.1 {
            for x in min_cell.0..=max_cell.0 {
                if let Some(indices) = self.cells.get(&(x, y)) {
                    results.extend_from_slice(indices);
                }
            }
        }
        results.sort_unstable();
        results.dedup();
        results
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }
}

fn overlaps(a: &BoundingBox, b: &BoundingBox) -> bool {
    a.west <= b.east && a.east >= b.west && a.south <= b.north && a.north >= b.south
}
