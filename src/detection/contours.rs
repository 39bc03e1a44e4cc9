use image::{GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};

use super::preprocessing::GrayRaster;
use super::raster;
use crate::models::Contour;

const NEIGHBORS_4: [(i64, i64); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const NEIGHBORS_8: [(i64, i64); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Per-pixel visitation flags, sized once per mask scan.
pub struct VisitMap {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl VisitMap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
        }
    }

    pub fn for_mask(mask: &GrayImage) -> Self {
        Self::new(mask.width(), mask.height())
    }

    #[inline]
    pub fn is_visited(&self, x: u32, y: u32) -> bool {
        self.cells[self.index(x, y)]
    }

    #[inline]
    fn mark(&mut self, x: u32, y: u32) {
        let i = self.index(x, y);
        self.cells[i] = true;
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Collect the 4-connected component containing `(x, y)`.
pub fn flood_fill4(mask: &GrayImage, visited: &mut VisitMap, x: u32, y: u32) -> Option<Contour> {
    grow(mask, visited, x, y, &NEIGHBORS_4)
}

/// Collect the 8-connected component containing `(x, y)`.
pub fn trace_contour8(
    mask: &GrayImage,
    visited: &mut VisitMap,
    x: u32,
    y: u32,
) -> Option<Contour> {
    grow(mask, visited, x, y, &NEIGHBORS_8)
}

/// Iterative region growing over set, unvisited pixels.
///
/// Pixels are marked when pushed so each one enters the stack at most once.
/// Returns `None` when the seed itself is unset or already visited.
fn grow(
    mask: &GrayImage,
    visited: &mut VisitMap,
    x: u32,
    y: u32,
    neighbors: &[(i64, i64)],
) -> Option<Contour> {
    debug_assert_eq!((visited.width, visited.height), mask.dimensions());

    if mask.get_pixel(x, y)[0] == 0 || visited.is_visited(x, y) {
        return None;
    }

    let (w, h) = (mask.width() as i64, mask.height() as i64);
    visited.mark(x, y);
    let mut contour = Contour::from_point(x, y);
    let mut stack = vec![(x, y)];

    while let Some((cx, cy)) = stack.pop() {
        for &(dx, dy) in neighbors {
            let nx = cx as i64 + dx;
            let ny = cy as i64 + dy;
            if nx < 0 || ny < 0 || nx >= w || ny >= h {
                continue;
            }
            let (nx, ny) = (nx as u32, ny as u32);
            if mask.get_pixel(nx, ny)[0] != 0 && !visited.is_visited(nx, ny) {
                visited.mark(nx, ny);
                contour.push(nx, ny);
                stack.push((nx, ny));
            }
        }
    }

    Some(contour)
}

/// Find 8-connected components of a binary mask.
///
/// Components come back in row-major order of their first pixel, the order a
/// scan with [`trace_contour8`] visits them. Components with `min_points`
/// points or fewer are dropped.
pub fn find_contours(mask: &GrayImage, min_points: u32) -> Vec<Contour> {
    let labeled = connected_components(mask, Connectivity::Eight, Luma([0]));

    // labels are numbered from 1 in order of first appearance
    let mut contours: Vec<Contour> = Vec::new();
    for (x, y, label) in labeled.enumerate_pixels() {
        let label = label[0] as usize;
        if label == 0 {
            continue;
        }
        match contours.get_mut(label - 1) {
            Some(contour) => contour.push(x, y),
            None => contours.push(Contour::from_point(x, y)),
        }
    }

    contours.retain(|c| c.pixel_count > min_points);
    contours
}

/// Find 4-connected regions brighter than `threshold` (normalized 0-1).
///
/// Regions with `min_size` pixels or fewer are dropped.
pub fn find_bright_regions(gray: &GrayRaster, threshold: f32, min_size: u32) -> Vec<Contour> {
    let mask = raster::threshold_bright(gray, threshold);
    find_regions(&mask, min_size)
}

/// Row-major scan of a mask into 4-connected regions larger than `min_size`.
pub fn find_regions(mask: &GrayImage, min_size: u32) -> Vec<Contour> {
    let mut visited = VisitMap::for_mask(mask);
    let mut regions = Vec::new();

    for y in 0..mask.height() {
        for x in 0..mask.width() {
            if let Some(region) = flood_fill4(mask, &mut visited, x, y) {
                if region.pixel_count > min_size {
                    regions.push(region);
                }
            }
        }
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(rows: &[&str]) -> GrayImage {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        GrayImage::from_fn(width, height, |x, y| {
            Luma([(rows[y as usize].as_bytes()[x as usize] == b'#') as u8])
        })
    }

    #[test]
    fn diagonal_pixels_join_only_under_8_connectivity() {
        let mask = mask_from(&["#..", ".#.", "..#"]);

        let mut visited = VisitMap::for_mask(&mask);
        let region = flood_fill4(&mask, &mut visited, 0, 0).unwrap();
        assert_eq!(region.area(), 1);

        let mut visited = VisitMap::for_mask(&mask);
        let contour = trace_contour8(&mask, &mut visited, 0, 0).unwrap();
        assert_eq!(contour.area(), 3);
        assert_eq!(contour.bounding_box(), crate::models::BoundingBox::new(0, 0, 2, 2));
    }

    #[test]
    fn fill_marks_visited_and_skips_seen_seeds() {
        let mask = mask_from(&["##.", "##.", "..#"]);
        let mut visited = VisitMap::for_mask(&mask);
        let region = flood_fill4(&mask, &mut visited, 1, 1).unwrap();
        assert_eq!(region.area(), 4);
        assert!(visited.is_visited(0, 0));
        assert!(!visited.is_visited(2, 2));
        assert!(flood_fill4(&mask, &mut visited, 0, 1).is_none());
        assert!(flood_fill4(&mask, &mut visited, 2, 0).is_none());
    }

    #[test]
    fn large_region_does_not_recurse() {
        let mask = GrayImage::from_pixel(600, 600, Luma([1]));
        let regions = find_regions(&mask, 10);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area(), 360_000);
    }

    #[test]
    fn contours_below_min_points_are_dropped() {
        let mask = mask_from(&[
            "#####.......",
            "............",
            "..........##",
            "..........##",
            "..........##",
            "..........##",
            "..........##",
            "..........##",
        ]);
        let contours = find_contours(&mask, 10);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].area(), 12);
        assert_eq!(contours[0].min_x, 10);
    }

    #[test]
    fn labelled_contours_match_row_major_tracing() {
        let mask = mask_from(&[
            "..##....#.....",
            "...#...##.....",
            "#...#.........",
            "#....#....####",
            "#.........#..#",
            "##.#......####",
            ".#..#.........",
        ]);

        let mut visited = VisitMap::for_mask(&mask);
        let mut traced = Vec::new();
        for y in 0..mask.height() {
            for x in 0..mask.width() {
                if let Some(contour) = trace_contour8(&mask, &mut visited, x, y) {
                    traced.push(contour);
                }
            }
        }

        assert_eq!(find_contours(&mask, 0), traced);
        assert_eq!(find_contours(&mask, 0).len(), 5);
    }
}
