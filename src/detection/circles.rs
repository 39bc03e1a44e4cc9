use image::GrayImage;
use rayon::prelude::*;

use crate::config::PorosityConfig;

/// Angular step (degrees) of the samples deciding whether a circle exists.
const ACCEPT_STEP_DEGREES: usize = 15;
/// Angular step (degrees) of the samples scoring circularity.
const SCORE_STEP_DEGREES: usize = 10;

/// Circle hypothesis in raster coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Circle {
    pub cx: u32,
    pub cy: u32,
    pub radius: u32,
}

/// Fraction of in-bounds circumference samples landing on set pixels.
///
/// Sample coordinates are truncated toward zero. `None` when no sample falls
/// inside the mask.
fn boundary_coverage(mask: &GrayImage, circle: &Circle, step_degrees: usize) -> Option<f32> {
    let (w, h) = (mask.width() as i64, mask.height() as i64);
    let mut on_circle = 0u32;
    let mut total = 0u32;

    for angle in (0..360).step_by(step_degrees) {
        let theta = (angle as f64).to_radians();
        let x = (circle.cx as f64 + circle.radius as f64 * theta.cos()) as i64;
        let y = (circle.cy as f64 + circle.radius as f64 * theta.sin()) as i64;

        if x >= 0 && x < w && y >= 0 && y < h {
            total += 1;
            if mask.get_pixel(x as u32, y as u32)[0] > 0 {
                on_circle += 1;
            }
        }
    }

    (total > 0).then(|| on_circle as f32 / total as f32)
}

/// Whether more than `acceptance_ratio` of 24 boundary samples are set.
pub fn is_circle_at(mask: &GrayImage, circle: &Circle, acceptance_ratio: f32) -> bool {
    boundary_coverage(mask, circle, ACCEPT_STEP_DEGREES)
        .is_some_and(|coverage| coverage > acceptance_ratio)
}

/// Fraction of 36 boundary samples that are set, 0 if none are in bounds.
pub fn circularity(mask: &GrayImage, circle: &Circle) -> f32 {
    boundary_coverage(mask, circle, SCORE_STEP_DEGREES).unwrap_or(0.0)
}

/// Grid search for circles whose boundary lies on set pixels.
///
/// Centers step over `[max_radius, size - max_radius)` on both axes and radii
/// over `[min_radius, max_radius)`. Rows of centers are searched in parallel;
/// the result keeps scan order (row, column, radius).
pub fn detect_circular_features(mask: &GrayImage, config: &PorosityConfig) -> Vec<Circle> {
    let (width, height) = mask.dimensions();
    let max_r = config.max_radius;

    let rows: Vec<u32> = (max_r..height.saturating_sub(max_r))
        .step_by(config.center_step as usize)
        .collect();

    rows.par_iter()
        .flat_map_iter(|&cy| {
            (max_r..width.saturating_sub(max_r))
                .step_by(config.center_step as usize)
                .flat_map(move |cx| {
                    (config.min_radius..max_r)
                        .step_by(config.radius_step as usize)
                        .map(move |radius| Circle { cx, cy, radius })
                })
                .filter(|circle| is_circle_at(mask, circle, config.acceptance_ratio))
                .collect::<Vec<_>>()
        })
        .collect()
}
