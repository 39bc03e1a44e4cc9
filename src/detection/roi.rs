use image::{GrayImage, Luma};
use log::debug;

use super::preprocessing::GrayRaster;
use super::raster::{self, Kernel};
use crate::config::RoiConfig;
use crate::models::ContentBounds;

/// 256-bin intensity histogram; bin `i` holds values in `[i, i + 1)`.
pub fn intensity_histogram(gray: &GrayRaster) -> [u64; 256] {
    let mut hist = [0u64; 256];
    for p in gray.pixels() {
        let v = p[0];
        if (0.0..256.0).contains(&v) {
            hist[v as usize] += 1;
        } else if v == 256.0 {
            hist[255] += 1;
        }
    }
    hist
}

/// Threshold separating dark background from content: the first bin at
/// which the cumulative count passes `content_fraction` of all pixels.
pub fn background_threshold(gray: &GrayRaster, config: &RoiConfig) -> u8 {
    let hist = intensity_histogram(gray);
    let total = gray.width() as f64 * gray.height() as f64;
    let limit = total * config.content_fraction as f64;

    let mut cumulative = 0u64;
    for (bin, count) in hist.iter().enumerate() {
        cumulative += count;
        if cumulative as f64 > limit {
            return bin as u8;
        }
    }
    config.fallback_threshold
}

/// Mask of pixels brighter than the background threshold, cleaned with one
/// closing pass.
pub fn detect_radiographic_content(gray: &GrayRaster, config: &RoiConfig) -> GrayImage {
    let threshold = background_threshold(gray, config) as f32;
    debug!("Content threshold: {}", threshold);

    let mask = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([(gray.get_pixel(x, y)[0] > threshold) as u8])
    });

    let kernel = Kernel::ones(config.closing_size, config.closing_size);
    raster::morphological_closing(&mask, &kernel)
}

/// Padded extent of the set pixels in `mask`, or `None` for an empty mask.
pub fn content_bounds(mask: &GrayImage, padding: u32) -> Option<ContentBounds> {
    let (width, height) = mask.dimensions();
    let mut min_x = width;
    let mut min_y = height;
    let mut max_x = 0;
    let mut max_y = 0;
    let mut has_content = false;

    for (x, y, pixel) in mask.enumerate_pixels() {
        if pixel[0] != 0 {
            has_content = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    if !has_content {
        return None;
    }

    Some(ContentBounds {
        x_min: min_x.saturating_sub(padding),
        y_min: min_y.saturating_sub(padding),
        x_max: (max_x + padding).min(width),
        y_max: (max_y + padding).min(height),
    })
}
