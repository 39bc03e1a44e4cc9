use image::{DynamicImage, ImageBuffer, Luma};

use crate::error::{InspectError, Result};

/// Single-channel floating point raster, intensities nominally 0-255.
pub type GrayRaster = ImageBuffer<Luma<f32>, Vec<f32>>;

const LUMA_R: f32 = 0.2989;
const LUMA_G: f32 = 0.5870;
const LUMA_B: f32 = 0.1140;

/// Convert a decoded 1- or 3-channel image to a luminance raster.
///
/// Images carrying color are reduced with the weighted RGB sum; grayscale
/// images keep their intensities unchanged. Images with an alpha channel are
/// rejected; callers flatten them first.
pub fn to_grayscale(img: &DynamicImage) -> Result<GrayRaster> {
    if img.width() == 0 || img.height() == 0 {
        return Err(InspectError::ZeroDimension {
            width: img.width(),
            height: img.height(),
        });
    }
    let channels = img.color().channel_count();
    if channels != 1 && channels != 3 {
        return Err(InspectError::UnsupportedChannels(channels));
    }

    if img.color().has_color() {
        let rgb = img.to_rgb8();
        Ok(luminance_from_rgb(rgb.width(), rgb.height(), rgb.as_raw()))
    } else {
        let gray = img.to_luma8();
        Ok(ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
            Luma([gray.get_pixel(x, y)[0] as f32])
        }))
    }
}

/// Convert a raw interleaved buffer (1 or 3 channels, row-major) to luminance.
pub fn from_raw(width: u32, height: u32, channels: u8, data: &[u8]) -> Result<GrayRaster> {
    if data.is_empty() {
        return Err(InspectError::EmptyImage);
    }
    if width == 0 || height == 0 {
        return Err(InspectError::ZeroDimension { width, height });
    }
    if channels != 1 && channels != 3 {
        return Err(InspectError::UnsupportedChannels(channels));
    }

    let expected = width as usize * height as usize * channels as usize;
    if data.len() != expected {
        return Err(InspectError::BufferSizeMismatch {
            expected,
            actual: data.len(),
        });
    }

    if channels == 3 {
        Ok(luminance_from_rgb(width, height, data))
    } else {
        let values = data.iter().map(|&v| v as f32).collect();
        ImageBuffer::from_raw(width, height, values).ok_or(InspectError::BufferSizeMismatch {
            expected,
            actual: data.len(),
        })
    }
}

fn luminance_from_rgb(width: u32, height: u32, data: &[u8]) -> GrayRaster {
    ImageBuffer::from_fn(width, height, |x, y| {
        let i = (y as usize * width as usize + x as usize) * 3;
        Luma([data[i] as f32 * LUMA_R + data[i + 1] as f32 * LUMA_G + data[i + 2] as f32 * LUMA_B])
    })
}

/// Extract a sub-raster `[x0, x1) x [y0, y1)`.
pub fn crop(gray: &GrayRaster, x0: u32, y0: u32, x1: u32, y1: u32) -> GrayRaster {
    ImageBuffer::from_fn(x1 - x0, y1 - y0, |x, y| *gray.get_pixel(x0 + x, y0 + y))
}
