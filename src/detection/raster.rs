//! Low-level raster operations shared by the defect detectors.
//!
//! Intensity rasters are `f32` ([`GrayRaster`]); binary masks are
//! [`GrayImage`] holding `0` or `1`. Every function allocates its output and
//! leaves its inputs untouched.
//!
//! Convolution goes through `imageproc`. The median filter and morphology
//! are written out here: the median leaves a zero border band and
//! morphology pads with zeros, and neither matches `imageproc`'s border
//! handling.

use image::{GrayImage, ImageBuffer};
use imageproc::filter;
use rayon::prelude::*;

use super::preprocessing::GrayRaster;

/// Rectangular weight grid used for convolution and as a structuring element.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    width: u32,
    height: u32,
    weights: Vec<f32>,
}

impl Kernel {
    pub fn from_rows<const W: usize, const H: usize>(rows: [[f32; W]; H]) -> Self {
        Self {
            width: W as u32,
            height: H as u32,
            weights: rows.iter().flatten().copied().collect(),
        }
    }

    /// All-ones kernel, `width` columns by `height` rows.
    pub fn ones(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            weights: vec![1.0; (width * height) as usize],
        }
    }

    #[inline]
    pub fn weight(&self, kx: u32, ky: u32) -> f32 {
        self.weights[(ky * self.width + kx) as usize]
    }

    fn anchor(&self) -> (i64, i64) {
        ((self.width / 2) as i64, (self.height / 2) as i64)
    }
}

/// 2D correlation with replicated borders; output has the input's shape.
///
/// Sums are accumulated in `f64`, so integer-weighted kernels give exactly
/// zero over flat areas.
pub fn convolve(image: &GrayRaster, kernel: &Kernel) -> GrayRaster {
    let weights: Vec<f64> = kernel.weights.iter().map(|&w| w as f64).collect();
    filter::Kernel::new(&weights, kernel.width, kernel.height)
        .filter(image, |out: &mut f32, acc: f64| *out = acc as f32)
}

/// `size x size` Gaussian with sigma = size / 3.
///
/// Weights are left unnormalized (center weight is 1), so blurring scales
/// intensities up by the kernel sum.
pub fn gaussian_kernel(size: u32) -> Kernel {
    let center = (size / 2) as f32;
    let sigma = size as f32 / 3.0;
    let denom = 2.0 * sigma * sigma;

    let mut weights = Vec::with_capacity((size * size) as usize);
    for i in 0..size {
        for j in 0..size {
            let x = i as f32 - center;
            let y = j as f32 - center;
            weights.push((-(x * x + y * y) / denom).exp());
        }
    }

    Kernel {
        width: size,
        height: size,
        weights,
    }
}

pub fn gaussian_blur(image: &GrayRaster, size: u32) -> GrayRaster {
    convolve(image, &gaussian_kernel(size))
}

/// Gradient magnitude from the 3x3 Sobel pair.
pub fn sobel_edges(image: &GrayRaster) -> GrayRaster {
    let sobel_x = Kernel::from_rows([[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]]);
    let sobel_y = Kernel::from_rows([[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]]);

    let grad_x = convolve(image, &sobel_x);
    let grad_y = convolve(image, &sobel_y);

    let (width, height) = image.dimensions();
    let magnitude = grad_x
        .as_raw()
        .iter()
        .zip(grad_y.as_raw())
        .map(|(gx, gy)| (gx * gx + gy * gy).sqrt())
        .collect();
    ImageBuffer::from_raw(width, height, magnitude).unwrap_or_else(|| GrayRaster::new(width, height))
}

/// Median over a `(2 * (size / 2) + 1)`-wide square window.
///
/// Only pixels whose full window fits inside the image are filtered; the
/// border band of width `size / 2` is left at zero.
pub fn median_filter(image: &GrayRaster, size: u32) -> GrayRaster {
    let (width, height) = image.dimensions();
    let pad = size / 2;
    let side = (2 * pad + 1) as usize;
    let src = image.as_raw();

    let mut out = GrayRaster::new(width, height);
    if width <= 2 * pad || height <= 2 * pad {
        return out;
    }

    out.par_chunks_mut(width as usize)
        .enumerate()
        .filter(|(y, _)| *y >= pad as usize && *y < (height - pad) as usize)
        .for_each(|(y, row)| {
            let mut window = Vec::with_capacity(side * side);
            for x in pad as usize..(width - pad) as usize {
                window.clear();
                for sy in y - pad as usize..=y + pad as usize {
                    let start = sy * width as usize + x - pad as usize;
                    window.extend_from_slice(&src[start..start + side]);
                }
                window.sort_unstable_by(|a, b| a.total_cmp(b));
                row[x] = window[window.len() / 2];
            }
        });
    out
}

/// Flag pixels whose normalized intensity is below `threshold` (dark pixels).
pub fn threshold_binary(image: &GrayRaster, threshold: f32) -> GrayImage {
    map_mask(image, |v| v / 255.0 < threshold)
}

/// Flag pixels whose normalized intensity is above `threshold` (bright pixels).
pub fn threshold_bright(image: &GrayRaster, threshold: f32) -> GrayImage {
    map_mask(image, |v| v / 255.0 > threshold)
}

pub fn nonzero_mask(image: &GrayRaster) -> GrayImage {
    map_mask(image, |v| v != 0.0)
}

fn map_mask(image: &GrayRaster, predicate: impl Fn(f32) -> bool) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        image::Luma([predicate(image.get_pixel(x, y)[0]) as u8])
    })
}

/// Binary dilation with zero padding: set where any nonzero kernel cell
/// covers a nonzero mask pixel.
pub fn dilate(mask: &GrayImage, kernel: &Kernel) -> GrayImage {
    morph(mask, kernel, MorphOp::Dilate)
}

/// Binary erosion with zero padding: set where every mask pixel under the
/// kernel is at least the kernel weight.
pub fn erode(mask: &GrayImage, kernel: &Kernel) -> GrayImage {
    morph(mask, kernel, MorphOp::Erode)
}

pub fn morphological_closing(mask: &GrayImage, kernel: &Kernel) -> GrayImage {
    erode(&dilate(mask, kernel), kernel)
}

#[derive(Clone, Copy)]
enum MorphOp {
    Dilate,
    Erode,
}

fn morph(mask: &GrayImage, kernel: &Kernel, op: MorphOp) -> GrayImage {
    let (width, height) = mask.dimensions();
    let (w, h) = (width as i64, height as i64);
    let (pad_x, pad_y) = kernel.anchor();
    let src = mask.as_raw();

    let mut out = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }

    out.par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, cell) in row.iter_mut().enumerate() {
                let mut hit = matches!(op, MorphOp::Erode);
                'window: for ky in 0..kernel.height {
                    let sy = y as i64 + ky as i64 - pad_y;
                    for kx in 0..kernel.width {
                        let sx = x as i64 + kx as i64 - pad_x;
                        let value = if sx < 0 || sy < 0 || sx >= w || sy >= h {
                            0
                        } else {
                            src[sy as usize * width as usize + sx as usize]
                        };
                        let weight = kernel.weight(kx, ky);
                        match op {
                            MorphOp::Dilate if value != 0 && weight != 0.0 => {
                                hit = true;
                                break 'window;
                            }
                            MorphOp::Erode if (value as f32) < weight => {
                                hit = false;
                                break 'window;
                            }
                            _ => {}
                        }
                    }
                }
                *cell = hit as u8;
            }
        });
    out
}
