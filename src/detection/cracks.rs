use log::debug;

use super::contours;
use super::preprocessing::GrayRaster;
use super::raster::{self, Kernel};
use crate::config::CrackConfig;
use crate::error::Result;
use crate::models::{Contour, DefectClass, Detection};
use crate::pipeline::{DefectDetector, PipelineContext};

const MAX_CONFIDENCE: f32 = 0.95;

/// Finds long, thin edge structures.
///
/// Edges come from a Sobel pass over the blurred ROI; a vertical closing then
/// bridges short gaps along linear features before contours are traced.
pub struct CrackDetector {
    pub config: CrackConfig,
    pub confidence_threshold: f32,
}

impl CrackDetector {
    pub fn new(config: CrackConfig, confidence_threshold: f32) -> Self {
        Self {
            config,
            confidence_threshold,
        }
    }

    pub fn is_crack_like(&self, contour: &Contour) -> bool {
        contour.area() > self.config.min_area && contour.aspect_ratio() > self.config.min_aspect_ratio
    }

    pub fn confidence(contour: &Contour) -> f32 {
        let score = 0.6 + contour.aspect_ratio() / 10.0 + contour.area() as f32 / 1000.0;
        score.min(MAX_CONFIDENCE)
    }
}

impl DefectDetector for CrackDetector {
    fn detect(&self, roi: &GrayRaster, context: &PipelineContext) -> Result<Vec<Detection>> {
        let blurred = raster::gaussian_blur(roi, self.config.blur_size);
        let edges = raster::sobel_edges(&blurred);
        context.save_raster("crack_edges", &edges)?;

        let kernel = Kernel::ones(1, self.config.closing_length);
        let closed = raster::morphological_closing(&raster::nonzero_mask(&edges), &kernel);
        context.save_mask("crack_closed", &closed)?;

        let found = contours::find_contours(&closed, self.config.min_contour_points);
        debug!("{}: {} contours", self.name(), found.len());

        let detections: Vec<Detection> = found
            .iter()
            .filter(|c| self.is_crack_like(c))
            .map(|c| Detection::new(DefectClass::Crack, Self::confidence(c), c.bounding_box()))
            .filter(|d| d.confidence > self.confidence_threshold)
            .collect();

        debug!("{}: {} detections", self.name(), detections.len());
        Ok(detections)
    }

    fn name(&self) -> &str {
        "Crack Detection"
    }
}
