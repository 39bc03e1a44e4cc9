use log::debug;

use super::{contours, raster};
use super::preprocessing::GrayRaster;
use crate::config::SlagConfig;
use crate::error::Result;
use crate::models::{Contour, DefectClass, Detection};
use crate::pipeline::{DefectDetector, PipelineContext};

const MAX_CONFIDENCE: f32 = 0.95;

/// Finds bright, irregular inclusions.
pub struct SlagDetector {
    pub config: SlagConfig,
    pub confidence_threshold: f32,
}

impl SlagDetector {
    pub fn new(config: SlagConfig, confidence_threshold: f32) -> Self {
        Self {
            config,
            confidence_threshold,
        }
    }

    pub fn is_slag_like(&self, region: &Contour) -> bool {
        region.area() > self.config.min_area && region.irregularity() > self.config.min_irregularity
    }

    pub fn confidence(region: &Contour) -> f32 {
        let score = 0.5 + region.irregularity() * 0.3 + (region.area() as f32 / 1000.0) * 0.2;
        score.min(MAX_CONFIDENCE)
    }
}

impl DefectDetector for SlagDetector {
    fn detect(&self, roi: &GrayRaster, context: &PipelineContext) -> Result<Vec<Detection>> {
        if context.debug.is_some() {
            let bright = raster::threshold_bright(roi, self.config.bright_threshold);
            context.save_mask("slag_bright", &bright)?;
        }

        let regions = contours::find_bright_regions(
            roi,
            self.config.bright_threshold,
            self.config.min_region_size,
        );
        debug!("{}: {} bright regions", self.name(), regions.len());

        let detections: Vec<Detection> = regions
            .iter()
            .filter(|r| self.is_slag_like(r))
            .map(|r| Detection::new(DefectClass::Slag, Self::confidence(r), r.bounding_box()))
            .filter(|d| d.confidence > self.confidence_threshold)
            .collect();

        debug!("{}: {} detections", self.name(), detections.len());
        Ok(detections)
    }

    fn name(&self) -> &str {
        "Slag Detection"
    }
}
