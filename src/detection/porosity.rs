use log::debug;

use super::circles::{self, Circle};
use super::preprocessing::GrayRaster;
use super::raster;
use crate::config::PorosityConfig;
use crate::error::Result;
use crate::models::{BoundingBox, DefectClass, Detection};
use crate::pipeline::{DefectDetector, PipelineContext};

const MAX_CONFIDENCE: f32 = 0.95;
/// Radius at which the size term of the confidence reaches its full weight.
const REFERENCE_RADIUS: f32 = 50.0;

/// Finds round dark voids (gas pores) with a brute-force circle search over
/// the thresholded, median-filtered ROI.
pub struct PorosityDetector {
    pub config: PorosityConfig,
    pub confidence_threshold: f32,
}

impl PorosityDetector {
    pub fn new(config: PorosityConfig, confidence_threshold: f32) -> Self {
        Self {
            config,
            confidence_threshold,
        }
    }

    /// Square box of side `2r` around the circle, clamped to the raster.
    pub fn circle_bbox(circle: &Circle, width: u32, height: u32) -> BoundingBox {
        let side = 2 * circle.radius;
        BoundingBox {
            x: circle.cx.saturating_sub(circle.radius),
            y: circle.cy.saturating_sub(circle.radius),
            width: side.min(width),
            height: side.min(height),
        }
    }

    pub fn confidence(circularity: f32, radius: u32) -> f32 {
        let score = 0.5 + circularity * 0.4 + (radius as f32 / REFERENCE_RADIUS) * 0.1;
        score.min(MAX_CONFIDENCE)
    }
}

impl DefectDetector for PorosityDetector {
    fn detect(&self, roi: &GrayRaster, context: &PipelineContext) -> Result<Vec<Detection>> {
        let filtered = raster::median_filter(roi, self.config.median_size);
        context.save_raster("porosity_median", &filtered)?;

        // pores appear darker than the surrounding weld metal
        let binary = raster::threshold_binary(&filtered, self.config.dark_threshold);
        context.save_mask("porosity_binary", &binary)?;

        let found = circles::detect_circular_features(&binary, &self.config);
        debug!("{}: {} circle candidates", self.name(), found.len());

        let (width, height) = roi.dimensions();
        let detections: Vec<Detection> = found
            .iter()
            .map(|circle| {
                let confidence =
                    Self::confidence(circles::circularity(&binary, circle), circle.radius);
                Detection::new(
                    DefectClass::Porosity,
                    confidence,
                    Self::circle_bbox(circle, width, height),
                )
            })
            .filter(|d| d.confidence > self.confidence_threshold)
            .collect();

        debug!("{}: {} detections", self.name(), detections.len());
        Ok(detections)
    }

    fn name(&self) -> &str {
        "Porosity Detection"
    }
}
