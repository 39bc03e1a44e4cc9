pub mod preprocessing;
pub mod raster;
pub mod contours;
pub mod roi;
pub mod circles;
pub mod cracks;
pub mod porosity;
pub mod slag;
pub mod postprocess;

use image::DynamicImage;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::InspectorConfig;
use crate::error::Result;
use crate::models::{ContentBounds, Detection};
use crate::pipeline::{DebugConfig, DefectDetector, PipelineContext};
use cracks::CrackDetector;
use porosity::PorosityDetector;
use preprocessing::GrayRaster;
use slag::SlagDetector;

/// Outcome of inspecting one image
#[derive(Debug, Clone)]
pub struct Inspection {
    /// Surviving detections in full-image coordinates, NMS order
    pub detections: Vec<Detection>,
    /// Radiographic content area, if one was found
    pub content_bounds: Option<ContentBounds>,
    pub width: u32,
    pub height: u32,
}

/// Main inspection pipeline orchestrator
pub struct WeldInspector {
    config: InspectorConfig,
    detectors: Vec<Arc<dyn DefectDetector>>,
    context: PipelineContext,
}

impl WeldInspector {
    /// Inspector with the default tuning and the crack, porosity and slag detectors.
    pub fn new() -> Self {
        Self::build(InspectorConfig::default())
    }

    pub fn from_config(config: InspectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: InspectorConfig) -> Self {
        Self {
            detectors: standard_detectors(&config),
            config,
            context: PipelineContext::default(),
        }
    }

    /// Save intermediate rasters into `output_dir` (must be empty or absent).
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        self.context = PipelineContext::with_debug(DebugConfig::new(output_dir)?);
        Ok(self)
    }

    /// Add an extra detector; it runs alongside the standard ones.
    pub fn add_detector(mut self, detector: Arc<dyn DefectDetector>) -> Self {
        self.detectors.push(detector);
        self
    }

    pub fn config(&self) -> &InspectorConfig {
        &self.config
    }

    /// Run the full pipeline on a decoded image
    pub fn detect(&self, img: &DynamicImage) -> Result<Vec<Detection>> {
        Ok(self.inspect(img)?.detections)
    }

    /// Run the full pipeline on a raw interleaved 1- or 3-channel buffer
    pub fn detect_raw(
        &self,
        width: u32,
        height: u32,
        channels: u8,
        data: &[u8],
    ) -> Result<Vec<Detection>> {
        let gray = preprocessing::from_raw(width, height, channels, data)?;
        Ok(self.inspect_gray(&gray)?.detections)
    }

    pub fn inspect(&self, img: &DynamicImage) -> Result<Inspection> {
        let gray = preprocessing::to_grayscale(img)?;
        self.inspect_gray(&gray)
    }

    /// Run ROI extraction, all detectors and post-processing on a luminance raster.
    pub fn inspect_gray(&self, gray: &GrayRaster) -> Result<Inspection> {
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Err(crate::error::InspectError::ZeroDimension { width, height });
        }
        self.context.save_raster("00_luminance", gray)?;

        // Step 1: Locate radiographic content
        let content_mask = roi::detect_radiographic_content(gray, &self.config.roi);
        self.context.save_mask("01_content_mask", &content_mask)?;
        // an unpadded one-pixel-wide mask yields an empty ROI
        let content_bounds = roi::content_bounds(&content_mask, self.config.roi.padding)
            .filter(|bounds| bounds.width() > 0 && bounds.height() > 0);

        let cropped;
        let roi_gray = match &content_bounds {
            Some(bounds) => {
                debug!(
                    "Content bounds: ({}, {}) - ({}, {})",
                    bounds.x_min, bounds.y_min, bounds.x_max, bounds.y_max
                );
                cropped = preprocessing::crop(gray, bounds.x_min, bounds.y_min, bounds.x_max, bounds.y_max);
                &cropped
            }
            None => {
                warn!("No radiographic content found, analyzing the full {}x{} image", width, height);
                gray
            }
        };

        // Step 2: Run the detectors; they share the ROI read-only
        let per_detector: Vec<Vec<Detection>> = self
            .detectors
            .par_iter()
            .map(|detector| detector.detect(roi_gray, &self.context))
            .collect::<Result<_>>()?;
        let mut detections: Vec<Detection> = per_detector.into_iter().flatten().collect();
        debug!("{} raw detections", detections.len());

        // Step 3: Back to image coordinates, suppress overlaps, constrain
        if let Some(bounds) = &content_bounds {
            postprocess::shift_to_image(&mut detections, bounds);
        }
        let detections = postprocess::apply_nms(detections, self.config.nms_threshold);
        let detections = postprocess::constrain(
            detections,
            content_bounds.as_ref(),
            width,
            height,
            self.config.min_detection_size,
        );

        info!("Inspection complete: {} detections", detections.len());

        Ok(Inspection {
            detections,
            content_bounds,
            width,
            height,
        })
    }
}

impl Default for WeldInspector {
    fn default() -> Self {
        Self::new()
    }
}

/// The crack, porosity and slag detectors configured from `config`
pub fn standard_detectors(config: &InspectorConfig) -> Vec<Arc<dyn DefectDetector>> {
    vec![
        Arc::new(CrackDetector::new(config.crack.clone(), config.confidence_threshold)),
        Arc::new(PorosityDetector::new(config.porosity.clone(), config.confidence_threshold)),
        Arc::new(SlagDetector::new(config.slag.clone(), config.confidence_threshold)),
    ]
}
