use image::{GrayImage, Luma};
use log::debug;
use std::path::{Path, PathBuf};

use crate::detection::preprocessing::GrayRaster;
use crate::error::{InspectError, Result};
use crate::models::Detection;

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
    /// Whether debug mode is enabled
    pub enabled: bool,
}

impl DebugConfig {
    /// Prepare `output_dir` for debug rasters.
    /// The directory must be empty or non-existent.
    pub fn new(output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(InspectError::DebugDirNotEmpty(output_dir));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        Ok(Self {
            output_dir,
            enabled: true,
        })
    }
}

/// Context available to every detector
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
}

impl PipelineContext {
    pub fn with_debug(debug: DebugConfig) -> Self {
        Self { debug: Some(debug) }
    }

    fn debug_dir(&self) -> Option<&Path> {
        self.debug
            .as_ref()
            .filter(|d| d.enabled)
            .map(|d| d.output_dir.as_path())
    }

    /// Save a `{0, 1}` mask as a black/white PNG named after `stage`.
    pub fn save_mask(&self, stage: &str, mask: &GrayImage) -> Result<()> {
        let Some(dir) = self.debug_dir() else {
            return Ok(());
        };

        let visible = GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
            Luma([if mask.get_pixel(x, y)[0] != 0 { 255 } else { 0 }])
        });
        let path = dir.join(format!("{}.png", stage));
        visible.save(&path)?;
        debug!("Debug: saved {}", path.display());
        Ok(())
    }

    /// Save an intensity raster, rescaled so its maximum maps to 255.
    pub fn save_raster(&self, stage: &str, raster: &GrayRaster) -> Result<()> {
        let Some(dir) = self.debug_dir() else {
            return Ok(());
        };

        let max = raster.pixels().fold(0.0f32, |m, p| m.max(p[0]));
        let scale = if max > 0.0 { 255.0 / max } else { 0.0 };
        let visible = GrayImage::from_fn(raster.width(), raster.height(), |x, y| {
            Luma([(raster.get_pixel(x, y)[0].max(0.0) * scale).round().min(255.0) as u8])
        });
        let path = dir.join(format!("{}.png", stage));
        visible.save(&path)?;
        debug!("Debug: saved {}", path.display());
        Ok(())
    }
}

/// Trait that all defect detectors must implement
pub trait DefectDetector: Send + Sync {
    /// Analyze the region of interest and return detections in its local
    /// coordinates
    fn detect(&self, roi: &GrayRaster, context: &PipelineContext) -> Result<Vec<Detection>>;

    /// Human-readable name for this detector (used in log output)
    fn name(&self) -> &str;
}
