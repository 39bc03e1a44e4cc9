use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{InspectError, Result};

/// Tunables for the whole inspection pipeline.
///
/// Every field has a default matching the reference tuning; a partial JSON
/// document only overrides the keys it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    /// Minimum confidence (exclusive) a detector must reach to emit a result.
    pub confidence_threshold: f32,
    /// IoU above which the lower-confidence detection is suppressed.
    pub nms_threshold: f32,
    /// Smallest width/height a constrained detection may keep.
    pub min_detection_size: u32,
    pub roi: RoiConfig,
    pub crack: CrackConfig,
    pub porosity: PorosityConfig,
    pub slag: SlagConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiConfig {
    /// Fraction of pixels treated as background when picking the threshold.
    pub content_fraction: f32,
    /// Threshold used when the cumulative histogram never passes the fraction.
    pub fallback_threshold: u8,
    /// Side of the square closing kernel applied to the content mask.
    pub closing_size: u32,
    /// Margin added around the detected content.
    pub padding: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrackConfig {
    pub blur_size: u32,
    /// Height of the vertical closing kernel.
    pub closing_length: u32,
    /// Components with this many points or fewer are not traced further.
    pub min_contour_points: u32,
    pub min_area: u32,
    pub min_aspect_ratio: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PorosityConfig {
    pub median_size: u32,
    /// Normalized intensity below which a pixel counts as dark.
    pub dark_threshold: f32,
    pub min_radius: u32,
    pub max_radius: u32,
    pub center_step: u32,
    pub radius_step: u32,
    /// Fraction of boundary samples that must be dark to accept a circle.
    pub acceptance_ratio: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlagConfig {
    /// Normalized intensity above which a pixel counts as bright.
    pub bright_threshold: f32,
    pub min_region_size: u32,
    pub min_area: u32,
    pub min_irregularity: f32,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            nms_threshold: 0.4,
            min_detection_size: 10,
            roi: RoiConfig::default(),
            crack: CrackConfig::default(),
            porosity: PorosityConfig::default(),
            slag: SlagConfig::default(),
        }
    }
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            content_fraction: 0.8,
            fallback_threshold: 30,
            closing_size: 5,
            padding: 10,
        }
    }
}

impl Default for CrackConfig {
    fn default() -> Self {
        Self {
            blur_size: 3,
            closing_length: 7,
            min_contour_points: 10,
            min_area: 100,
            min_aspect_ratio: 3.0,
        }
    }
}

impl Default for PorosityConfig {
    fn default() -> Self {
        Self {
            median_size: 5,
            dark_threshold: 0.4,
            min_radius: 5,
            max_radius: 50,
            center_step: 10,
            radius_step: 5,
            acceptance_ratio: 0.6,
        }
    }
}

impl Default for SlagConfig {
    fn default() -> Self {
        Self {
            bright_threshold: 0.7,
            min_region_size: 10,
            min_area: 50,
            min_irregularity: 0.3,
        }
    }
}

impl InspectorConfig {
    /// Load a configuration from a JSON file, filling unspecified keys with defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            anyhow::anyhow!("Failed to parse config {}: {}", path.as_ref().display(), e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every tunable is in a range the pipeline can run with.
    pub fn validate(&self) -> Result<()> {
        unit_range("confidence_threshold", self.confidence_threshold)?;
        unit_range("nms_threshold", self.nms_threshold)?;
        unit_range("roi.content_fraction", self.roi.content_fraction)?;
        unit_range("porosity.dark_threshold", self.porosity.dark_threshold)?;
        unit_range("porosity.acceptance_ratio", self.porosity.acceptance_ratio)?;
        unit_range("slag.bright_threshold", self.slag.bright_threshold)?;

        non_zero("roi.closing_size", self.roi.closing_size)?;
        non_zero("crack.blur_size", self.crack.blur_size)?;
        non_zero("crack.closing_length", self.crack.closing_length)?;
        non_zero("porosity.median_size", self.porosity.median_size)?;
        non_zero("porosity.center_step", self.porosity.center_step)?;
        non_zero("porosity.radius_step", self.porosity.radius_step)?;

        if self.porosity.min_radius >= self.porosity.max_radius {
            return Err(InspectError::InvalidConfig(format!(
                "porosity.min_radius ({}) must be below porosity.max_radius ({})",
                self.porosity.min_radius, self.porosity.max_radius
            )));
        }

        Ok(())
    }
}

fn unit_range(name: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(InspectError::InvalidConfig(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}

fn non_zero(name: &str, value: u32) -> Result<()> {
    if value == 0 {
        Err(InspectError::InvalidConfig(format!("{} must be non-zero", name)))
    } else {
        Ok(())
    }
}
