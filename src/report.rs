//! Summaries built on top of a finished inspection: per-class counts,
//! severity grading, repair recommendations and basic image statistics.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::detection::Inspection;
use crate::detection::preprocessing::GrayRaster;
use crate::detection::roi::intensity_histogram;
use crate::models::{BoundingBox, DefectClass, Detection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    #[serde(rename = "No defects")]
    NoDefects,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Grade a detection list. Any crack is critical; otherwise the grade
    /// follows the defect count and mean confidence.
    pub fn assess(detections: &[Detection]) -> Self {
        if detections.is_empty() {
            return Severity::NoDefects;
        }

        let count = detections.len();
        let mean = average_confidence(detections);

        if detections.iter().any(|d| d.class == DefectClass::Crack) {
            Severity::Critical
        } else if count > 5 || mean > 0.9 {
            Severity::High
        } else if count > 2 || mean > 0.7 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// Float center of a detection box
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportedDetection {
    pub class: DefectClass,
    pub confidence: f32,
    pub bbox: BoundingBox,
    pub center: Point,
}

impl From<&Detection> for ReportedDetection {
    fn from(d: &Detection) -> Self {
        Self {
            class: d.class,
            confidence: d.confidence,
            bbox: d.bbox,
            center: Point {
                x: d.bbox.x as f32 + d.bbox.width as f32 / 2.0,
                y: d.bbox.y as f32 + d.bbox.height as f32 / 2.0,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageFeatures {
    pub mean_intensity: f32,
    pub std_intensity: f32,
    pub histogram: Vec<u64>,
}

impl ImageFeatures {
    pub fn extract(gray: &GrayRaster) -> Self {
        let n = (gray.width() as f64 * gray.height() as f64).max(1.0);
        let mean = gray.pixels().map(|p| p[0] as f64).sum::<f64>() / n;
        let variance = gray
            .pixels()
            .map(|p| (p[0] as f64 - mean).powi(2))
            .sum::<f64>()
            / n;

        Self {
            mean_intensity: mean as f32,
            std_intensity: variance.sqrt() as f32,
            histogram: intensity_histogram(gray).to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total_defects: usize,
    pub defect_types: BTreeMap<DefectClass, usize>,
    pub average_confidence: f32,
    pub severity: Severity,
    /// Wall-clock processing time in seconds
    pub processing_time: f64,
}

/// Everything reported back for one analyzed image
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub image_info: ImageInfo,
    pub detections: Vec<ReportedDetection>,
    pub summary: Summary,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_features: Option<ImageFeatures>,
}

impl AnalysisReport {
    pub fn build(inspection: &Inspection, elapsed: Duration) -> Self {
        let detections = &inspection.detections;

        let mut defect_types = BTreeMap::new();
        for d in detections {
            *defect_types.entry(d.class).or_insert(0) += 1;
        }

        Self {
            image_info: ImageInfo {
                width: inspection.width,
                height: inspection.height,
            },
            detections: detections.iter().map(ReportedDetection::from).collect(),
            summary: Summary {
                total_defects: detections.len(),
                defect_types,
                average_confidence: average_confidence(detections),
                severity: Severity::assess(detections),
                processing_time: elapsed.as_secs_f64(),
            },
            recommendations: recommendations(detections),
            image_features: None,
        }
    }

    pub fn with_features(mut self, gray: &GrayRaster) -> Self {
        self.image_features = Some(ImageFeatures::extract(gray));
        self
    }
}

pub fn average_confidence(detections: &[Detection]) -> f32 {
    if detections.is_empty() {
        return 0.0;
    }
    detections.iter().map(|d| d.confidence).sum::<f32>() / detections.len() as f32
}

/// Repair advice for each defect class present, cracks first.
pub fn recommendations(detections: &[Detection]) -> Vec<String> {
    if detections.is_empty() {
        return vec!["No defects detected. Weld quality appears satisfactory.".to_string()];
    }

    let has = |class: DefectClass| detections.iter().any(|d| d.class == class);
    let mut advice = Vec::new();

    if has(DefectClass::Crack) {
        advice.push("Critical: Cracks detected. Immediate repair required.");
        advice.push("Review welding parameters and technique.");
    }
    if has(DefectClass::Porosity) {
        advice.push("Porosity detected. Check gas shielding and cleanliness.");
        advice.push("Consider adjusting welding speed and heat input.");
    }
    if has(DefectClass::Slag) {
        advice.push("Slag inclusions found. Improve inter-pass cleaning.");
        advice.push("Review welding technique and electrode condition.");
    }

    advice.into_iter().map(String::from).collect()
}
