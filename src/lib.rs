pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;

pub use config::{CrackConfig, InspectorConfig, PorosityConfig, RoiConfig, SlagConfig};
pub use detection::{Inspection, WeldInspector};
pub use error::InspectError;
pub use models::{BoundingBox, ContentBounds, Contour, DefectClass, Detection};
pub use pipeline::{DebugConfig, DefectDetector, PipelineContext};
pub use report::{AnalysisReport, Severity};
