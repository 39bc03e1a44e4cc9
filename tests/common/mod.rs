mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from weldscan for tests
pub use weldscan::detection::{postprocess, preprocessing};
pub use weldscan::{
    BoundingBox, ContentBounds, DefectClass, DefectDetector, Detection, InspectError,
    InspectorConfig, PipelineContext, WeldInspector,
};
