mod common;
use common::*;

use std::time::Duration;
use weldscan::detection::Inspection;
use weldscan::report::recommendations;
use weldscan::{AnalysisReport, Severity};

fn inspection(detections: Vec<Detection>) -> Inspection {
    Inspection {
        detections,
        content_bounds: None,
        width: 640,
        height: 480,
    }
}

#[test]
fn severity_grades() -> anyhow::Result<()> {
    assert_eq!(Severity::assess(&[]), Severity::NoDefects);

    let pore = det(DefectClass::Porosity, 0.6, 10, 10, 20, 20);
    assert_eq!(Severity::assess(&[pore.clone()]), Severity::Low);
    assert_eq!(Severity::assess(&vec![pore.clone(); 3]), Severity::Medium);
    assert_eq!(Severity::assess(&vec![pore.clone(); 6]), Severity::High);

    let confident = det(DefectClass::Slag, 0.92, 10, 10, 20, 20);
    assert_eq!(Severity::assess(&[confident]), Severity::High);

    let crack = det(DefectClass::Crack, 0.55, 0, 0, 10, 60);
    assert_eq!(Severity::assess(&[pore, crack]), Severity::Critical);
    Ok(())
}

#[test]
fn recommendations_follow_present_classes() -> anyhow::Result<()> {
    let none = recommendations(&[]);
    assert_eq!(none.len(), 1);
    assert!(none[0].starts_with("No defects"));

    let advice = recommendations(&[
        det(DefectClass::Slag, 0.7, 0, 0, 20, 20),
        det(DefectClass::Crack, 0.9, 50, 50, 10, 60),
    ]);
    assert_eq!(advice.len(), 4);
    assert!(advice[0].starts_with("Critical"));
    assert!(advice.iter().any(|a| a.contains("Slag")));
    assert!(!advice.iter().any(|a| a.contains("Porosity")));
    Ok(())
}

#[test]
fn report_summarizes_detections() -> anyhow::Result<()> {
    let detections = vec![
        det(DefectClass::Porosity, 0.8, 100, 100, 30, 30),
        det(DefectClass::Porosity, 0.6, 200, 100, 20, 20),
        det(DefectClass::Slag, 0.7, 300, 200, 40, 25),
    ];
    let report = AnalysisReport::build(&inspection(detections), Duration::from_millis(250));

    assert_eq!(report.image_info.width, 640);
    assert_eq!(report.summary.total_defects, 3);
    assert_eq!(report.summary.defect_types[&DefectClass::Porosity], 2);
    assert_eq!(report.summary.defect_types[&DefectClass::Slag], 1);
    assert!((report.summary.average_confidence - 0.7).abs() < 1e-6);
    assert_eq!(report.summary.severity, Severity::Medium);
    assert_eq!(report.summary.processing_time, 0.25);
    assert_eq!(report.detections[0].center.x, 115.0);
    assert!(report.image_features.is_none());
    Ok(())
}

#[test]
fn report_serializes_to_json() -> anyhow::Result<()> {
    let detections = vec![det(DefectClass::Crack, 0.9, 10, 20, 12, 80)];
    let report = AnalysisReport::build(&inspection(detections), Duration::ZERO);

    let value = serde_json::to_value(&report)?;
    assert_eq!(value["summary"]["severity"], "Critical");
    assert_eq!(value["summary"]["defect_types"]["crack"], 1);
    assert_eq!(value["detections"][0]["class"], "crack");
    assert_eq!(value["detections"][0]["bbox"]["height"], 80);
    assert!(value.get("image_features").is_none());

    let empty = AnalysisReport::build(&inspection(Vec::new()), Duration::ZERO);
    let value = serde_json::to_value(&empty)?;
    assert_eq!(value["summary"]["severity"], "No defects");
    assert_eq!(value["summary"]["average_confidence"], 0.0);
    Ok(())
}

#[test]
fn image_features_describe_intensity() -> anyhow::Result<()> {
    let gray = preprocessing::to_grayscale(&uniform_image(20, 10, 80))?;
    let report = AnalysisReport::build(&inspection(Vec::new()), Duration::ZERO).with_features(&gray);

    let features = report.image_features.expect("features were requested");
    assert_eq!(features.mean_intensity, 80.0);
    assert_eq!(features.std_intensity, 0.0);
    assert_eq!(features.histogram.len(), 256);
    assert_eq!(features.histogram[80], 200);
    Ok(())
}
