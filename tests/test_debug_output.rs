mod common;
use common::*;

#[test]
fn debug_run_writes_stage_rasters() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let out = dir.path().join("debug");
    let inspector = WeldInspector::new().with_debug(out.clone())?;

    let with_debug = inspector.detect(&vertical_streak(12, 80))?;
    let without = WeldInspector::new().detect(&vertical_streak(12, 80))?;
    assert_eq!(with_debug, without);

    for stage in [
        "00_luminance",
        "01_content_mask",
        "crack_edges",
        "crack_closed",
        "porosity_median",
        "porosity_binary",
        "slag_bright",
    ] {
        let path = out.join(format!("{}.png", stage));
        assert!(path.exists(), "missing {}", path.display());
    }

    let mask = image::open(out.join("01_content_mask.png"))?.to_luma8();
    assert_eq!(mask.dimensions(), (300, 300));
    assert_eq!(mask.get_pixel(150, 150)[0], 255);
    assert_eq!(mask.get_pixel(10, 10)[0], 0);
    Ok(())
}

#[test]
fn debug_dir_must_be_empty() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("stale.png"), b"")?;

    let result = WeldInspector::new().with_debug(dir.path().to_path_buf());
    assert!(matches!(result, Err(InspectError::DebugDirNotEmpty(_))));
    Ok(())
}
