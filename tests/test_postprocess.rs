mod common;
use common::*;

/// Overlapping boxes on a jittered grid with varied confidences.
fn crowded_detections() -> Vec<Detection> {
    let mut noise = Noise::new(7);
    let mut detections = Vec::new();
    for i in 0..60u32 {
        let x = (i % 10) * 12 + noise.next_in(0, 8) as u32;
        let y = (i / 10) * 12 + noise.next_in(0, 8) as u32;
        let side = noise.next_in(10, 40) as u32;
        let confidence = 0.5 + noise.next_in(0, 45) as f32 / 100.0;
        let class = DefectClass::from_id(i as u8 % 3).unwrap_or(DefectClass::Crack);
        detections.push(det(class, confidence, x, y, side, side));
    }
    detections
}

#[test]
fn iou_is_symmetric_and_bounded() -> anyhow::Result<()> {
    let detections = crowded_detections();
    for a in &detections {
        for b in &detections {
            let ab = postprocess::calculate_iou(&a.bbox, &b.bbox);
            let ba = postprocess::calculate_iou(&b.bbox, &a.bbox);
            assert_eq!(ab, ba);
            assert!((0.0..=1.0).contains(&ab));
        }
        assert_eq!(postprocess::calculate_iou(&a.bbox, &a.bbox), 1.0);
    }
    Ok(())
}

#[test]
fn nms_output_has_no_heavy_overlap() -> anyhow::Result<()> {
    let kept = postprocess::apply_nms(crowded_detections(), 0.4);

    assert!(!kept.is_empty());
    for (i, a) in kept.iter().enumerate() {
        for b in &kept[i + 1..] {
            assert!(postprocess::calculate_iou(&a.bbox, &b.bbox) <= 0.4);
        }
    }
    assert!(kept.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    Ok(())
}

#[test]
fn nms_is_idempotent() -> anyhow::Result<()> {
    let once = postprocess::apply_nms(crowded_detections(), 0.4);
    let twice = postprocess::apply_nms(once.clone(), 0.4);
    assert_eq!(once, twice);
    Ok(())
}

#[test]
fn nms_is_class_agnostic() -> anyhow::Result<()> {
    let crack = det(DefectClass::Crack, 0.9, 10, 10, 40, 40);
    let slag = det(DefectClass::Slag, 0.8, 12, 12, 40, 40);
    let kept = postprocess::apply_nms(vec![slag, crack.clone()], 0.4);
    assert_eq!(kept, vec![crack]);
    Ok(())
}

#[test]
fn constrained_boxes_fit_content() -> anyhow::Result<()> {
    let bounds = ContentBounds {
        x_min: 15,
        y_min: 10,
        x_max: 100,
        y_max: 90,
    };
    let constrained = postprocess::constrain(crowded_detections(), Some(&bounds), 200, 200, 10);

    assert!(!constrained.is_empty());
    for d in &constrained {
        assert!(d.bbox.width >= 10 && d.bbox.height >= 10);
        assert!(d.bbox.x >= bounds.x_min && d.bbox.x + d.bbox.width <= bounds.x_max);
        assert!(d.bbox.y >= bounds.y_min && d.bbox.y + d.bbox.height <= bounds.y_max);
    }
    Ok(())
}

#[test]
fn image_fallback_drops_undersized_boxes() -> anyhow::Result<()> {
    let detections = vec![
        det(DefectClass::Porosity, 0.9, 0, 0, 30, 30),
        det(DefectClass::Porosity, 0.9, 95, 50, 20, 20),
        det(DefectClass::Crack, 0.9, 40, 40, 6, 60),
    ];
    let constrained = postprocess::constrain(detections, None, 100, 100, 10);

    // the second box is clipped to 5px wide and the crack is too narrow
    assert_eq!(constrained, vec![det(DefectClass::Porosity, 0.9, 0, 0, 30, 30)]);
    Ok(())
}

#[test]
fn shift_moves_roi_boxes_to_image_frame() -> anyhow::Result<()> {
    let bounds = ContentBounds {
        x_min: 30,
        y_min: 20,
        x_max: 300,
        y_max: 200,
    };
    let mut detections = vec![det(DefectClass::Slag, 0.7, 5, 6, 20, 20)];
    postprocess::shift_to_image(&mut detections, &bounds);
    assert_eq!(detections[0].bbox, BoundingBox::new(35, 26, 20, 20));
    Ok(())
}
