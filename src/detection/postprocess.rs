use crate::models::{BoundingBox, ContentBounds, Detection};

/// Move ROI-local boxes into full-image coordinates.
pub fn shift_to_image(detections: &mut [Detection], bounds: &ContentBounds) {
    for detection in detections {
        detection.bbox.translate(bounds.x_min, bounds.y_min);
    }
}

pub fn calculate_iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    a.iou(b)
}

/// Class-agnostic greedy non-maximum suppression.
///
/// Detections are visited by descending confidence (ties keep their input
/// order); each one survives unless it overlaps an already kept detection by
/// more than `threshold` IoU.
pub fn apply_nms(mut detections: Vec<Detection>, threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for detection in detections {
        let overlaps = kept
            .iter()
            .any(|existing| calculate_iou(&detection.bbox, &existing.bbox) > threshold);
        if !overlaps {
            kept.push(detection);
        }
    }
    kept
}

/// Keep detections centered inside the content bounds, clamped into them.
pub fn constrain_to_content_bounds(
    detections: Vec<Detection>,
    bounds: &ContentBounds,
    min_size: u32,
) -> Vec<Detection> {
    let (x_min, y_min) = (bounds.x_min as i64, bounds.y_min as i64);
    let (x_max, y_max) = (bounds.x_max as i64, bounds.y_max as i64);

    detections
        .into_iter()
        .filter_map(|mut detection| {
            let (cx, cy) = detection.bbox.center();
            if !bounds.contains(cx, cy) {
                return None;
            }

            let x = (detection.bbox.x as i64).min(x_max - 1).max(x_min);
            let y = (detection.bbox.y as i64).min(y_max - 1).max(y_min);
            let w = (detection.bbox.width as i64).min(x_max - x).max(1);
            let h = (detection.bbox.height as i64).min(y_max - y).max(1);

            if w < min_size as i64 || h < min_size as i64 {
                return None;
            }

            detection.bbox = BoundingBox::new(x as u32, y as u32, w as u32, h as u32);
            Some(detection)
        })
        .collect()
}

/// Clamp detections into the full image when no content bounds were found.
pub fn constrain_to_image_bounds(
    detections: Vec<Detection>,
    width: u32,
    height: u32,
    min_size: u32,
) -> Vec<Detection> {
    let (img_w, img_h) = (width as i64, height as i64);

    detections
        .into_iter()
        .filter_map(|mut detection| {
            let x = (detection.bbox.x as i64).min(img_w - 1).max(0);
            let y = (detection.bbox.y as i64).min(img_h - 1).max(0);
            let w = (detection.bbox.width as i64).min(img_w - x).max(1);
            let h = (detection.bbox.height as i64).min(img_h - y).max(1);

            let fits = x + w <= img_w && y + h <= img_h;
            if w < min_size as i64 || h < min_size as i64 || !fits {
                return None;
            }

            detection.bbox = BoundingBox::new(x as u32, y as u32, w as u32, h as u32);
            Some(detection)
        })
        .collect()
}

/// Apply the content-bounds constraint, falling back to the image frame.
pub fn constrain(
    detections: Vec<Detection>,
    bounds: Option<&ContentBounds>,
    width: u32,
    height: u32,
    min_size: u32,
) -> Vec<Detection> {
    match bounds {
        Some(bounds) => constrain_to_content_bounds(detections, bounds, min_size),
        None => constrain_to_image_bounds(detections, width, height, min_size),
    }
}
