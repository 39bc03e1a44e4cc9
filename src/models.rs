use serde::{Deserialize, Serialize};
use std::fmt;

/// Weld defect categories.
///
/// The detectors only ever produce `Crack`, `Porosity` and `Slag`; the other
/// classes keep their ids so downstream consumers see a stable table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectClass {
    Crack,
    Porosity,
    Slag,
    Inclusion,
    Undercut,
    BurnThrough,
}

impl DefectClass {
    pub const ALL: [DefectClass; 6] = [
        DefectClass::Crack,
        DefectClass::Porosity,
        DefectClass::Slag,
        DefectClass::Inclusion,
        DefectClass::Undercut,
        DefectClass::BurnThrough,
    ];

    pub fn id(self) -> u8 {
        match self {
            DefectClass::Crack => 0,
            DefectClass::Porosity => 1,
            DefectClass::Slag => 2,
            DefectClass::Inclusion => 3,
            DefectClass::Undercut => 4,
            DefectClass::BurnThrough => 5,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DefectClass::Crack => "crack",
            DefectClass::Porosity => "porosity",
            DefectClass::Slag => "slag",
            DefectClass::Inclusion => "inclusion",
            DefectClass::Undercut => "undercut",
            DefectClass::BurnThrough => "burn_through",
        }
    }
}

impl fmt::Display for DefectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Integer center, rounding down.
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn translate(&mut self, dx: u32, dy: u32) {
        self.x += dx;
        self.y += dy;
    }

    /// Intersection over union; zero for disjoint boxes or an empty union.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x.max(other.x) as i64;
        let y1 = self.y.max(other.y) as i64;
        let x2 = (self.x as i64 + self.width as i64).min(other.x as i64 + other.width as i64);
        let y2 = (self.y as i64 + self.height as i64).min(other.y as i64 + other.height as i64);

        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }

        let intersection = (x2 - x1) * (y2 - y1);
        let union = self.area() as i64 + other.area() as i64 - intersection;
        if union <= 0 {
            return 0.0;
        }

        intersection as f32 / union as f32
    }
}

/// A single defect candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class: DefectClass,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(class: DefectClass, confidence: f32, bbox: BoundingBox) -> Self {
        Self { class, confidence, bbox }
    }
}

/// Rectangle of radiographic content; maxima are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBounds {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
}

impl ContentBounds {
    pub fn width(&self) -> u32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> u32 {
        self.y_max - self.y_min
    }

    /// Inclusive on both ends, matching how detection centers are tested.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.x_min..=self.x_max).contains(&x) && (self.y_min..=self.y_max).contains(&y)
    }
}

/// Connected set of mask pixels, summarized by its extent and pixel count.
///
/// Used both for 8-connected edge contours (crack detection) and for
/// 4-connected bright regions (slag detection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    pub pixel_count: u32,
}

impl Contour {
    pub fn from_point(x: u32, y: u32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            pixel_count: 1,
        }
    }

    pub fn push(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.pixel_count += 1;
    }

    /// Horizontal extent (`max_x - min_x`, so a single column has width 0).
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> u32 {
        self.pixel_count
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(self.min_x, self.min_y, self.width(), self.height())
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.pixel_count < 2 {
            return 1.0;
        }
        let w = self.width();
        let h = self.height();
        w.max(h) as f32 / w.min(h).max(1) as f32
    }

    /// `1 - area / hull_area`, with the hull approximated by the extent box.
    /// Compact blobs can come out negative.
    pub fn irregularity(&self) -> f32 {
        if self.pixel_count < 3 {
            return 0.0;
        }
        let hull_area = self.width() as u64 * self.height() as u64;
        1.0 - self.pixel_count as f32 / hull_area.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iou_identity_and_disjoint() {
        let a = BoundingBox::new(10, 10, 20, 20);
        let b = BoundingBox::new(40, 40, 10, 10);
        assert_eq!(a.iou(&a), 1.0);
        assert_eq!(a.iou(&b), 0.0);
        // touching edges do not overlap
        let c = BoundingBox::new(30, 10, 10, 20);
        assert_eq!(a.iou(&c), 0.0);
    }

    #[test]
    fn iou_zero_area_boxes() {
        let a = BoundingBox::new(5, 5, 0, 0);
        assert_eq!(a.iou(&a), 0.0);
    }

    #[test]
    fn contour_metrics() {
        let mut c = Contour::from_point(4, 10);
        for y in 11..=40 {
            c.push(4, y);
            c.push(5, y);
        }
        assert_eq!(c.width(), 1);
        assert_eq!(c.height(), 30);
        assert_eq!(c.area(), 61);
        assert_eq!(c.aspect_ratio(), 30.0);
        // hull area 30, area 61
        assert!(c.irregularity() < 0.0);
    }

    #[test]
    fn class_table_roundtrip() {
        for class in DefectClass::ALL {
            assert_eq!(DefectClass::from_id(class.id()), Some(class));
        }
        assert_eq!(DefectClass::from_id(6), None);
        assert_eq!(
            serde_json::to_string(&DefectClass::BurnThrough).unwrap(),
            "\"burn_through\""
        );
    }
}
