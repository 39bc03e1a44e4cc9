use image::{DynamicImage, GrayImage, Luma};
use weldscan::{BoundingBox, DefectClass, Detection};

/// Uniform grayscale image.
pub fn uniform_image(width: u32, height: u32, value: u8) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([value])))
}

/// 300x300 dark radiograph (intensity 20) with a bright vertical streak of
/// intensity 230 and the given size, centered on (150, 150).
pub fn vertical_streak(line_width: u32, line_height: u32) -> DynamicImage {
    let x0 = 150 - line_width / 2;
    let y0 = 150 - line_height / 2;
    let img = GrayImage::from_fn(300, 300, |x, y| {
        let inside = x >= x0 && x < x0 + line_width && y >= y0 && y < y0 + line_height;
        Luma([if inside { 230 } else { 20 }])
    });
    DynamicImage::ImageLuma8(img)
}

/// Bright field (intensity 200) with a dark disk (intensity 30).
pub fn dark_disk(width: u32, height: u32, cx: i64, cy: i64, radius: i64) -> DynamicImage {
    let img = GrayImage::from_fn(width, height, |x, y| {
        let (dx, dy) = (x as i64 - cx, y as i64 - cy);
        Luma([if dx * dx + dy * dy <= radius * radius { 30 } else { 200 }])
    });
    DynamicImage::ImageLuma8(img)
}

/// Seeded xorshift generator yielding a fixed sequence of bytes.
pub struct Noise(u64);

impl Noise {
    pub fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    pub fn next_in(&mut self, lo: u8, hi: u8) -> u8 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        lo + (self.0 % (hi - lo) as u64) as u8
    }
}

/// Scanned radiograph with a black letterbox `border` pixels wide around
/// noisy film content and a brighter horizontal weld bead.
pub fn letterboxed_radiograph(width: u32, height: u32, border: u32) -> DynamicImage {
    let mut noise = Noise::new(42);
    let bead = height / 2 - 40..height / 2 + 40;
    let mut img = GrayImage::new(width, height);
    for y in border..height - border {
        for x in border..width - border {
            let value = if bead.contains(&y) {
                noise.next_in(150, 255)
            } else {
                noise.next_in(100, 200)
            };
            img.put_pixel(x, y, Luma([value]));
        }
    }
    DynamicImage::ImageLuma8(img)
}

pub fn det(class: DefectClass, confidence: f32, x: u32, y: u32, w: u32, h: u32) -> Detection {
    Detection::new(class, confidence, BoundingBox::new(x, y, w, h))
}
