use clap::Parser;
use flexi_logger::Logger;
use image::{DynamicImage, ImageReader, Rgb};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::Instant;

use weldscan::detection::preprocessing;
use weldscan::{AnalysisReport, DefectClass, Detection, InspectorConfig, WeldInspector};

#[derive(Parser)]
#[command(name = "weldscan")]
#[command(about = "Detect cracks, porosity and slag in weld radiographs")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Enable verbose (debug level) logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON file overriding the default detector tuning
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Minimum confidence for a detection to be reported
    #[arg(long)]
    confidence_threshold: Option<f32>,

    /// IoU above which overlapping detections are suppressed
    #[arg(long)]
    nms_threshold: Option<f32>,

    /// Save intermediate rasters to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Write a copy of the input with detection boxes drawn on it
    #[arg(long, value_name = "FILE")]
    annotate: Option<PathBuf>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,
}

fn class_color(class: DefectClass) -> Rgb<u8> {
    match class {
        DefectClass::Crack => Rgb([255, 0, 0]),
        DefectClass::Porosity => Rgb([0, 160, 255]),
        DefectClass::Slag => Rgb([255, 200, 0]),
        _ => Rgb([0, 255, 0]),
    }
}

fn save_annotated(img: &DynamicImage, detections: &[Detection], path: &Path) -> anyhow::Result<()> {
    let mut canvas = img.to_rgb8();
    for d in detections {
        let rect = Rect::at(d.bbox.x as i32, d.bbox.y as i32).of_size(d.bbox.width, d.bbox.height);
        draw_hollow_rect_mut(&mut canvas, rect, class_color(d.class));
    }
    canvas
        .save(path)
        .map_err(|e| anyhow::anyhow!("Failed to save annotated image: {}", e))?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let level = if args.verbose { "debug" } else { "info" };
    let _logger = Logger::try_with_env_or_str(level)?.log_to_stderr().start()?;

    // Assemble configuration: file first, then command-line overrides
    let mut config = match &args.config {
        Some(path) => InspectorConfig::from_json_file(path)?,
        None => InspectorConfig::default(),
    };
    if let Some(t) = args.confidence_threshold {
        config.confidence_threshold = t;
    }
    if let Some(t) = args.nms_threshold {
        config.nms_threshold = t;
    }

    info!("Loading image: {:?}", args.image_path);
    let mut img = ImageReader::open(&args.image_path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
    if img.color().has_alpha() {
        debug!("Dropping alpha channel from {:?}", img.color());
        img = DynamicImage::ImageRgb8(img.to_rgb8());
    }
    info!("Image loaded: {}x{}", img.width(), img.height());

    let mut inspector = WeldInspector::from_config(config)?;
    if let Some(debug_dir) = args.debug_out {
        inspector = inspector.with_debug(debug_dir)?;
    }

    let start = Instant::now();
    let gray = preprocessing::to_grayscale(&img)?;
    let inspection = inspector.inspect_gray(&gray)?;
    let report = AnalysisReport::build(&inspection, start.elapsed()).with_features(&gray);

    if let Some(path) = &args.annotate {
        save_annotated(&img, &inspection.detections, path)?;
        info!("Annotated image written to {:?}", path);
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);

    Ok(())
}
