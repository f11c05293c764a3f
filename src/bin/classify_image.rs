use anyhow::{Context, Result};
use image::ImageReader;
use std::env;
use std::path::Path;

use gaze_direction::config::{AppConfig, DEFAULT_PATH};
use gaze_direction::logging::init_logging;
use gaze_direction::mesh::MeshDetector;
use gaze_direction::pipeline::GazePipeline;
use gaze_direction::render::Overlay;

/// Classify the gaze in a still image.
///
/// Usage: classify_image <image> [annotated_output]
fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Usage: classify_image <image> [annotated_output]");
        return Ok(());
    }

    let config_path = Path::new(DEFAULT_PATH);
    let (config, origin) = AppConfig::load(config_path)?;
    init_logging(&config.logging);
    origin.report(config_path);

    let img = ImageReader::open(&args[1])
        .with_context(|| format!("Failed to open {}", args[1]))?
        .decode()?
        .to_rgb8();

    let mut pipeline = GazePipeline::new(MeshDetector::new(&config.detector)?, config.thresholds);
    let Some(analysis) = pipeline.process(&img)? else {
        println!("No face detected in {}", args[1]);
        return Ok(());
    };

    match analysis.reading.ratios() {
        Some(r) => println!("{} (ratio_x {:.3}, ratio_y {:.3})", analysis.reading, r.x, r.y),
        None => println!("{}", analysis.reading),
    }

    if let Some(out_path) = args.get(2) {
        let (w, h) = (img.width(), img.height());
        let mut buf = img.into_raw();
        Overlay::from_config(&config.ui).draw(&mut buf, w as usize, h as usize, &analysis);
        image::RgbImage::from_raw(w, h, buf)
            .context("Annotated buffer has the wrong size")?
            .save(out_path)
            .with_context(|| format!("Failed to write {}", out_path))?;
        println!("Annotated image written to {}", out_path);
    }

    Ok(())
}
