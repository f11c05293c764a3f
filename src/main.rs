use anyhow::Result;
use clap::Parser;
use tracing::info;

use gaze_direction::args::Args;
use gaze_direction::camera::{self, CameraSource};
use gaze_direction::config::AppConfig;
use gaze_direction::logging::init_logging;
use gaze_direction::mesh::MeshDetector;
use gaze_direction::output::WindowOutput;
use gaze_direction::pipeline::GazePipeline;
use gaze_direction::render::Overlay;
use gaze_direction::tracker::{GazeTracker, LabelPrinter};

fn main() -> Result<()> {
    let args = Args::parse();

    if args.list {
        return camera::print_cameras();
    }

    if args.init_config {
        AppConfig::default().save(&args.config)?;
        println!("Wrote default configuration to {}", args.config.display());
        return Ok(());
    }

    let (mut config, origin) = AppConfig::load(&args.config)?;
    init_logging(&config.logging);
    origin.report(&args.config);
    if let Some(index) = args.cam_index {
        config.camera.index = index;
    }
    config.camera.mirror |= args.mirror;

    // Acquired once; released when the tracker returns
    let source = CameraSource::new(config.camera.index)?;
    let detector = MeshDetector::new(&config.detector)?;
    let window = WindowOutput::new(
        &config.ui.window_title,
        source.width() as usize,
        source.height() as usize,
    )?;

    let pipeline = GazePipeline::new(detector, config.thresholds);
    let overlay = Overlay::from_config(&config.ui);
    let printer = LabelPrinter::new(std::io::stdout().lock(), config.ui.color_console);

    info!("Press Esc to quit");
    let summary = GazeTracker::new(source, pipeline, window, overlay, printer)
        .with_mirror(config.camera.mirror)
        .run()?;

    info!("{:?}", summary);
    Ok(())
}
