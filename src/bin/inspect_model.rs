use anyhow::{Context, Result};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use std::env;
use std::path::Path;

use gaze_direction::config::{AppConfig, DEFAULT_PATH};
use gaze_direction::logging::init_logging;

/// Print input and output signatures of an ONNX model. With no argument,
/// inspects both models named in the default configuration.
fn main() -> Result<()> {
    let config_path = Path::new(DEFAULT_PATH);
    let (config, origin) = AppConfig::load(config_path)?;
    init_logging(&config.logging);
    origin.report(config_path);

    let paths: Vec<String> = match env::args().nth(1) {
        Some(p) => vec![p],
        None => vec![config.detector.detection_model, config.detector.landmark_model],
    };

    for path in paths {
        inspect(&path)?;
    }
    Ok(())
}

fn inspect(model_path: &str) -> Result<()> {
    println!("Inspecting model: {}", model_path);

    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level1)?
        .with_intra_threads(1)?
        .commit_from_file(model_path)
        .with_context(|| format!("Failed to load {}", model_path))?;

    println!("\n--- Inputs ---");
    for (i, input) in session.inputs.iter().enumerate() {
        println!("#{}: {} ({:?})", i, input.name, input.input_type);
    }

    println!("\n--- Outputs ---");
    for (i, output) in session.outputs.iter().enumerate() {
        println!("#{}: {} ({:?})", i, output.name, output.output_type);
    }
    println!();

    Ok(())
}
