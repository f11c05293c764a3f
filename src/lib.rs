//! Coarse gaze direction from face-mesh iris landmarks.
//!
//! [`ratio::compute_gaze_ratios`] turns one face's landmarks into a
//! horizontal/vertical ratio pair and [`direction::classify`] buckets that
//! pair into one of nine labels such as `Gaze: Left-Up`. The rest of the
//! crate feeds webcam frames through an ONNX face-mesh model and shows the
//! result.

pub mod args;
pub mod camera;
pub mod config;
pub mod detector;
pub mod direction;
pub mod error;
pub mod font;
pub mod landmarks;
pub mod logging;
pub mod mesh;
pub mod output;
pub mod pipeline;
pub mod ratio;
pub mod render;
pub mod tracker;
pub mod ttf;
pub mod types;

pub use direction::{classify, GazeDirection, GazeReading, Horizontal, Thresholds, Vertical};
pub use error::{GazeError, GazeResult};
pub use landmarks::FaceLandmarks;
pub use ratio::{compute_gaze_ratios, GazeRatios};
