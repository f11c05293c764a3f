//! Horizontal/vertical gaze ratios from iris and eye-corner landmarks.
//!
//! Per eye the iris center is placed relative to the two corner points
//! (horizontal) and the two lid points (vertical). 0.0 sits on the first
//! reference point, 1.0 on the second. The final pair is the mean over both
//! eyes. Values outside [0, 1] are legal and simply mean the iris center lies
//! beyond a reference point.

use crate::error::{Axis, Eye, GazeError, GazeResult};
use crate::landmarks::{EyeIndices, FaceLandmarks, LEFT_EYE, RIGHT_EYE};
use crate::types::Point2D;

/// Spans shorter than this (in pixels) are treated as coincident points.
/// Sub-pixel spans turn landmark jitter into arbitrarily large ratios.
pub const MIN_SPAN_PX: f32 = 1.0;

/// Averaged gaze ratios for one face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeRatios {
    pub x: f32,
    pub y: f32,
}

impl GazeRatios {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Ratios of a single eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeRatios {
    pub horizontal: f32,
    pub vertical: f32,
}

fn indices_for(eye: Eye) -> &'static EyeIndices {
    match eye {
        Eye::Left => &LEFT_EYE,
        Eye::Right => &RIGHT_EYE,
    }
}

fn span_ratio(value: f32, start: f32, end: f32, eye: Eye, axis: Axis) -> GazeResult<f32> {
    let span = end - start;
    if !span.is_finite() || span.abs() < MIN_SPAN_PX {
        return Err(GazeError::DegenerateGeometry { eye, axis, span });
    }
    let ratio = (value - start) / span;
    if !ratio.is_finite() {
        // NaN or infinite landmark coordinates from the model
        return Err(GazeError::DegenerateGeometry { eye, axis, span });
    }
    Ok(ratio)
}

/// Ratios for one eye. `width`/`height` are the frame size in pixels.
pub fn eye_ratios(face: &FaceLandmarks, eye: Eye, width: f32, height: f32) -> GazeResult<EyeRatios> {
    let idx = indices_for(eye);

    let mut iris = [Point2D::default(); 4];
    for (slot, &i) in iris.iter_mut().zip(idx.iris.iter()) {
        *slot = face.pixel(i, width, height)?;
    }
    let center = Point2D::mean(&iris);

    let a = face.pixel(idx.corners.0, width, height)?;
    let b = face.pixel(idx.corners.1, width, height)?;
    let top = face.pixel(idx.lids.0, width, height)?;
    let bottom = face.pixel(idx.lids.1, width, height)?;

    Ok(EyeRatios {
        horizontal: span_ratio(center.x, a.x, b.x, eye, Axis::Horizontal)?,
        vertical: span_ratio(center.y, top.y, bottom.y, eye, Axis::Vertical)?,
    })
}

/// Mean horizontal and vertical ratio over both eyes.
///
/// Fails with [`GazeError::DegenerateGeometry`] instead of returning a
/// non-finite value when an eye is closed or its corners coincide.
pub fn compute_gaze_ratios(face: &FaceLandmarks, width: u32, height: u32) -> GazeResult<GazeRatios> {
    if width == 0 || height == 0 {
        return Err(GazeError::EmptyFrame);
    }
    let (w, h) = (width as f32, height as f32);
    let left = eye_ratios(face, Eye::Left, w, h)?;
    let right = eye_ratios(face, Eye::Right, w, h)?;

    Ok(GazeRatios {
        x: (left.horizontal + right.horizontal) / 2.0,
        y: (left.vertical + right.vertical) / 2.0,
    })
}
