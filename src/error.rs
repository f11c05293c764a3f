use std::fmt;

/// Which eye a measurement belongs to, from the subject's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

impl fmt::Display for Eye {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eye::Left => write!(f, "left"),
            Eye::Right => write!(f, "right"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Horizontal => write!(f, "horizontal"),
            Axis::Vertical => write!(f, "vertical"),
        }
    }
}

/// Errors raised by ratio extraction and classification.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GazeError {
    /// The landmark set does not contain an index the eye geometry needs.
    /// Usually means the model ran without iris refinement (468 points).
    #[error("landmark {index} missing (face has {available} points)")]
    MissingLandmark { index: usize, available: usize },

    /// Corner or lid points (nearly) coincide, so the ratio is undefined.
    #[error("degenerate {axis} geometry on {eye} eye (span {span:.6} px)")]
    DegenerateGeometry { eye: Eye, axis: Axis, span: f32 },

    #[error("frame has zero width or height")]
    EmptyFrame,

    #[error("invalid thresholds: {message}")]
    InvalidThresholds { message: String },
}

pub type GazeResult<T> = Result<T, GazeError>;

impl GazeError {
    pub fn invalid_thresholds(msg: impl Into<String>) -> Self {
        Self::InvalidThresholds {
            message: msg.into(),
        }
    }

    /// Geometry errors describe the face in this frame, not a broken setup.
    pub fn is_degenerate(&self) -> bool {
        matches!(self, GazeError::DegenerateGeometry { .. })
    }
}
