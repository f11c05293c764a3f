//! Thresholding gaze ratios into one of nine direction labels.
//!
//! Each axis is bucketed independently with strict comparisons, so a ratio
//! sitting exactly on a threshold falls into the center band. Every call is
//! independent of the ones before it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GazeError, GazeResult};
use crate::ratio::GazeRatios;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Horizontal {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vertical {
    Up,
    Center,
    Down,
}

impl fmt::Display for Horizontal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Horizontal::Left => "Left",
            Horizontal::Center => "Center",
            Horizontal::Right => "Right",
        })
    }
}

impl fmt::Display for Vertical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Vertical::Up => "Up",
            Vertical::Center => "Center",
            Vertical::Down => "Down",
        })
    }
}

/// Ratio cut-offs for both axes. Not calibrated per user; the defaults
/// assume a roughly frontal face at webcam distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// `ratio_x` below this is Left.
    pub left: f32,
    /// `ratio_x` above this is Right.
    pub right: f32,
    /// `ratio_y` below this is Up.
    pub up: f32,
    /// `ratio_y` above this is Down.
    pub down: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            left: 0.35,
            right: 0.65,
            up: 0.35,
            down: 0.65,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> GazeResult<()> {
        let all = [self.left, self.right, self.up, self.down];
        if all.iter().any(|t| !t.is_finite()) {
            return Err(GazeError::invalid_thresholds("thresholds must be finite"));
        }
        if self.left > self.right {
            return Err(GazeError::invalid_thresholds(format!(
                "left ({}) is above right ({})",
                self.left, self.right
            )));
        }
        if self.up > self.down {
            return Err(GazeError::invalid_thresholds(format!(
                "up ({}) is above down ({})",
                self.up, self.down
            )));
        }
        Ok(())
    }

    pub fn horizontal(&self, ratio_x: f32) -> Horizontal {
        if ratio_x < self.left {
            Horizontal::Left
        } else if ratio_x > self.right {
            Horizontal::Right
        } else {
            Horizontal::Center
        }
    }

    pub fn vertical(&self, ratio_y: f32) -> Vertical {
        if ratio_y < self.up {
            Vertical::Up
        } else if ratio_y > self.down {
            Vertical::Down
        } else {
            Vertical::Center
        }
    }
}

/// One of the nine coarse gaze directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GazeDirection {
    pub horizontal: Horizontal,
    pub vertical: Vertical,
}

impl fmt::Display for GazeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gaze: {}-{}", self.horizontal, self.vertical)
    }
}

pub fn classify(ratios: GazeRatios, thresholds: &Thresholds) -> GazeDirection {
    GazeDirection {
        horizontal: thresholds.horizontal(ratios.x),
        vertical: thresholds.vertical(ratios.y),
    }
}

/// What gets reported for a face in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GazeReading {
    Direction {
        direction: GazeDirection,
        ratios: GazeRatios,
    },
    /// Eye geometry was degenerate (closed eye, coincident corners).
    Indeterminate,
}

impl GazeReading {
    /// Classify an extraction result. Degenerate geometry becomes
    /// `Indeterminate`; any other error is passed through.
    pub fn from_result(result: GazeResult<GazeRatios>, thresholds: &Thresholds) -> GazeResult<Self> {
        match result {
            Ok(ratios) => Ok(GazeReading::Direction {
                direction: classify(ratios, thresholds),
                ratios,
            }),
            Err(e) if e.is_degenerate() => Ok(GazeReading::Indeterminate),
            Err(e) => Err(e),
        }
    }

    pub fn direction(&self) -> Option<GazeDirection> {
        match self {
            GazeReading::Direction { direction, .. } => Some(*direction),
            GazeReading::Indeterminate => None,
        }
    }

    pub fn ratios(&self) -> Option<GazeRatios> {
        match self {
            GazeReading::Direction { ratios, .. } => Some(*ratios),
            GazeReading::Indeterminate => None,
        }
    }
}

impl fmt::Display for GazeReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GazeReading::Direction { direction, .. } => direction.fmt(f),
            GazeReading::Indeterminate => f.write_str("Gaze: Indeterminate"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Axis, Eye};
    use proptest::prelude::*;

    fn label(x: f32, y: f32) -> String {
        classify(GazeRatios::new(x, y), &Thresholds::default()).to_string()
    }

    #[test]
    fn test_center_band() {
        assert_eq!(label(0.5, 0.5), "Gaze: Center-Center");
    }

    #[test]
    fn test_extremes() {
        assert_eq!(label(0.0, 0.5), "Gaze: Left-Center");
        assert_eq!(label(1.0, 0.5), "Gaze: Right-Center");
        assert_eq!(label(0.5, 0.0), "Gaze: Center-Up");
        assert_eq!(label(0.5, 1.0), "Gaze: Center-Down");
        assert_eq!(label(0.1, 0.9), "Gaze: Left-Down");
        assert_eq!(label(0.9, 0.1), "Gaze: Right-Up");
    }

    #[test]
    fn test_threshold_boundaries_are_center() {
        assert_eq!(label(0.35, 0.35), "Gaze: Center-Center");
        assert_eq!(label(0.65, 0.65), "Gaze: Center-Center");
        assert_eq!(label(0.6500001, 0.5), "Gaze: Right-Center");
        assert_eq!(label(0.5, 0.6500001), "Gaze: Center-Down");
        assert_eq!(label(0.3499999, 0.5), "Gaze: Left-Center");
    }

    #[test]
    fn test_out_of_range_ratios_still_classify() {
        assert_eq!(label(-3.0, 7.5), "Gaze: Left-Down");
    }

    #[test]
    fn test_nine_distinct_labels() {
        let mut seen = std::collections::HashSet::new();
        for x in [0.1, 0.5, 0.9] {
            for y in [0.1, 0.5, 0.9] {
                seen.insert(label(x, y));
            }
        }
        assert_eq!(seen.len(), 9);
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let bad = Thresholds {
            left: 0.7,
            ..Thresholds::default()
        };
        assert!(matches!(bad.validate(), Err(GazeError::InvalidThresholds { .. })));
        let nan = Thresholds {
            down: f32::NAN,
            ..Thresholds::default()
        };
        assert!(nan.validate().is_err());
        assert!(Thresholds::default().validate().is_ok());
    }

    #[test]
    fn test_reading_from_degenerate_is_indeterminate() {
        let err = GazeError::DegenerateGeometry {
            eye: Eye::Left,
            axis: Axis::Vertical,
            span: 0.0,
        };
        let reading = GazeReading::from_result(Err(err), &Thresholds::default()).unwrap();
        assert_eq!(reading, GazeReading::Indeterminate);
        assert_eq!(reading.to_string(), "Gaze: Indeterminate");
        assert!(reading.direction().is_none());
    }

    #[test]
    fn test_reading_passes_through_missing_landmark() {
        let err = GazeError::MissingLandmark {
            index: 474,
            available: 468,
        };
        assert!(GazeReading::from_result(Err(err), &Thresholds::default()).is_err());
    }

    proptest! {
        #[test]
        fn prop_classify_is_pure(x in -2.0f32..3.0, y in -2.0f32..3.0, noise in proptest::collection::vec((-2.0f32..3.0, -2.0f32..3.0), 0..8)) {
            let t = Thresholds::default();
            let first = classify(GazeRatios::new(x, y), &t);
            for (nx, ny) in noise {
                let _ = classify(GazeRatios::new(nx, ny), &t);
            }
            prop_assert_eq!(first, classify(GazeRatios::new(x, y), &t));
        }

        #[test]
        fn prop_inside_band_is_center(x in 0.35f32..=0.65, y in 0.35f32..=0.65) {
            prop_assert_eq!(label(x, y), "Gaze: Center-Center");
        }
    }
}
