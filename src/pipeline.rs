use anyhow::Result;
use image::RgbImage;

use crate::direction::{GazeReading, Thresholds};
use crate::landmarks::FaceLandmarks;
use crate::ratio::compute_gaze_ratios;

/// Black-box landmark service. Returns zero or more faces per frame, each
/// with points normalized to the frame size, ordered by confidence.
pub trait LandmarkDetector {
    fn name(&self) -> String;
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<FaceLandmarks>>;
}

/// Result of analysing a single frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameAnalysis {
    pub face: FaceLandmarks,
    pub reading: GazeReading,
}

/// Detection followed by ratio extraction and classification of the first face.
pub struct GazePipeline<D: LandmarkDetector> {
    detector: D,
    thresholds: Thresholds,
}

impl<D: LandmarkDetector> GazePipeline<D> {
    pub fn new(detector: D, thresholds: Thresholds) -> Self {
        Self { detector, thresholds }
    }

    pub fn detector_name(&self) -> String {
        self.detector.name()
    }

    /// `Ok(None)` when no face was found in the frame.
    pub fn process(&mut self, frame: &RgbImage) -> Result<Option<FrameAnalysis>> {
        let mut faces = self.detector.detect(frame)?;
        if faces.is_empty() {
            return Ok(None);
        }
        let face = faces.swap_remove(0);

        let ratios = compute_gaze_ratios(&face, frame.width(), frame.height());
        let reading = GazeReading::from_result(ratios, &self.thresholds)?;
        Ok(Some(FrameAnalysis { face, reading }))
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::ScriptedDetector;
    use super::*;
    use crate::landmarks::{LEFT_EYE, RIGHT_EYE};
    use crate::types::Point2D;
    use crate::ratio::fixtures::{face_looking_at, HEIGHT, WIDTH};

    fn frame() -> RgbImage {
        RgbImage::new(WIDTH, HEIGHT)
    }

    #[test]
    fn test_no_face_is_none() {
        let mut p = GazePipeline::new(ScriptedDetector::new(vec![vec![]]), Thresholds::default());
        assert!(p.process(&frame()).unwrap().is_none());
    }

    #[test]
    fn test_only_first_face_is_classified() {
        let faces = vec![face_looking_at(0.1, 0.5), face_looking_at(0.9, 0.5)];
        let mut p = GazePipeline::new(ScriptedDetector::new(vec![faces]), Thresholds::default());
        let analysis = p.process(&frame()).unwrap().unwrap();
        assert_eq!(analysis.reading.to_string(), "Gaze: Left-Center");
        assert_eq!(analysis.face, face_looking_at(0.1, 0.5));
    }

    #[test]
    fn test_degenerate_face_is_indeterminate() {
        let mut face = face_looking_at(0.5, 0.5);
        face.points[LEFT_EYE.lids.1] = face.points[LEFT_EYE.lids.0];
        let mut p = GazePipeline::new(ScriptedDetector::new(vec![vec![face]]), Thresholds::default());
        let analysis = p.process(&frame()).unwrap().unwrap();
        assert_eq!(analysis.reading, GazeReading::Indeterminate);
    }

    #[test]
    fn test_nan_landmark_is_indeterminate() {
        let mut face = face_looking_at(0.1, 0.5);
        face.points[RIGHT_EYE.iris[0]] = Point2D::new(f32::NAN, f32::NAN);
        let mut p = GazePipeline::new(ScriptedDetector::new(vec![vec![face]]), Thresholds::default());
        let analysis = p.process(&frame()).unwrap().unwrap();
        assert_eq!(analysis.reading, GazeReading::Indeterminate);
        assert_eq!(analysis.reading.to_string(), "Gaze: Indeterminate");
    }

    #[test]
    fn test_detector_dropped_with_pipeline() {
        let detector = ScriptedDetector::new(vec![]);
        let drops = detector.drop_counter();
        let p = GazePipeline::new(detector, Thresholds::default());
        assert_eq!(drops.get(), 0);
        drop(p);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_unrefined_face_is_an_error() {
        let face = face_looking_at(0.5, 0.5).without_iris();
        let mut p = GazePipeline::new(ScriptedDetector::new(vec![vec![face]]), Thresholds::default());
        assert!(p.process(&frame()).is_err());
    }
}
