//! Face-mesh landmark detector with iris refinement.
//!
//! Box detection runs only when nothing is being tracked. After a frame
//! whose face-presence score clears `min_tracking_confidence`, the next
//! frame crops around the previous landmarks instead.

use anyhow::{bail, Result};
use image::{imageops::FilterType, RgbImage};
use ort::session::Session;
use ort::value::Tensor;
use tracing::{debug, info};

use crate::config::DetectorConfig;
use crate::detector::{build_session, FaceDetector};
use crate::landmarks::{FaceLandmarks, MESH_POINTS, REFINED_POINTS};
use crate::pipeline::LandmarkDetector;
use crate::types::{Point2D, Rect};

const INPUT_SIZE: u32 = 192;
/// Crop side relative to the face box, so brows and chin stay in view.
const ROI_SCALE: f32 = 1.5;

/// Crop regions carried from one frame to the next.
#[derive(Debug, Clone)]
struct RoiTracker {
    tracked: Vec<Rect>,
    max_faces: usize,
    min_presence: f32,
}

impl RoiTracker {
    fn new(max_faces: usize, min_presence: f32) -> Self {
        Self {
            tracked: Vec::new(),
            max_faces: max_faces.max(1),
            min_presence,
        }
    }

    fn is_tracking(&self) -> bool {
        !self.tracked.is_empty()
    }

    /// Crops for this frame. `detect` is only called when nothing is
    /// tracked; its boxes are widened to `ROI_SCALE`. Crops are clipped to
    /// the frame and at most `max_faces` are returned.
    fn select<F>(&mut self, width: u32, height: u32, detect: F) -> Result<Vec<Rect>>
    where
        F: FnOnce() -> Result<Vec<Rect>>,
    {
        let candidates = if self.is_tracking() {
            std::mem::take(&mut self.tracked)
        } else {
            detect()?.iter().map(|r| r.square_around_center(ROI_SCALE)).collect()
        };

        Ok(candidates
            .iter()
            .map(|roi| roi.clamp_to(width, height))
            .filter(|roi| roi.width >= 1.0 && roi.height >= 1.0)
            .take(self.max_faces)
            .collect())
    }

    /// Keep faces whose presence clears the threshold and track them into
    /// the next frame. Anything dropped here means detection runs again.
    fn update(&mut self, results: Vec<(FaceLandmarks, f32)>, width: u32, height: u32) -> Vec<FaceLandmarks> {
        let (w, h) = (width as f32, height as f32);
        let mut faces = Vec::new();
        let mut next = Vec::new();
        for (face, presence) in results {
            if presence < self.min_presence || face.is_empty() {
                debug!("Dropping face with presence {:.2}", presence);
                continue;
            }
            if let Some(bounds) = face.pixel_bounds(w, h) {
                next.push(bounds.square_around_center(ROI_SCALE));
            }
            faces.push(face);
        }
        self.tracked = next;
        faces
    }
}

pub struct MeshDetector {
    detector: FaceDetector,
    session: Session,
    refine: bool,
    rois: RoiTracker,
}

impl MeshDetector {
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        info!("Loading face detector from {}", config.detection_model);
        let detector = FaceDetector::new(config)?;
        info!("Loading landmark model from {}", config.landmark_model);
        let session = build_session(&config.landmark_model, config.intra_threads)?;

        Ok(Self {
            detector,
            session,
            refine: config.refine_landmarks,
            rois: RoiTracker::new(config.max_faces, config.min_tracking_confidence),
        })
    }

    /// Landmarks and presence score for the face inside `roi`.
    fn run_mesh(&mut self, frame: &RgbImage, roi: &Rect) -> Result<(FaceLandmarks, f32)> {
        let crop = image::imageops::crop_imm(
            frame,
            roi.x as u32,
            roi.y as u32,
            roi.width as u32,
            roi.height as u32,
        )
        .to_image();
        let resized = image::imageops::resize(&crop, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

        // NHWC in [0, 1]
        let input_data: Vec<f32> = resized.as_raw().iter().map(|&v| v as f32 / 255.0).collect();
        let input = Tensor::from_array((
            vec![1i64, INPUT_SIZE as i64, INPUT_SIZE as i64, 3],
            input_data,
        ))?;
        let outputs = self.session.run(ort::inputs![input])?;

        let (_, raw) = outputs[0].try_extract_tensor::<f32>()?;
        let count = point_count(raw.len(), self.refine)?;
        let presence = if outputs.len() > 1 {
            let (_, flag) = outputs[1].try_extract_tensor::<f32>()?;
            flag.first().copied().map(sigmoid).unwrap_or(0.0)
        } else {
            1.0
        };

        let face = landmarks_from_raw(raw, count, roi, frame.width(), frame.height());
        Ok((face, presence))
    }
}

impl LandmarkDetector for MeshDetector {
    fn name(&self) -> String {
        if self.refine {
            format!("Face Mesh ({} pts, refined)", REFINED_POINTS)
        } else {
            format!("Face Mesh ({} pts)", MESH_POINTS)
        }
    }

    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<FaceLandmarks>> {
        let (w, h) = (frame.width(), frame.height());
        let detector = &mut self.detector;
        let rois = self.rois.select(w, h, || detector.detect(frame))?;

        let mut results = Vec::with_capacity(rois.len());
        for roi in &rois {
            results.push(self.run_mesh(frame, roi)?);
        }
        Ok(self.rois.update(results, w, h))
    }
}

impl Drop for MeshDetector {
    fn drop(&mut self) {
        debug!("Releasing landmark detector");
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// How many points to read from a raw output of `len` floats (x, y, z each).
fn point_count(len: usize, refine: bool) -> Result<usize> {
    let available = len / 3;
    if refine {
        if available < REFINED_POINTS {
            bail!(
                "Landmark model returned {} points; iris refinement needs {}",
                available,
                REFINED_POINTS
            );
        }
        Ok(REFINED_POINTS)
    } else {
        if available < MESH_POINTS {
            bail!("Landmark model returned {} points, expected {}", available, MESH_POINTS);
        }
        Ok(MESH_POINTS)
    }
}

/// Map model-space points (0..INPUT_SIZE inside `roi`) to normalized frame
/// coordinates.
fn landmarks_from_raw(raw: &[f32], count: usize, roi: &Rect, frame_w: u32, frame_h: u32) -> FaceLandmarks {
    let sx = roi.width / INPUT_SIZE as f32;
    let sy = roi.height / INPUT_SIZE as f32;
    let (fw, fh) = (frame_w as f32, frame_h as f32);

    let points = raw
        .chunks_exact(3)
        .take(count)
        .map(|p| Point2D::new((roi.x + p[0] * sx) / fw, (roi.y + p[1] * sy) / fh))
        .collect();
    FaceLandmarks::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_count_for_refined_model() {
        assert_eq!(point_count(REFINED_POINTS * 3, true).unwrap(), REFINED_POINTS);
        assert_eq!(point_count(REFINED_POINTS * 3, false).unwrap(), MESH_POINTS);
        assert!(point_count(MESH_POINTS * 3, true).is_err());
        assert!(point_count(10, false).is_err());
    }

    #[test]
    fn test_landmarks_map_back_to_frame() {
        let roi = Rect::new(100.0, 50.0, 192.0, 96.0);
        // Crop origin, crop center, crop far corner
        let raw = [0.0, 0.0, 0.0, 96.0, 96.0, 0.0, 192.0, 192.0, 0.0];
        let face = landmarks_from_raw(&raw, 3, &roi, 400, 200);
        assert_eq!(face.points[0], Point2D::new(0.25, 0.25));
        assert_eq!(face.points[1], Point2D::new(0.49, 0.49));
        assert_eq!(face.points[2], Point2D::new(0.73, 0.73));
    }

    #[test]
    fn test_landmarks_respect_count() {
        let raw = vec![1.0; 30];
        assert_eq!(landmarks_from_raw(&raw, 4, &Rect::new(0.0, 0.0, 1.0, 1.0), 1, 1).points.len(), 4);
    }

    /// Two points spanning a 100x100 px box at (200, 100) in a 640x480 frame.
    fn face_in_box() -> FaceLandmarks {
        FaceLandmarks::new(vec![
            Point2D::new(200.0 / 640.0, 100.0 / 480.0),
            Point2D::new(300.0 / 640.0, 200.0 / 480.0),
        ])
    }

    #[test]
    fn test_detection_runs_when_nothing_tracked() {
        let mut rois = RoiTracker::new(1, 0.5);
        let mut calls = 0;
        let selected = rois
            .select(640, 480, || {
                calls += 1;
                Ok(vec![Rect::new(200.0, 100.0, 100.0, 100.0)])
            })
            .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(selected, vec![Rect::new(175.0, 75.0, 150.0, 150.0)]);
    }

    #[test]
    fn test_tracked_roi_skips_detection() {
        let mut rois = RoiTracker::new(1, 0.5);
        let faces = rois.update(vec![(face_in_box(), 0.9)], 640, 480);
        assert_eq!(faces, vec![face_in_box()]);
        assert!(rois.is_tracking());

        let selected = rois
            .select(640, 480, || panic!("detector called while tracking"))
            .unwrap();
        assert_eq!(selected.len(), 1);
        let c = selected[0].center();
        assert!((c.x - 250.0).abs() < 1e-3 && (c.y - 150.0).abs() < 1e-3);
        assert!((selected[0].width - 150.0).abs() < 1e-3);
    }

    #[test]
    fn test_low_presence_drops_face_and_redetects() {
        let mut rois = RoiTracker::new(1, 0.5);
        rois.update(vec![(face_in_box(), 0.9)], 640, 480);
        assert!(rois.is_tracking());

        // Tracked crop is consumed; the model no longer sees a face in it
        let selected = rois.select(640, 480, || Ok(vec![])).unwrap();
        assert_eq!(selected.len(), 1);
        let faces = rois.update(vec![(face_in_box(), 0.2)], 640, 480);
        assert!(faces.is_empty());
        assert!(!rois.is_tracking());

        let mut calls = 0;
        rois.select(640, 480, || {
            calls += 1;
            Ok(vec![])
        })
        .unwrap();
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_max_faces_is_honoured() {
        let boxes = vec![
            Rect::new(10.0, 10.0, 50.0, 50.0),
            Rect::new(200.0, 10.0, 50.0, 50.0),
            Rect::new(400.0, 10.0, 50.0, 50.0),
        ];
        let mut one = RoiTracker::new(1, 0.5);
        assert_eq!(one.select(640, 480, || Ok(boxes.clone())).unwrap().len(), 1);
        let mut two = RoiTracker::new(2, 0.5);
        assert_eq!(two.select(640, 480, || Ok(boxes.clone())).unwrap().len(), 2);
        // Zero is treated as one
        let mut zero = RoiTracker::new(0, 0.5);
        assert_eq!(zero.select(640, 480, || Ok(boxes)).unwrap().len(), 1);
    }

    #[test]
    fn test_rois_are_clipped_to_frame() {
        let mut rois = RoiTracker::new(2, 0.5);
        let selected = rois
            .select(100, 100, || Ok(vec![Rect::new(80.0, 80.0, 40.0, 40.0), Rect::new(500.0, 500.0, 10.0, 10.0)]))
            .unwrap();
        // The second box lies entirely outside the frame
        assert_eq!(selected, vec![Rect::new(70.0, 70.0, 30.0, 30.0)]);
    }

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }
}
