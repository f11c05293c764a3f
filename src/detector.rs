//! UltraFace box detector. Proposes face regions for the landmark model.

use anyhow::{Context, Result};
use image::{imageops::FilterType, RgbImage};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use tracing::debug;

use crate::config::DetectorConfig;
use crate::types::Rect;

const INPUT_W: u32 = 320;
const INPUT_H: u32 = 240;
const CENTER_VARIANCE: f32 = 0.1;
const SIZE_VARIANCE: f32 = 0.2;
const NMS_IOU: f32 = 0.3;

/// Build an inference session the way every model in this crate is loaded.
pub(crate) fn build_session(model_path: &str, intra_threads: usize) -> Result<Session> {
    if !Path::new(model_path).exists() {
        anyhow::bail!("Model not found at {}", model_path);
    }
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(intra_threads)?
        .with_execution_providers([
            ort::execution_providers::CoreMLExecutionProvider::default().build(),
            ort::execution_providers::CPUExecutionProvider::default().build(),
        ])?
        .commit_from_file(model_path)
        .with_context(|| format!("Failed to load model {}", model_path))?;
    Ok(session)
}

/// Normalized anchor box (center, size) in the 320x240 input.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Prior {
    cx: f32,
    cy: f32,
    w: f32,
    h: f32,
}

pub struct FaceDetector {
    session: Session,
    priors: Vec<Prior>,
    score_threshold: f32,
    max_faces: usize,
}

impl FaceDetector {
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        let session = build_session(&config.detection_model, config.intra_threads)?;
        Ok(Self {
            session,
            priors: generate_priors(INPUT_W, INPUT_H),
            score_threshold: config.min_detection_confidence,
            max_faces: config.max_faces.max(1),
        })
    }

    /// Face boxes in frame pixels, best score first, at most `max_faces`.
    pub fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Rect>> {
        let resized = image::imageops::resize(frame, INPUT_W, INPUT_H, FilterType::Triangle);

        // NCHW, (p - 127) / 128
        let plane = (INPUT_W * INPUT_H) as usize;
        let mut input_data = vec![0.0f32; 3 * plane];
        for (i, pixel) in resized.pixels().enumerate() {
            for c in 0..3 {
                input_data[c * plane + i] = (pixel[c] as f32 - 127.0) / 128.0;
            }
        }

        let input = Tensor::from_array((vec![1i64, 3, INPUT_H as i64, INPUT_W as i64], input_data))?;
        let outputs = self.session.run(ort::inputs![input])?;
        let (_, scores) = outputs["scores"].try_extract_tensor::<f32>()?;
        let (_, boxes) = outputs["boxes"].try_extract_tensor::<f32>()?;

        let candidates = decode(&self.priors, scores, boxes, self.score_threshold);
        let kept = non_max_suppression(candidates, NMS_IOU, self.max_faces);
        debug!("Face detector kept {} box(es)", kept.len());

        let sx = frame.width() as f32;
        let sy = frame.height() as f32;
        Ok(kept
            .into_iter()
            .map(|r| Rect::new(r.x * sx, r.y * sy, r.width * sx, r.height * sy))
            .collect())
    }
}

/// Decode raw outputs into `(score, normalized rect)` pairs above `threshold`.
fn decode(priors: &[Prior], scores: &[f32], boxes: &[f32], threshold: f32) -> Vec<(f32, Rect)> {
    priors
        .iter()
        .enumerate()
        .filter_map(|(i, p)| {
            let score = *scores.get(i * 2 + 1)?;
            if score <= threshold {
                return None;
            }
            let enc = boxes.get(i * 4..i * 4 + 4)?;
            let cx = enc[0] * CENTER_VARIANCE * p.w + p.cx;
            let cy = enc[1] * CENTER_VARIANCE * p.h + p.cy;
            let w = (enc[2] * SIZE_VARIANCE).exp() * p.w;
            let h = (enc[3] * SIZE_VARIANCE).exp() * p.h;
            Some((score, Rect::new(cx - w / 2.0, cy - h / 2.0, w, h)))
        })
        .collect()
}

/// Greedy NMS, highest score first.
fn non_max_suppression(mut candidates: Vec<(f32, Rect)>, iou: f32, max: usize) -> Vec<Rect> {
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
    let mut kept: Vec<Rect> = Vec::new();
    for (_, rect) in candidates {
        if kept.len() >= max {
            break;
        }
        if kept.iter().all(|k| k.iou(&rect) <= iou) {
            kept.push(rect);
        }
    }
    kept
}

fn generate_priors(width: u32, height: u32) -> Vec<Prior> {
    const STRIDES: [u32; 4] = [8, 16, 32, 64];
    const MIN_BOXES: [&[f32]; 4] = [&[10.0, 16.0, 24.0], &[32.0, 48.0], &[64.0, 96.0], &[128.0, 192.0, 256.0]];

    let (w, h) = (width as f32, height as f32);
    let mut priors = Vec::new();
    for (stride, sizes) in STRIDES.iter().zip(MIN_BOXES.iter()) {
        let s = *stride as f32;
        let rows = (h / s).ceil() as u32;
        let cols = (w / s).ceil() as u32;
        for v in 0..rows {
            for u in 0..cols {
                let cx = (u as f32 * s + s / 2.0) / w;
                let cy = (v as f32 * s + s / 2.0) / h;
                for &size in sizes.iter() {
                    priors.push(Prior {
                        cx,
                        cy,
                        w: size / w,
                        h: size / h,
                    });
                }
            }
        }
    }
    priors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prior_count_matches_model_output() {
        assert_eq!(generate_priors(INPUT_W, INPUT_H).len(), 4420);
    }

    #[test]
    fn test_zero_offsets_decode_to_prior() {
        let priors = vec![Prior {
            cx: 0.5,
            cy: 0.5,
            w: 0.2,
            h: 0.4,
        }];
        let out = decode(&priors, &[0.1, 0.9], &[0.0; 4], 0.5);
        assert_eq!(out.len(), 1);
        let (score, r) = out[0];
        assert_eq!(score, 0.9);
        assert!((r.x - 0.4).abs() < 1e-6 && (r.y - 0.3).abs() < 1e-6);
        assert!((r.width - 0.2).abs() < 1e-6 && (r.height - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_low_scores_are_dropped() {
        let priors = generate_priors(INPUT_W, INPUT_H);
        let scores = vec![0.0; priors.len() * 2];
        let boxes = vec![0.0; priors.len() * 4];
        assert!(decode(&priors, &scores, &boxes, 0.5).is_empty());
    }

    #[test]
    fn test_nms_keeps_best_of_overlapping() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(1.0, 1.0, 10.0, 10.0);
        let c = Rect::new(50.0, 50.0, 10.0, 10.0);
        let kept = non_max_suppression(vec![(0.6, b), (0.9, a), (0.7, c)], NMS_IOU, 5);
        assert_eq!(kept, vec![a, c]);
        let one = non_max_suppression(vec![(0.6, b), (0.9, a), (0.7, c)], NMS_IOU, 1);
        assert_eq!(one, vec![a]);
    }
}
