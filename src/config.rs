use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::direction::Thresholds;

pub const DEFAULT_PATH: &str = "gaze_config.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub camera: CameraConfig,
    pub detector: DetectorConfig,
    pub thresholds: Thresholds,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub index: u32,
    pub mirror: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            mirror: false,
        }
    }
}

/// Settings for the face detector and landmark model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// UltraFace box detector (320x240 input).
    pub detection_model: String,
    /// Face-mesh landmark model with iris refinement (192x192 input).
    pub landmark_model: String,
    pub max_faces: usize,
    /// Keep the 10 iris points. Gaze ratios need them.
    pub refine_landmarks: bool,
    pub min_detection_confidence: f32,
    /// Below this face-presence score the tracked ROI is dropped and the
    /// next frame runs box detection again.
    pub min_tracking_confidence: f32,
    pub intra_threads: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            detection_model: "models/face_detection.onnx".to_string(),
            landmark_model: "models/face_landmarks.onnx".to_string(),
            max_faces: 1,
            refine_landmarks: true,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
            intra_threads: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub window_title: String,
    pub show_mesh: bool,
    pub mesh_color_hex: String,
    pub mesh_dot_size: usize,
    pub label_color_hex: String,
    pub label_x: usize,
    pub label_y: usize,
    /// TrueType family looked up in the usual system font folders.
    pub font_family: String,
    pub font_size_pt: u32,
    /// Pixel scale of the bitmap fallback font.
    pub bitmap_scale: usize,
    /// Colour the per-frame console label.
    pub color_console: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_title: "Eye Gaze Tracker".to_string(),
            show_mesh: true,
            mesh_color_hex: "#00FF00".to_string(),
            mesh_dot_size: 1,
            label_color_hex: "#FF0000".to_string(),
            label_x: 30,
            label_y: 30,
            font_family: "DejaVuSans".to_string(),
            font_size_pt: 28,
            bitmap_scale: 4,
            color_console: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigOrigin {
    File,
    Missing,
    /// The file exists but did not parse; defaults were used instead.
    Unparsable(String),
}

impl ConfigOrigin {
    /// Log how the configuration at `path` was obtained. Call after
    /// `init_logging`, which itself needs the loaded configuration.
    pub fn report(&self, path: &Path) {
        match self {
            ConfigOrigin::File => info!("Loaded configuration from {}", path.display()),
            ConfigOrigin::Missing => {
                info!("Configuration file {} not found. Using defaults.", path.display())
            }
            ConfigOrigin::Unparsable(e) => {
                warn!("Error parsing config {}: {}. Loading defaults.", path.display(), e)
            }
        }
    }
}

impl AppConfig {
    /// Load from `path`. A missing or unparsable file gives defaults, and the
    /// returned origin says which happened. Invalid thresholds are an error.
    pub fn load(path: &Path) -> Result<(Self, ConfigOrigin)> {
        let (config, origin) = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            match Self::from_json(&content) {
                Ok(config) => (config, ConfigOrigin::File),
                Err(e) => (Self::default(), ConfigOrigin::Unparsable(e.to_string())),
            }
        } else {
            (Self::default(), ConfigOrigin::Missing)
        };

        config
            .thresholds
            .validate()
            .with_context(|| format!("Invalid thresholds in {}", path.display()))?;
        Ok((config, origin))
    }

    /// Missing fields fall back to their defaults.
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(())
    }
}

/// Parse `#RRGGBB`. Anything else falls back to red.
pub fn parse_hex(hex: &str) -> (u8, u8, u8) {
    if hex.len() == 7 && hex.starts_with('#') {
        let r = u8::from_str_radix(&hex[1..3], 16).unwrap_or(255);
        let g = u8::from_str_radix(&hex[3..5], 16).unwrap_or(0);
        let b = u8::from_str_radix(&hex[5..7], 16).unwrap_or(0);
        (r, g, b)
    } else {
        (255, 0, 0)
    }
}
