use rusttype::{point, Font, Scale};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::render::Canvas;

pub struct FontRenderer {
    font: Font<'static>,
}

impl FontRenderer {
    /// Look for `<family>.ttf` in the common macOS/Linux font folders and the
    /// working directory.
    pub fn try_load(family: &str) -> Option<Self> {
        let paths = [
            format!("/Library/Fonts/{}.ttf", family),
            format!("/System/Library/Fonts/{}.ttf", family),
            format!("/System/Library/Fonts/Supplemental/{}.ttf", family),
            format!("/usr/share/fonts/truetype/{}.ttf", family),
            format!("/usr/share/fonts/truetype/dejavu/{}.ttf", family),
            format!("/usr/share/fonts/TTF/{}.ttf", family),
            format!("{}.ttf", family),
        ];

        for p in paths.iter().filter(|p| Path::new(p).exists()) {
            if let Some(font) = fs::read(p).ok().and_then(Font::try_from_vec) {
                info!("Loaded font from {}", p);
                return Some(Self { font });
            }
        }

        warn!("Could not find font family '{}'. Falling back to bitmap.", family);
        None
    }

    pub fn draw_text(&self, canvas: &mut Canvas, x: i64, y: i64, text: &str, color: (u8, u8, u8), size_pt: f32) {
        let scale = Scale::uniform(size_pt);
        let v_metrics = self.font.v_metrics(scale);
        let start = point(x as f32, y as f32 + v_metrics.ascent);

        for glyph in self.font.layout(text, scale, start) {
            if let Some(bb) = glyph.pixel_bounding_box() {
                glyph.draw(|gx, gy, v| {
                    // Hard threshold, no blending
                    if v > 0.2 {
                        canvas.put_pixel(bb.min.x as i64 + gx as i64, bb.min.y as i64 + gy as i64, color);
                    }
                });
            }
        }
    }
}
