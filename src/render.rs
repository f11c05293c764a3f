//! Drawing the landmark mesh and the gaze label into an RGB8 frame buffer.

use crate::config::{parse_hex, UiConfig};
use crate::font;
use crate::landmarks::{contours, FaceLandmarks};
use crate::pipeline::FrameAnalysis;
use crate::ttf::FontRenderer;

/// Mutable view over a packed RGB8 buffer. All drawing is clipped.
pub struct Canvas<'a> {
    buf: &'a mut [u8],
    width: usize,
    height: usize,
}

impl<'a> Canvas<'a> {
    pub fn new(buf: &'a mut [u8], width: usize, height: usize) -> Self {
        Self { buf, width, height }
    }

    pub fn put_pixel(&mut self, x: i64, y: i64, color: (u8, u8, u8)) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 3;
        if let Some(px) = self.buf.get_mut(idx..idx + 3) {
            px[0] = color.0;
            px[1] = color.1;
            px[2] = color.2;
        }
    }

    pub fn fill_rect(&mut self, x: i64, y: i64, w: usize, h: usize, color: (u8, u8, u8)) {
        for dy in 0..h as i64 {
            for dx in 0..w as i64 {
                self.put_pixel(x + dx, y + dy, color);
            }
        }
    }

    /// Bresenham line, both endpoints included.
    pub fn draw_line(&mut self, from: (i64, i64), to: (i64, i64), color: (u8, u8, u8)) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let sx = if x < to.0 { 1 } else { -1 };
        let sy = if y < to.1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put_pixel(x, y, color);
            if x == to.0 && y == to.1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
}

/// Contour edges plus one square dot per landmark, centered on the point.
/// Edges whose endpoints are missing (an unrefined mesh has no iris) are
/// skipped.
pub fn draw_landmarks(canvas: &mut Canvas, face: &FaceLandmarks, color: (u8, u8, u8), dot_size: usize) {
    let (w, h) = (canvas.width as f32, canvas.height as f32);
    let to_canvas = |i: usize| {
        face.points.get(i).map(|p| {
            let px = p.to_pixels(w, h);
            (px.x as i64, px.y as i64)
        })
    };

    for &(a, b) in contours::ALL.iter().flat_map(|g| g.iter()) {
        if let (Some(from), Some(to)) = (to_canvas(a), to_canvas(b)) {
            canvas.draw_line(from, to, color);
        }
    }

    let half = (dot_size / 2) as i64;
    for i in 0..face.points.len() {
        if let Some((x, y)) = to_canvas(i) {
            canvas.fill_rect(x - half, y - half, dot_size, dot_size, color);
        }
    }
}

pub enum TextPainter {
    TrueType { font: FontRenderer, size_pt: f32 },
    Bitmap { scale: usize },
}

impl TextPainter {
    pub fn from_config(ui: &UiConfig) -> Self {
        match FontRenderer::try_load(&ui.font_family) {
            Some(font) => TextPainter::TrueType {
                font,
                size_pt: ui.font_size_pt as f32,
            },
            None => TextPainter::Bitmap {
                scale: ui.bitmap_scale.max(1),
            },
        }
    }

    pub fn draw(&self, canvas: &mut Canvas, x: i64, y: i64, text: &str, color: (u8, u8, u8)) {
        match self {
            TextPainter::TrueType { font, size_pt } => font.draw_text(canvas, x, y, text, color, *size_pt),
            TextPainter::Bitmap { scale } => font::draw_text_line(canvas, x, y, text, color, *scale),
        }
    }
}

/// Everything drawn on top of a frame.
pub struct Overlay {
    painter: TextPainter,
    show_mesh: bool,
    mesh_color: (u8, u8, u8),
    dot_size: usize,
    label_color: (u8, u8, u8),
    label_pos: (i64, i64),
}

impl Overlay {
    pub fn new(ui: &UiConfig, painter: TextPainter) -> Self {
        Self {
            painter,
            show_mesh: ui.show_mesh,
            mesh_color: parse_hex(&ui.mesh_color_hex),
            dot_size: ui.mesh_dot_size.max(1),
            label_color: parse_hex(&ui.label_color_hex),
            label_pos: (ui.label_x as i64, ui.label_y as i64),
        }
    }

    pub fn from_config(ui: &UiConfig) -> Self {
        Self::new(ui, TextPainter::from_config(ui))
    }

    pub fn draw(&self, buf: &mut [u8], width: usize, height: usize, analysis: &FrameAnalysis) {
        let mut canvas = Canvas::new(buf, width, height);
        if self.show_mesh {
            draw_landmarks(&mut canvas, &analysis.face, self.mesh_color, self.dot_size);
        }
        let label = analysis.reading.to_string();
        self.painter
            .draw(&mut canvas, self.label_pos.0, self.label_pos.1, &label, self.label_color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::GazeReading;
    use crate::types::Point2D;

    const RED: (u8, u8, u8) = (255, 0, 0);

    fn lit(buf: &[u8]) -> Vec<usize> {
        buf.chunks(3)
            .enumerate()
            .filter(|(_, px)| px.iter().any(|&v| v != 0))
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_put_pixel_clips() {
        let mut buf = vec![0u8; 4 * 4 * 3];
        let mut c = Canvas::new(&mut buf, 4, 4);
        c.put_pixel(-1, 0, RED);
        c.put_pixel(4, 0, RED);
        c.put_pixel(0, 4, RED);
        c.fill_rect(3, 3, 5, 5, RED);
        assert_eq!(lit(&buf), vec![15]);
    }

    #[test]
    fn test_landmark_dots_land_on_points() {
        let mut buf = vec![0u8; 10 * 10 * 3];
        let face = FaceLandmarks::new(vec![Point2D::new(0.5, 0.2), Point2D::new(2.0, 2.0)]);
        draw_landmarks(&mut Canvas::new(&mut buf, 10, 10), &face, (0, 255, 0), 1);
        assert_eq!(lit(&buf), vec![2 * 10 + 5]);
    }

    #[test]
    fn test_draw_line_covers_both_ends() {
        let mut buf = vec![0u8; 10 * 10 * 3];
        let mut c = Canvas::new(&mut buf, 10, 10);
        c.draw_line((1, 1), (7, 4), RED);
        c.draw_line((8, 9), (8, 20), RED);
        let pixels = lit(&buf);
        assert!(pixels.contains(&(10 + 1)));
        assert!(pixels.contains(&(4 * 10 + 7)));
        assert!(pixels.contains(&(9 * 10 + 8)));
        // One pixel per column along the shallow line, plus the clipped vertical stub
        assert_eq!(pixels.len(), 7 + 1);
    }

    #[test]
    fn test_contour_edges_connect_landmarks() {
        let (w, h) = (100usize, 100usize);
        let mut points = vec![Point2D::new(-1.0, -1.0); crate::landmarks::REFINED_POINTS];
        // Iris ring 469..=472 as a 50 px square
        points[469] = Point2D::new(0.25, 0.25);
        points[470] = Point2D::new(0.75, 0.25);
        points[471] = Point2D::new(0.75, 0.75);
        points[472] = Point2D::new(0.25, 0.75);
        let mut buf = vec![0u8; w * h * 3];
        draw_landmarks(&mut Canvas::new(&mut buf, w, h), &FaceLandmarks::new(points), (0, 255, 0), 1);

        let pixels = lit(&buf);
        // Midpoints of all four sides are on the outline, the center is not
        for (x, y) in [(50, 25), (75, 50), (50, 75), (25, 50)] {
            assert!(pixels.contains(&(y * w + x)), "missing ({}, {})", x, y);
        }
        assert!(!pixels.contains(&(50 * w + 50)));
    }

    #[test]
    fn test_unrefined_face_skips_iris_edges() {
        let mut buf = vec![0u8; 10 * 10 * 3];
        let face = FaceLandmarks::new(vec![Point2D::new(0.5, 0.5); crate::landmarks::MESH_POINTS]);
        draw_landmarks(&mut Canvas::new(&mut buf, 10, 10), &face, (0, 255, 0), 1);
        assert_eq!(lit(&buf), vec![5 * 10 + 5]);
    }

    #[test]
    fn test_label_drawn_top_left() {
        let (w, h) = (320usize, 240usize);
        let mut buf = vec![0u8; w * h * 3];
        let ui = UiConfig {
            show_mesh: false,
            ..UiConfig::default()
        };
        let overlay = Overlay::new(&ui, TextPainter::Bitmap { scale: 2 });
        let analysis = FrameAnalysis {
            face: FaceLandmarks::default(),
            reading: GazeReading::Indeterminate,
        };
        overlay.draw(&mut buf, w, h, &analysis);

        let pixels = lit(&buf);
        assert!(!pixels.is_empty());
        for i in pixels {
            let (x, y) = (i % w, i / w);
            assert!(x >= 30 && y >= 30 && y < 30 + 10, "pixel at ({}, {})", x, y);
            assert_eq!(&buf[i * 3..i * 3 + 3], &[255, 0, 0]);
        }
    }
}
