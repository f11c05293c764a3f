/// A 2D point. Landmarks carry normalized coordinates, everything derived
/// from them (iris centers, corners) is in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Scale a normalized point into pixel space.
    pub fn to_pixels(self, width: f32, height: f32) -> Self {
        Self {
            x: self.x * width,
            y: self.y * height,
        }
    }

    /// Arithmetic mean of a set of points. Returns the origin for an empty set.
    pub fn mean(points: &[Point2D]) -> Self {
        if points.is_empty() {
            return Self::default();
        }
        let n = points.len() as f32;
        let (sx, sy) = points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Self { x: sx / n, y: sy / n }
    }
}

/// Axis-aligned box in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Intersection over union, 0.0 for disjoint or empty boxes.
    pub fn iou(&self, other: &Rect) -> f32 {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = (self.x + self.width).min(other.x + other.width);
        let y1 = (self.y + self.height).min(other.y + other.height);
        let inter = (x1 - x0).max(0.0) * (y1 - y0).max(0.0);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }

    /// Grow to a square around the same center, scaled by `factor`.
    pub fn square_around_center(&self, factor: f32) -> Rect {
        let side = self.width.max(self.height) * factor;
        let c = self.center();
        Rect::new(c.x - side / 2.0, c.y - side / 2.0, side, side)
    }

    /// Clip to `[0, width) x [0, height)`. May return an empty rect.
    pub fn clamp_to(&self, width: u32, height: u32) -> Rect {
        let x0 = self.x.max(0.0);
        let y0 = self.y.max(0.0);
        let x1 = (self.x + self.width).min(width as f32);
        let y1 = (self.y + self.height).min(height as f32);
        Rect::new(x0, y0, (x1 - x0).max(0.0), (y1 - y0).max(0.0))
    }
}
