use serde::{Deserialize, Serialize};

/// Axis-aligned detection rectangle in pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> i64 {
        if self.is_empty() {
            return 0;
        }
        self.width as i64 * self.height as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Overlapping area, or an empty rect when the two do not touch.
    pub fn intersection(&self, other: &Rect) -> Rect {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        if x2 <= x1 || y2 <= y1 {
            return Rect::default();
        }
        Rect::new(x1, y1, x2 - x1, y2 - y1)
    }

    pub fn iou(&self, other: &Rect) -> f64 {
        let inter = self.intersection(other).area() as f64;
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() as f64 + other.area() as f64 - inter)
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Scales width and height by `coeff`, keeping the center fixed.
    pub fn inflate_about_center(&self, coeff: f64) -> Rect {
        let (cx, cy) = self.center();
        let w = (self.width as f64 * coeff).round();
        let h = (self.height as f64 * coeff).round();
        Rect::new(
            (cx - w / 2.0).round() as i32,
            (cy - h / 2.0).round() as i32,
            w as i32,
            h as i32,
        )
    }

    /// Clips the rect to `[0, frame_w) x [0, frame_h)`.
    pub fn clamp_to(&self, frame_w: u32, frame_h: u32) -> Rect {
        self.intersection(&Rect::new(0, 0, frame_w as i32, frame_h as i32))
    }
}
