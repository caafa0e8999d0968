use std::fmt;

/// Affine map `to = slope * from + intercept` between data space and pixel space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LinearTransformation {
    slope: f64,
    intercept: f64,
}

impl LinearTransformation {
    pub fn new(slope: f64, intercept: f64) -> LinearTransformation {
        LinearTransformation { slope, intercept }
    }

    /// The transformation that sends `from1` to `to1` and `from2` to `to2`.
    pub fn from_points(from1: f64, to1: f64, from2: f64, to2: f64) -> LinearTransformation {
        let slope = if from2 == from1 { 0.0 } else { (to2 - to1) / (from2 - from1) };
        LinearTransformation {
            slope,
            intercept: to1 - slope * from1,
        }
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn is_invertible(&self) -> bool {
        self.slope != 0.0 && self.slope.is_finite()
    }

    pub fn transform(&self, from: f64) -> f64 {
        self.slope * from + self.intercept
    }

    pub fn inverse_transform(&self, to: f64) -> Option<f64> {
        if !self.is_invertible() {
            return None;
        }
        Some((to - self.intercept) / self.slope)
    }
}

/// Axis-aligned rectangle in pixels (or cells); `x + width` and `y + height` are exclusive.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Rect {
        Rect { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

impl fmt::Display for LinearTransformation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "y = {} * x + {}", self.slope, self.intercept)
    }
}
