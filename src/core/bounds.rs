use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in either pixel or world coordinates.
///
/// Serialized as a flat `[min_x, min_y, max_x, max_y]` array to match the
/// section payload wire format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Aabb {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Aabb {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Creates a rect from an origin and a size.
    pub fn from_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }

    /// Returns a copy with min/max swapped where necessary so that
    /// `min <= max` holds on both axes.
    pub fn normalized(mut self) -> Self {
        if self.max_x < self.min_x {
            std::mem::swap(&mut self.min_x, &mut self.max_x);
        }
        if self.max_y < self.min_y {
            std::mem::swap(&mut self.min_y, &mut self.max_y);
        }
        self
    }

    /// Separating-axis intersection test for axis-aligned boxes: true iff the
    /// center-to-center distance on each axis is strictly less than the
    /// half-sum of extents on that axis. Both inputs are normalized first.
    pub fn intersects(&self, other: &Aabb) -> bool {
        let a = self.normalized();
        let b = other.normalized();

        let (acx, acy) = a.center();
        let (bcx, bcy) = b.center();

        let dist_x = (acx - bcx).abs();
        let dist_y = (acy - bcy).abs();
        let width = 0.5 * (a.width() + b.width());
        let height = 0.5 * (a.height() + b.height());

        dist_x < width && dist_y < height
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.min_x <= x && x <= self.max_x && self.min_y <= y && y <= self.max_y
    }

    /// Returns a new box grown by `margin` on every side.
    pub fn expanded(&self, margin: f64) -> Self {
        Self::new(
            self.min_x - margin,
            self.min_y - margin,
            self.max_x + margin,
            self.max_y + margin,
        )
    }

    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.min_x, self.min_y),
            (self.max_x, self.min_y),
            (self.min_x, self.max_y),
            (self.max_x, self.max_y),
        ]
    }

    /// Bounding box of this rect after rotating its corners by the angle
    /// described by `(sin, cos)`.
    pub fn rotated(&self, sin: f64, cos: f64) -> Self {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for (x, y) in self.corners() {
            let rx = cos * x - sin * y;
            let ry = sin * x + cos * y;
            min_x = min_x.min(rx);
            min_y = min_y.min(ry);
            max_x = max_x.max(rx);
            max_y = max_y.max(ry);
        }

        Self::new(min_x, min_y, max_x, max_y)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

impl From<[f64; 4]> for Aabb {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Aabb> for [f64; 4] {
    fn from(b: Aabb) -> Self {
        [b.min_x, b.min_y, b.max_x, b.max_y]
    }
}
