//! The affine similarity transform between world and view space.

/// An immutable translate+scale+rotate transform from normalized world
/// coordinates to pixel coordinates.
///
/// `(x, y)` is the world-space origin of the view, `scale` the number of
/// pixels per world unit and `rotation` the view rotation in radians. The
/// trigonometric terms and the inverse scale are derived once at
/// construction; a changed view is expressed by constructing a new value,
/// never by mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    pub rotation: f64,
    sin: f64,
    cos: f64,
    inv_scale: f64,
}

impl Transform {
    /// Creates a transform. `scale` must be positive.
    pub fn new(x: f64, y: f64, scale: f64, rotation: f64) -> Self {
        debug_assert!(scale > 0.0, "transform scale must be positive");
        Self {
            x,
            y,
            scale,
            rotation,
            sin: rotation.sin(),
            cos: rotation.cos(),
            inv_scale: 1.0 / scale,
        }
    }

    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 1.0, 0.0)
    }

    pub fn sin(&self) -> f64 {
        self.sin
    }

    pub fn cos(&self) -> f64 {
        self.cos
    }

    pub fn inv_scale(&self) -> f64 {
        self.inv_scale
    }

    /// Projects a world point to pixel space: the world-relative offset is
    /// scaled, then rotated.
    pub fn project(&self, x: f64, y: f64) -> (f64, f64) {
        let flat_x = (x - self.x) * self.scale;
        let flat_y = (y - self.y) * self.scale;

        (
            self.cos * flat_x - self.sin * flat_y,
            self.sin * flat_x + self.cos * flat_y,
        )
    }

    /// Exact inverse of [`project`](Self::project).
    pub fn unproject(&self, x: f64, y: f64) -> (f64, f64) {
        let flat_x = self.cos * x + self.sin * y;
        let flat_y = self.cos * y - self.sin * x;

        (
            self.x + flat_x * self.inv_scale,
            self.y + flat_y * self.inv_scale,
        )
    }

    /// The quadtree level whose tiles of `size` pixels best match the
    /// current scale. The 1.2 factor biases towards the next-finer level so
    /// the selection does not flicker right at a level boundary.
    pub fn level_for_size(&self, size: u32) -> u8 {
        let level = (self.scale * 1.2 / size as f64).log2().floor();
        if level < 0.0 {
            0
        } else {
            level as u8
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
