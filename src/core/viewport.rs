//! View-space bookkeeping derived from the current transform.

use crate::core::{bounds::Aabb, transform::Transform};

/// Owns the current [`Transform`] and the pixel-space view rectangle, and
/// derives the rotated pixel bounds and the world-space bounds whenever
/// either input is replaced.
///
/// Invariant: `world_bounds` encloses every world point visible within
/// `view_rect` under the current rotation. Both inputs are treated as
/// immutable value objects so bounds derivation stays a pure function of
/// the current inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    transform: Transform,
    view_rect: Aabb,
    view_bounds: Aabb,
    world_bounds: Aabb,
}

impl ViewTransform {
    pub fn new(transform: Transform, view_rect: Aabb) -> Self {
        let mut view = Self {
            transform,
            view_rect,
            view_bounds: Aabb::default(),
            world_bounds: Aabb::default(),
        };
        view.update_bounds();
        view
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn view_rect(&self) -> &Aabb {
        &self.view_rect
    }

    /// Pixel-space AABB of the rotated view rectangle.
    pub fn view_bounds(&self) -> &Aabb {
        &self.view_bounds
    }

    /// World-space AABB enclosing everything visible in the view rectangle.
    pub fn world_bounds(&self) -> &Aabb {
        &self.world_bounds
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.update_bounds();
    }

    pub fn set_view_rect(&mut self, view_rect: Aabb) {
        self.view_rect = view_rect;
        self.update_bounds();
    }

    pub fn set(&mut self, transform: Transform, view_rect: Aabb) {
        self.transform = transform;
        self.view_rect = view_rect;
        self.update_bounds();
    }

    pub fn level_for_size(&self, size: u32) -> u8 {
        self.transform.level_for_size(size)
    }

    fn update_bounds(&mut self) {
        self.view_bounds = self
            .view_rect
            .rotated(self.transform.sin(), self.transform.cos());

        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for (px, py) in self.view_bounds.corners() {
            let (wx, wy) = self.transform.unproject(px, py);
            min_x = min_x.min(wx);
            min_y = min_y.min(wy);
            max_x = max_x.max(wx);
            max_y = max_y.max(wy);
        }

        self.world_bounds = Aabb::new(min_x, min_y, max_x, max_y);
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::new(Transform::identity(), Aabb::default())
    }
}
