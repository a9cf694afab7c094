//! The raster target a frame or a tile is drawn into.

use tiny_skia::{
    Color, FilterQuality, Paint, Pattern, Pixmap, Rect, SpreadMode, Transform as SkTransform,
};

use crate::core::{bounds::Aabb, transform::Transform, viewport::ViewTransform};
use crate::{MapError, Result};

/// An owned raster surface together with the view transform that maps
/// world coordinates onto it.
///
/// Pixel positions on the surface are projection coordinates shifted by
/// `view_rect.min`, so a frame context can keep the world origin at the
/// screen centre while an offscreen tile context starts at zero.
pub struct RenderContext {
    pub surface: Pixmap,
    pub view: ViewTransform,
}

impl RenderContext {
    /// Creates a context whose view rectangle is centred on the surface.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let surface = Pixmap::new(width, height)
            .ok_or_else(|| MapError::Render(format!("bad surface size {width}x{height}")))?;
        let view = ViewTransform::new(Transform::identity(), Self::centered_rect(width, height));
        Ok(Self { surface, view })
    }

    pub fn from_pixmap(surface: Pixmap, view: ViewTransform) -> Self {
        Self { surface, view }
    }

    pub fn centered_rect(width: u32, height: u32) -> Aabb {
        let half_w = width as f64 * 0.5;
        let half_h = height as f64 * 0.5;
        Aabb::new(-half_w, -half_h, half_w, half_h)
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn clear(&mut self, colour: Color) {
        self.surface.fill(colour);
    }

    /// Maps a world point to surface pixel coordinates.
    pub fn to_pixel(&self, x: f64, y: f64) -> (f32, f32) {
        let (px, py) = self.view.transform().project(x, y);
        let rect = self.view.view_rect();
        ((px - rect.min_x) as f32, (py - rect.min_y) as f32)
    }

    /// The canvas transform that shifts projection coordinates onto the
    /// surface.
    pub fn surface_transform(&self) -> SkTransform {
        let rect = self.view.view_rect();
        SkTransform::from_translate(-rect.min_x as f32, -rect.min_y as f32)
    }

    /// Blits the `(sx, sy, sw, sh)` sub-rectangle of `src` into the
    /// `(dx, dy, dw, dh)` destination rectangle, scaled to fit, under the
    /// given canvas transform.
    #[allow(clippy::too_many_arguments)]
    pub fn blit(
        &mut self,
        src: &Pixmap,
        (sx, sy, sw, sh): (f64, f64, f64, f64),
        (dx, dy, dw, dh): (f64, f64, f64, f64),
        transform: SkTransform,
    ) {
        if sw <= 0.0 || sh <= 0.0 || dw <= 0.0 || dh <= 0.0 {
            return;
        }
        let Some(rect) = Rect::from_xywh(dx as f32, dy as f32, dw as f32, dh as f32) else {
            return;
        };

        let pattern_transform = SkTransform::from_translate(-sx as f32, -sy as f32)
            .post_scale((dw / sw) as f32, (dh / sh) as f32)
            .post_translate(dx as f32, dy as f32);

        let mut paint = Paint {
            anti_alias: false,
            ..Paint::default()
        };
        paint.shader = Pattern::new(
            src.as_ref(),
            SpreadMode::Pad,
            FilterQuality::Bilinear,
            1.0,
            pattern_transform,
        );

        self.surface.fill_rect(rect, &paint, transform, None);
    }

    pub fn into_pixmap(self) -> Pixmap {
        self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, colour: Color) -> Pixmap {
        let mut pixmap = Pixmap::new(width, height).unwrap();
        pixmap.fill(colour);
        pixmap
    }

    #[test]
    fn test_to_pixel_centres_world_origin() {
        let ctx = RenderContext::new(100, 100).unwrap();
        let (px, py) = ctx.to_pixel(0.0, 0.0);
        assert_eq!((px, py), (50.0, 50.0));
    }

    #[test]
    fn test_blit_fills_destination() {
        let mut ctx = RenderContext::new(16, 16).unwrap();
        let red = solid(8, 8, Color::from_rgba8(255, 0, 0, 255));

        ctx.blit(
            &red,
            (0.0, 0.0, 8.0, 8.0),
            (4.0, 4.0, 8.0, 8.0),
            SkTransform::identity(),
        );

        let inside = ctx.surface.pixel(8, 8).unwrap();
        assert_eq!(inside.red(), 255);
        let outside = ctx.surface.pixel(1, 1).unwrap();
        assert_eq!(outside.alpha(), 0);
    }

    #[test]
    fn test_blit_scales_sub_rectangle() {
        // Source: left half green, right half blue.
        let mut src = Pixmap::new(8, 8).unwrap();
        {
            let mut left = RenderContext::from_pixmap(src, ViewTransform::default());
            left.blit(
                &solid(4, 8, Color::from_rgba8(0, 255, 0, 255)),
                (0.0, 0.0, 4.0, 8.0),
                (0.0, 0.0, 4.0, 8.0),
                SkTransform::identity(),
            );
            left.blit(
                &solid(4, 8, Color::from_rgba8(0, 0, 255, 255)),
                (0.0, 0.0, 4.0, 8.0),
                (4.0, 0.0, 4.0, 8.0),
                SkTransform::identity(),
            );
            src = left.into_pixmap();
        }

        // Blit only the right (blue) half, doubled in size.
        let mut ctx = RenderContext::new(8, 8).unwrap();
        ctx.blit(
            &src,
            (4.0, 0.0, 4.0, 8.0),
            (0.0, 0.0, 8.0, 8.0),
            SkTransform::identity(),
        );

        let sampled = ctx.surface.pixel(4, 4).unwrap();
        assert!(sampled.blue() > 200, "expected blue, got {sampled:?}");
        assert!(sampled.green() < 60);
    }
}
