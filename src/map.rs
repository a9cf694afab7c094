//! The per-frame driver: owns the layer stack, the style and the current
//! view, and produces one finished bitmap per render call.

use tiny_skia::Pixmap;

use crate::core::transform::Transform;
use crate::layers::Layer;
use crate::render::context::RenderContext;
use crate::render::style::{StyleConfig, StyleContext};
use crate::Result;

/// Where the camera looks. `zoom` is logarithmic: each whole step doubles
/// the scale, with zoom 0 fitting the whole map into the short screen
/// axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewUpdate {
    /// World-space center.
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
    /// Radians, counter-clockwise.
    pub rotation: f64,
}

impl ViewUpdate {
    pub fn new(x: f64, y: f64, zoom: f64, rotation: f64) -> Self {
        Self {
            x,
            y,
            zoom,
            rotation,
        }
    }

    /// Centers on a geographic position.
    pub fn look_at(latitude: f64, longitude: f64, zoom: f64, rotation: f64) -> Self {
        let (x, y) = crate::core::coords::geo2map(latitude, longitude);
        Self::new(x, y, zoom, rotation)
    }
}

impl Default for ViewUpdate {
    fn default() -> Self {
        Self::new(0.5, 0.5, 0.0, 0.0)
    }
}

/// Composes registered layers into frames.
///
/// Layers draw back to front in registration order. A failing layer is
/// logged and skipped for the frame; one broken feed must not blank the
/// whole display.
pub struct MapRenderer {
    layers: Vec<Box<dyn Layer>>,
    style: StyleContext,
    view: ViewUpdate,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self::with_style(StyleContext::default())
    }

    pub fn with_style(style: StyleContext) -> Self {
        Self {
            layers: Vec::new(),
            style,
            view: ViewUpdate::default(),
        }
    }

    pub fn add_layer(&mut self, layer: Box<dyn Layer>) {
        self.layers.push(layer);
    }

    pub fn set_view(&mut self, view: ViewUpdate) {
        self.view = view;
    }

    pub fn view(&self) -> ViewUpdate {
        self.view
    }

    pub fn style(&self) -> &StyleContext {
        &self.style
    }

    /// Applies a new style configuration; cached tiles of the previous
    /// epoch keep serving until their replacements are rendered.
    pub fn set_style_config(&mut self, config: StyleConfig) {
        self.style.set_config(config);
    }

    /// The pixel scale for the current zoom on a surface of this size.
    fn scale_for(&self, width: u32, height: u32) -> f64 {
        2f64.powf(self.view.zoom) * width.min(height).max(1) as f64
    }

    /// Renders one frame at the given surface size.
    pub fn render(&mut self, width: u32, height: u32) -> Result<Pixmap> {
        let mut ctx = RenderContext::new(width, height)?;
        self.render_into(&mut ctx);
        Ok(ctx.into_pixmap())
    }

    /// Renders one frame into an existing context, replacing its view with
    /// the current camera.
    pub fn render_into(&mut self, ctx: &mut RenderContext) {
        let scale = self.scale_for(ctx.width(), ctx.height());
        let transform = Transform::new(self.view.x, self.view.y, scale, self.view.rotation);
        ctx.view.set_transform(transform);

        if let Some(background) = self.style.colour("BACKGROUND") {
            ctx.clear(background);
        } else {
            ctx.clear(tiny_skia::Color::TRANSPARENT);
        }

        for layer in &mut self.layers {
            if let Err(err) = layer.draw(ctx, &self.style) {
                log::error!("layer {} failed this frame: {err}", layer.name());
            }
        }
    }
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new()
    }
}
