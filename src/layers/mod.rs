//! Drawable layers composed by the map renderer each frame.

pub mod ground;
pub mod labels;
pub mod pilots;

use crate::render::context::RenderContext;
use crate::render::style::StyleContext;
use crate::section::SectionProvider;
use crate::tiles::TileEngine;
use crate::Result;

pub use ground::ground_layer;
pub use labels::labels_layer;
pub use pilots::{Pilot, PilotSnapshot, PilotsLayer};

/// One slice of frame content, drawn back to front in registration order.
pub trait Layer {
    fn name(&self) -> &str;

    fn draw(&mut self, ctx: &mut RenderContext, style: &StyleContext) -> Result<()>;
}

/// Every tile engine is a layer; non-tiled content implements the trait
/// directly.
impl<P: SectionProvider + 'static> Layer for TileEngine<P> {
    fn name(&self) -> &str {
        TileEngine::name(self)
    }

    fn draw(&mut self, ctx: &mut RenderContext, style: &StyleContext) -> Result<()> {
        TileEngine::draw(self, ctx, style)
    }
}
