//! The tiled text layer: airport labels, fix names and runway identifiers.

use ab_glyph::FontArc;

use crate::render::context::RenderContext;
use crate::render::style::StyleContext;
use crate::render::text::draw_text;
use crate::section::{Section, SectionProvider};
use crate::tiles::{TileAddress, TileEngine, TileEngineOptions};
use crate::Result;

/// Global shrink applied to every label so text stays subordinate to the
/// geometry underneath it.
pub const TEXT_SCALE: f64 = 0.6;

/// Labels smaller than this render as unreadable smudges; skip them and
/// let a deeper level draw them larger.
pub const MIN_FONT_PX: f64 = 8.0;

/// Labels whose anchor sits this far outside the tile may still spill ink
/// into it, so culling keeps them.
const CULL_MARGIN: f64 = 100.0;

/// Fix names and runway identifiers use a fixed base size; only airport
/// labels carry their own.
const POINT_FONT_SIZE: f64 = 10.0;

/// Runway identifiers only make sense once individual runways are
/// distinguishable on screen.
const RUNWAY_ID_MIN_LEVEL: u8 = 8;

/// Builds the tile engine that rasterizes text. Without a font the layer
/// draws nothing but still participates in caching.
pub fn labels_layer<P: SectionProvider>(provider: P, font: Option<FontArc>) -> TileEngine<P> {
    let options = TileEngineOptions {
        name: "labels".to_string(),
        ..Default::default()
    };
    TileEngine::new(provider, options, move |ctx, section, style, addr| {
        if let Some(font) = font.as_ref() {
            paint_labels(ctx, section, style, addr, font)?;
        }
        Ok(())
    })
}

/// Text grows as the view zooms in, slower than the geometry does.
fn level_font_size(base: f64, level: u8) -> f64 {
    base * TEXT_SCALE * 1.1f64.powi(level as i32)
}

fn paint_labels(
    ctx: &mut RenderContext,
    section: &Section,
    style: &StyleContext,
    addr: TileAddress,
    font: &FontArc,
) -> Result<()> {
    let clip = ctx.view.view_rect().expanded(CULL_MARGIN);

    if style.show_layer("AIRPORTLABEL") {
        if let Some(colour) = style.colour("AIRPORTLABEL") {
            for label in &section.labels {
                let size = level_font_size(label.font_size, addr.level);
                if size < MIN_FONT_PX {
                    continue;
                }
                let (px, py) = ctx.to_pixel(label.map_position[0], label.map_position[1]);
                if !clip.contains(px as f64, py as f64) {
                    continue;
                }
                draw_text(
                    &mut ctx.surface,
                    font,
                    &label.text,
                    px,
                    py,
                    size as f32,
                    colour,
                    true,
                );
            }
        }
    }

    if style.show_layer("FIXLABEL") {
        if let Some(colour) = style.colour("FIXLABEL") {
            let size = level_font_size(POINT_FONT_SIZE, addr.level);
            if size >= MIN_FONT_PX {
                for fix in &section.points {
                    let (px, py) = ctx.to_pixel(fix.position[0], fix.position[1]);
                    if !clip.contains(px as f64, py as f64) {
                        continue;
                    }
                    draw_text(
                        &mut ctx.surface,
                        font,
                        &fix.name,
                        px,
                        py,
                        size as f32,
                        colour,
                        true,
                    );
                }
            }
        }
    }

    if addr.level >= RUNWAY_ID_MIN_LEVEL && style.show_layer("RUNWAYS") {
        if let Some(colour) = style.colour("AIRPORTLABEL") {
            let size = level_font_size(POINT_FONT_SIZE, addr.level);
            for runway in &section.runways {
                for (point, id) in [
                    (runway.points[0], runway.primary_id.as_str()),
                    (runway.points[1], runway.opposite_id.as_str()),
                ] {
                    if id.is_empty() {
                        continue;
                    }
                    let (px, py) = ctx.to_pixel(point[0], point[1]);
                    if !clip.contains(px as f64, py as f64) {
                        continue;
                    }
                    draw_text(&mut ctx.surface, font, id, px, py, size as f32, colour, true);
                }
            }
        }
    }

    Ok(())
}
