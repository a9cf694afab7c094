//! The tiled ground layer: polygons, polylines and runway centrelines.

use tiny_skia::{FillRule, Paint, PathBuilder, Stroke, StrokeDash, Transform as SkTransform};

use crate::render::context::RenderContext;
use crate::render::style::StyleContext;
use crate::section::{Section, SectionProvider, Shape};
use crate::tiles::{TileAddress, TileEngine, TileEngineOptions};
use crate::Result;

/// Builds the tile engine that rasterizes ground geometry.
pub fn ground_layer<P: SectionProvider>(provider: P) -> TileEngine<P> {
    let options = TileEngineOptions {
        name: "ground".to_string(),
        ..Default::default()
    };
    TileEngine::new(provider, options, paint_ground)
}

fn paint_ground(
    ctx: &mut RenderContext,
    section: &Section,
    style: &StyleContext,
    _addr: TileAddress,
) -> Result<()> {
    let world_bounds = *ctx.view.world_bounds();

    for shape in &section.shapes {
        if !shape.map_aabb.intersects(&world_bounds) {
            continue;
        }
        draw_shape(ctx, shape, style);
    }

    if style.show_layer("RUNWAYS") {
        draw_runway_centrelines(ctx, section, style);
    }

    Ok(())
}

fn shape_path(ctx: &RenderContext, points: &[[f64; 2]]) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    let mut started = false;
    for point in points {
        let (px, py) = ctx.to_pixel(point[0], point[1]);
        if started {
            builder.line_to(px, py);
        } else {
            builder.move_to(px, py);
            started = true;
        }
    }
    builder.finish()
}

fn draw_shape(ctx: &mut RenderContext, shape: &Shape, style: &StyleContext) {
    if shape.map_points.len() < 2 {
        return;
    }
    let Some(path) = shape_path(ctx, &shape.map_points) else {
        return;
    };

    let mut paint = Paint {
        anti_alias: true,
        ..Paint::default()
    };

    if let Some(colour) = shape.fill_colour.as_ref().and_then(|c| style.resolve(c)) {
        paint.set_color(colour);
        ctx.surface.fill_path(
            &path,
            &paint,
            FillRule::Winding,
            SkTransform::identity(),
            None,
        );
    }

    if let Some(colour) = shape.stroke_colour.as_ref().and_then(|c| style.resolve(c)) {
        if shape.stroke_width > 0.0 {
            paint.set_color(colour);
            let stroke = Stroke {
                width: shape.stroke_width as f32,
                ..Default::default()
            };
            ctx.surface
                .stroke_path(&path, &paint, &stroke, SkTransform::identity(), None);
        }
    }
}

fn draw_runway_centrelines(ctx: &mut RenderContext, section: &Section, style: &StyleContext) {
    let Some(colour) = style.colour("RUNWAYCENTER") else {
        return;
    };

    let mut paint = Paint {
        anti_alias: true,
        ..Paint::default()
    };
    paint.set_color(colour);

    let stroke = Stroke {
        width: 1.0,
        dash: StrokeDash::new(vec![10.0, 10.0], 0.0),
        ..Default::default()
    };

    for runway in &section.runways {
        let Some(path) = shape_path(ctx, &runway.points) else {
            continue;
        };
        ctx.surface
            .stroke_path(&path, &paint, &stroke, SkTransform::identity(), None);
    }
}
