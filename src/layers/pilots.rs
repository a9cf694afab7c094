//! The live traffic layer, drawn fresh every frame from the latest
//! position snapshot.

use std::sync::{Arc, Mutex};

use ab_glyph::FontArc;
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Stroke, Transform as SkTransform};

use crate::core::coords::{geo2map, DEG2RAD};
use crate::layers::Layer;
use crate::render::context::RenderContext;
use crate::render::style::StyleContext;
use crate::render::text::draw_text;
use crate::Result;

/// Blips near the frame edge may still spill ink into it.
const CULL_MARGIN: f64 = 100.0;

const BLIP_RADIUS: f32 = 3.0;
const BLIP_LENGTH: f32 = 10.0;

/// World units of projected track per knot of ground speed.
const SPEED_VECTOR_SCALE: f64 = 1e-7;

/// The data block appears once one screen covers less than a fifteenth of
/// the world on its short axis.
const DATA_BLOCK_MIN_SCALE: f64 = 15.0;

const DATA_BLOCK_LINE_HEIGHT: f32 = 20.0;
const DATA_BLOCK_FONT_PX: f32 = 16.0;
const DATA_BLOCK_OFFSET: f32 = 5.0;

/// One aircraft position report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pilot {
    pub callsign: String,
    pub latitude: f64,
    pub longitude: f64,
    /// True heading in degrees, clockwise from north.
    pub heading: f64,
    /// Knots.
    pub ground_speed: f64,
    /// Feet.
    pub altitude: f64,
    /// Feet gained or lost since the previous report.
    pub altitude_change: f64,
    pub transponder: String,
    pub transponder_mode: String,
}

/// The positions drawn on the next frame. Feeds arrive on their own task
/// and replace the snapshot wholesale; the renderer only ever reads it.
#[derive(Debug, Clone, Default)]
pub struct PilotSnapshot {
    pub pilots: Vec<Pilot>,
}

/// Draws each aircraft as a heading-aligned blip with its projected speed
/// vector, and a text data block once zoomed in far enough.
pub struct PilotsLayer {
    snapshot: Arc<Mutex<PilotSnapshot>>,
    font: Option<FontArc>,
}

impl PilotsLayer {
    pub fn new(snapshot: Arc<Mutex<PilotSnapshot>>, font: Option<FontArc>) -> Self {
        Self { snapshot, font }
    }

    /// Handle for the feed side to publish new snapshots through.
    pub fn snapshot_handle(&self) -> Arc<Mutex<PilotSnapshot>> {
        self.snapshot.clone()
    }
}

impl Layer for PilotsLayer {
    fn name(&self) -> &str {
        "pilots"
    }

    fn draw(&mut self, ctx: &mut RenderContext, style: &StyleContext) -> Result<()> {
        if !style.show_layer("PILOTS") {
            return Ok(());
        }
        let Some(colour) = style.colour("PILOT") else {
            return Ok(());
        };
        let vector_colour = style.colour("RUNWAYCENTER");

        let snapshot = self
            .snapshot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        let clip = ctx.view.view_rect().expanded(CULL_MARGIN);
        let transform = *ctx.view.transform();
        let view_minor = ctx
            .view
            .view_rect()
            .width()
            .min(ctx.view.view_rect().height())
            .max(1.0);
        let show_data_block = transform.scale / view_minor >= DATA_BLOCK_MIN_SCALE;

        let mut paint = Paint {
            anti_alias: true,
            ..Paint::default()
        };

        for pilot in &snapshot.pilots {
            let (wx, wy) = geo2map(pilot.latitude, pilot.longitude);
            let (px, py) = ctx.to_pixel(wx, wy);
            if !clip.contains(px as f64, py as f64) {
                continue;
            }

            // Screen-space angle: the view rotation turns with the map,
            // the heading with the aircraft.
            let angle = (pilot.heading * DEG2RAD + transform.rotation) as f32;
            let (sin, cos) = angle.sin_cos();
            let rotate = |x: f32, y: f32| (px + cos * x - sin * y, py + sin * x + cos * y);

            if pilot.ground_speed > 0.0 {
                if let Some(vector_colour) = vector_colour {
                    let length =
                        (SPEED_VECTOR_SCALE * pilot.ground_speed * transform.scale) as f32;
                    let tip = rotate(0.0, -length);
                    let mut builder = PathBuilder::new();
                    builder.move_to(px, py);
                    builder.line_to(tip.0, tip.1);
                    if let Some(path) = builder.finish() {
                        paint.set_color(vector_colour);
                        let stroke = Stroke {
                            width: 2.0,
                            ..Default::default()
                        };
                        ctx.surface.stroke_path(
                            &path,
                            &paint,
                            &stroke,
                            SkTransform::identity(),
                            None,
                        );
                    }
                }
            }

            if let Some(path) = blip_path(px, py, rotate) {
                paint.set_color(colour);
                ctx.surface.fill_path(
                    &path,
                    &paint,
                    FillRule::Winding,
                    SkTransform::identity(),
                    None,
                );
            }

            if show_data_block {
                if let Some(font) = self.font.as_ref() {
                    let x = px + DATA_BLOCK_OFFSET;
                    let mut y = py + DATA_BLOCK_OFFSET + DATA_BLOCK_LINE_HEIGHT / 2.0;
                    for line in data_block_lines(pilot) {
                        draw_text(
                            &mut ctx.surface,
                            font,
                            &line,
                            x,
                            y,
                            DATA_BLOCK_FONT_PX,
                            Color::WHITE,
                            false,
                        );
                        y += DATA_BLOCK_LINE_HEIGHT;
                    }
                }
            }
        }

        Ok(())
    }
}

/// A round blip with a heading-aligned tail fin.
fn blip_path(px: f32, py: f32, rotate: impl Fn(f32, f32) -> (f32, f32)) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    builder.push_circle(px, py, BLIP_RADIUS);

    let left = rotate(-BLIP_RADIUS, 0.0);
    let right = rotate(BLIP_RADIUS, 0.0);
    let nose = rotate(0.0, -BLIP_LENGTH);
    builder.move_to(left.0, left.1);
    builder.line_to(right.0, right.1);
    builder.line_to(nose.0, nose.1);
    builder.close();

    builder.finish()
}

/// The text lines of the data block, top to bottom: callsign, ground
/// speed, altitude with climb or descent arrow, transponder.
fn data_block_lines(pilot: &Pilot) -> Vec<String> {
    let mut lines = Vec::new();
    if !pilot.callsign.is_empty() {
        lines.push(pilot.callsign.clone());
    }
    if pilot.ground_speed > 0.0 {
        lines.push(format!("M{:03}", pilot.ground_speed.round() as i64));
    }
    lines.push(altitude_text(pilot));
    if !pilot.transponder.is_empty() {
        lines.push(format!("{}{}", pilot.transponder_mode, pilot.transponder));
    }
    lines
}

/// Altitude in hundreds of feet, with the vertical trend appended once the
/// change exceeds a hundred feet.
fn altitude_text(pilot: &Pilot) -> String {
    let mut text = format!("A{:03}", (pilot.altitude / 100.0).round() as i64);
    if pilot.altitude_change.abs() > 100.0 {
        let symbol = if pilot.altitude_change < 0.0 { '▼' } else { '▲' };
        let delta = (pilot.altitude_change.abs() / 100.0).round() as i64;
        text.push_str(&format!(" {symbol}N{delta:03}"));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transform::Transform;

    fn layer_with(pilots: Vec<Pilot>) -> PilotsLayer {
        PilotsLayer::new(Arc::new(Mutex::new(PilotSnapshot { pilots })), None)
    }

    #[test]
    fn test_pilot_at_view_center_is_drawn() {
        let mut ctx = RenderContext::new(64, 64).unwrap();
        // (0 N, 0 E) maps to world (0.5, 0.5), so look there.
        ctx.view.set_transform(Transform::new(0.5, 0.5, 1024.0, 0.0));

        let mut layer = layer_with(vec![Pilot {
            callsign: "BAW123".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            heading: 90.0,
            ..Default::default()
        }]);

        layer.draw(&mut ctx, &StyleContext::default()).unwrap();
        assert!(ctx.surface.pixels().iter().any(|p| p.alpha() > 0));
    }

    #[test]
    fn test_speed_vector_extends_along_heading() {
        let mut ctx = RenderContext::new(128, 128).unwrap();
        ctx.view
            .set_transform(Transform::new(0.5, 0.5, 10_000_000.0, 0.0));

        // Heading east at 480 kt: the vector reaches 48 px to the right.
        let mut layer = layer_with(vec![Pilot {
            latitude: 0.0,
            longitude: 0.0,
            heading: 90.0,
            ground_speed: 480.0,
            ..Default::default()
        }]);

        layer.draw(&mut ctx, &StyleContext::default()).unwrap();

        // Well past the blip, still on the vector.
        let on_vector = ctx.surface.pixel(64 + 30, 64).unwrap();
        assert!(on_vector.alpha() > 0);
        // Nothing on the opposite side.
        let behind = ctx.surface.pixel(64 - 30, 64).unwrap();
        assert_eq!(behind.alpha(), 0);
    }

    #[test]
    fn test_stationary_pilot_has_no_vector() {
        let mut ctx = RenderContext::new(128, 128).unwrap();
        ctx.view
            .set_transform(Transform::new(0.5, 0.5, 10_000_000.0, 0.0));

        let mut layer = layer_with(vec![Pilot {
            latitude: 0.0,
            longitude: 0.0,
            heading: 90.0,
            ground_speed: 0.0,
            ..Default::default()
        }]);

        layer.draw(&mut ctx, &StyleContext::default()).unwrap();
        let past_blip = ctx.surface.pixel(64 + 30, 64).unwrap();
        assert_eq!(past_blip.alpha(), 0);
    }

    #[test]
    fn test_offscreen_pilot_is_culled() {
        let mut ctx = RenderContext::new(64, 64).unwrap();
        ctx.view.set_transform(Transform::new(0.5, 0.5, 1024.0, 0.0));

        // Half a world away from the view center.
        let mut layer = layer_with(vec![Pilot {
            callsign: "QFA1".to_string(),
            latitude: 0.0,
            longitude: 170.0,
            heading: 0.0,
            ..Default::default()
        }]);

        layer.draw(&mut ctx, &StyleContext::default()).unwrap();
        assert!(ctx.surface.pixels().iter().all(|p| p.alpha() == 0));
    }

    #[test]
    fn test_hidden_layer_draws_nothing() {
        let mut ctx = RenderContext::new(64, 64).unwrap();
        ctx.view.set_transform(Transform::new(0.5, 0.5, 1024.0, 0.0));

        let mut config = crate::render::style::StyleConfig::default();
        config.layers_visible.insert("PILOTS".to_string(), false);
        let style = StyleContext::new(config);

        let mut layer = layer_with(vec![Pilot {
            latitude: 0.0,
            longitude: 0.0,
            ..Default::default()
        }]);

        layer.draw(&mut ctx, &style).unwrap();
        assert!(ctx.surface.pixels().iter().all(|p| p.alpha() == 0));
    }

    #[test]
    fn test_data_block_lines_full_report() {
        let pilot = Pilot {
            callsign: "BAW123".to_string(),
            ground_speed: 447.6,
            altitude: 36_000.0,
            altitude_change: 0.0,
            transponder: "4071".to_string(),
            transponder_mode: "N".to_string(),
            ..Default::default()
        };
        assert_eq!(
            data_block_lines(&pilot),
            vec!["BAW123", "M448", "A360", "N4071"]
        );
    }

    #[test]
    fn test_altitude_trend_arrows() {
        let mut pilot = Pilot {
            altitude: 5_000.0,
            altitude_change: 900.0,
            ..Default::default()
        };
        assert_eq!(altitude_text(&pilot), "A050 ▲N009");

        pilot.altitude_change = -1_200.0;
        assert_eq!(altitude_text(&pilot), "A050 ▼N012");

        // Level flight shows no trend.
        pilot.altitude_change = 80.0;
        assert_eq!(altitude_text(&pilot), "A050");
    }

    #[test]
    fn test_stationary_pilot_omits_speed_line() {
        let pilot = Pilot {
            callsign: "GLID1".to_string(),
            ..Default::default()
        };
        assert_eq!(data_block_lines(&pilot), vec!["GLID1", "A000"]);
    }

    #[test]
    fn test_snapshot_handle_feeds_the_layer() {
        let layer = layer_with(vec![]);
        let handle = layer.snapshot_handle();
        handle.lock().unwrap().pilots.push(Pilot::default());
        assert_eq!(layer.snapshot.lock().unwrap().pilots.len(), 1);
    }
}
