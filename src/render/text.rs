//! Glyph rasterization onto pixmaps.

use ab_glyph::{point, Font, FontArc, ScaleFont};
use tiny_skia::{Color, Pixmap, PremultipliedColorU8};

/// Advance width of `text` at `size` pixels, including kerning.
pub fn text_width(font: &FontArc, text: &str, size: f32) -> f32 {
    let scaled = font.as_scaled(size);
    let mut width = 0.0;
    let mut previous = None;
    for ch in text.chars() {
        let glyph = scaled.glyph_id(ch);
        if let Some(prev) = previous {
            width += scaled.kern(prev, glyph);
        }
        width += scaled.h_advance(glyph);
        previous = Some(glyph);
    }
    width
}

/// Draws `text` with its vertical midline at `y`. With `centered` the text
/// is also centred horizontally on `x`, otherwise `x` is the left edge.
pub fn draw_text(
    surface: &mut Pixmap,
    font: &FontArc,
    text: &str,
    x: f32,
    y: f32,
    size: f32,
    colour: Color,
    centered: bool,
) {
    if size <= 0.0 || text.is_empty() {
        return;
    }

    let scaled = font.as_scaled(size);
    let start_x = if centered {
        x - text_width(font, text, size) / 2.0
    } else {
        x
    };
    // Middle baseline: shift so ascent and descent straddle y.
    let baseline_y = y + (scaled.ascent() + scaled.descent()) / 2.0;

    let width = surface.width();
    let height = surface.height();

    let mut caret = start_x;
    let mut previous = None;
    for ch in text.chars() {
        let glyph_id = scaled.glyph_id(ch);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, glyph_id);
        }

        let glyph = glyph_id.with_scale_and_position(size, point(caret, baseline_y));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            let pixels = surface.pixels_mut();
            outlined.draw(|gx, gy, coverage| {
                let px = gx as i32 + bounds.min.x as i32;
                let py = gy as i32 + bounds.min.y as i32;
                if px < 0 || py < 0 || px as u32 >= width || py as u32 >= height {
                    return;
                }
                let alpha = coverage * colour.alpha();
                if alpha <= 0.0 {
                    return;
                }
                let idx = py as usize * width as usize + px as usize;
                pixels[idx] = blend_over(pixels[idx], colour, alpha);
            });
        }

        caret += scaled.h_advance(glyph_id);
        previous = Some(glyph_id);
    }
}

/// Source-over with a premultiplied destination pixel.
fn blend_over(dest: PremultipliedColorU8, colour: Color, alpha: f32) -> PremultipliedColorU8 {
    let src_r = colour.red() * alpha;
    let src_g = colour.green() * alpha;
    let src_b = colour.blue() * alpha;
    let inv = 1.0 - alpha;

    let to_u8 = |v: f32| (v * 255.0 + 0.5).min(255.0) as u8;
    let r = to_u8(src_r + dest.red() as f32 / 255.0 * inv);
    let g = to_u8(src_g + dest.green() as f32 / 255.0 * inv);
    let b = to_u8(src_b + dest.blue() as f32 / 255.0 * inv);
    let a = to_u8(alpha + dest.alpha() as f32 / 255.0 * inv);

    PremultipliedColorU8::from_rgba(r.min(a), g.min(a), b.min(a), a).unwrap_or(dest)
}
