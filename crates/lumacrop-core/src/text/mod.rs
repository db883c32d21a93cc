//! Text measurement, wrapping and rasterization.
//!
//! Compositing talks to text through the [`TextRenderer`] trait so the
//! pipeline does not depend on any particular font source. [`FontBook`] is
//! the production implementation, backed by `ab_glyph` and fonts the host
//! registers at startup.

mod font;

pub use font::FontBook;

use image::{Rgba, RgbaImage};
use thiserror::Error;

use crate::overlay::Color;

/// Errors from text measurement or rendering.
#[derive(Debug, Error)]
pub enum TextError {
    #[error("No font registered")]
    NoFont,

    #[error("Invalid font data for '{family}': {message}")]
    InvalidFont { family: String, message: String },
}

/// Integer clip rectangle `(x, y, width, height)` on the canvas.
pub type ClipRect = (u32, u32, u32, u32);

/// One line of text to rasterize.
#[derive(Debug, Clone, Copy)]
pub struct TextLine<'a> {
    pub text: &'a str,
    /// CSS-style family list
    pub family: &'a str,
    /// Font size in canvas pixels
    pub size: f32,
    pub color: Color,
    /// Left edge of the line box
    pub x: f32,
    /// Top edge of the line box
    pub y: f32,
    /// Pixels outside this rectangle are never touched
    pub clip: ClipRect,
}

/// Measures and draws single lines of text.
pub trait TextRenderer {
    /// Advance width of `text` in pixels.
    fn measure(&self, family: &str, size: f32, text: &str) -> Result<f32, TextError>;

    /// Draw `line` onto `canvas` (top baseline), blending with source-over.
    fn draw_line(&self, canvas: &mut RgbaImage, line: &TextLine<'_>) -> Result<(), TextError>;
}

/// Greedy word wrap on single spaces.
///
/// Words are added to the current line while the line still fits
/// `max_width`; a word that does not fit starts a new line. A single word
/// wider than `max_width` is kept whole on its own line.
pub fn wrap_text(
    renderer: &dyn TextRenderer,
    family: &str,
    size: f32,
    text: &str,
    max_width: f32,
) -> Result<Vec<String>, TextError> {
    let mut words = text.split(' ');
    let mut lines = Vec::new();
    let mut current = words.next().unwrap_or_default().to_string();

    for word in words {
        let candidate = format!("{} {}", current, word);
        if renderer.measure(family, size, &candidate)? > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    lines.push(current);
    Ok(lines)
}

/// Source-over blend of `color` at `coverage` (0..=1) into `dst`.
pub(crate) fn blend_pixel(dst: &mut Rgba<u8>, color: Color, coverage: f32) {
    let sa = (color.a as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let mix = |s: u8, d: u8| {
        let v = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        v.clamp(0.0, 255.0).round() as u8
    };
    dst[0] = mix(color.r, dst[0]);
    dst[1] = mix(color.g, dst[1]);
    dst[2] = mix(color.b, dst[2]);
    dst[3] = (out_a * 255.0).clamp(0.0, 255.0).round() as u8;
}

#[inline]
pub(crate) fn in_clip(clip: ClipRect, x: i64, y: i64) -> bool {
    let (cx, cy, cw, ch) = clip;
    x >= cx as i64 && y >= cy as i64 && x < (cx + cw) as i64 && y < (cy + ch) as i64
}

#[cfg(test)]
pub(crate) mod testing {
    //! A font-free renderer: every character is a `size / 2` wide block.

    use super::*;

    pub struct BlockRenderer;

    impl TextRenderer for BlockRenderer {
        fn measure(&self, _family: &str, size: f32, text: &str) -> Result<f32, TextError> {
            Ok(text.chars().count() as f32 * size / 2.0)
        }

        fn draw_line(&self, canvas: &mut RgbaImage, line: &TextLine<'_>) -> Result<(), TextError> {
            let mut x = line.x;
            for ch in line.text.chars() {
                let advance = line.size / 2.0;
                if ch != ' ' {
                    let x0 = x.round() as i64;
                    let y0 = line.y.round() as i64;
                    for py in y0..y0 + line.size.round() as i64 {
                        for px in x0..x0 + advance.round() as i64 {
                            if in_clip(line.clip, px, py) {
                                let p = canvas.get_pixel_mut(px as u32, py as u32);
                                blend_pixel(p, line.color, 1.0);
                            }
                        }
                    }
                }
                x += advance;
            }
            Ok(())
        }
    }
}
