//! `ab_glyph`-backed font registry.

use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use image::RgbaImage;

use super::{blend_pixel, in_clip, TextError, TextLine, TextRenderer};

/// Fonts registered by family name. The first registered font is the
/// fallback for families that are not present.
#[derive(Clone, Default)]
pub struct FontBook {
    fonts: Vec<(String, FontArc)>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("families", &self.families().collect::<Vec<_>>())
            .finish()
    }
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a TrueType/OpenType font under `family`. Re-registering a
    /// family replaces the earlier font.
    pub fn register(&mut self, family: &str, data: Vec<u8>) -> Result<(), TextError> {
        let font = FontArc::try_from_vec(data).map_err(|e| TextError::InvalidFont {
            family: family.to_string(),
            message: e.to_string(),
        })?;
        let key = normalize_family(family);
        match self.fonts.iter_mut().find(|(name, _)| *name == key) {
            Some(slot) => slot.1 = font,
            None => self.fonts.push((key, font)),
        }
        tracing::debug!(family, "Font registered");
        Ok(())
    }

    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.fonts.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Resolve a CSS-style family list (`"'Times New Roman', Times, serif"`)
    /// to the first registered match, falling back to the first font.
    pub fn resolve(&self, family_list: &str) -> Result<&FontArc, TextError> {
        family_list
            .split(',')
            .map(normalize_family)
            .find_map(|wanted| {
                self.fonts
                    .iter()
                    .find(|(name, _)| *name == wanted)
                    .map(|(_, font)| font)
            })
            .or_else(|| self.fonts.first().map(|(_, font)| font))
            .ok_or(TextError::NoFont)
    }
}

/// Lowercase and strip quotes/whitespace from one family name.
fn normalize_family(name: &str) -> String {
    name.trim()
        .trim_matches(|c| c == '\'' || c == '"')
        .trim()
        .to_lowercase()
}

/// Pixel scale that makes one em equal `size` pixels, as CSS font sizes do.
fn em_scale(font: &FontArc, size: f32) -> PxScale {
    let factor = font
        .units_per_em()
        .map(|upem| font.height_unscaled() / upem)
        .unwrap_or(1.0);
    PxScale::from(size * factor)
}

fn line_width(font: &FontArc, scale: PxScale, text: &str) -> f32 {
    let scaled = font.as_scaled(scale);
    let mut width = 0.0;
    let mut prev: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = prev {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    width
}

impl TextRenderer for FontBook {
    fn measure(&self, family: &str, size: f32, text: &str) -> Result<f32, TextError> {
        let font = self.resolve(family)?;
        Ok(line_width(font, em_scale(font, size), text))
    }

    fn draw_line(&self, canvas: &mut RgbaImage, line: &TextLine<'_>) -> Result<(), TextError> {
        let font = self.resolve(line.family)?;
        let scale = em_scale(font, line.size);
        let scaled = font.as_scaled(scale);
        let baseline = line.y + scaled.ascent();

        let mut x = line.x;
        let mut prev: Option<GlyphId> = None;
        for ch in line.text.chars() {
            let id = font.glyph_id(ch);
            if let Some(prev) = prev {
                x += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(scale, point(x, baseline));
            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    let px = bounds.min.x as i64 + gx as i64;
                    let py = bounds.min.y as i64 + gy as i64;
                    if in_clip(line.clip, px, py) {
                        blend_pixel(canvas.get_pixel_mut(px as u32, py as u32), line.color, coverage);
                    }
                });
            }
            x += scaled.h_advance(id);
            prev = Some(id);
        }
        Ok(())
    }
}
