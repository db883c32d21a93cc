//! Stage 5: blur-region and text overlays.
//!
//! Overlays render in stack order. A failing overlay is logged and skipped;
//! the rest still render.

use image::imageops;
use image::RgbaImage;
use thiserror::Error;

use crate::geometry::{PixelRect, Size, SpaceMapping};
use crate::overlay::{Overlay, OverlayKind, TextAlign, TextStyle, MIN_FONT_SIZE};
use crate::text::{wrap_text, TextError, TextLine, TextRenderer};

/// Line height as a multiple of the font size.
const LINE_HEIGHT: f32 = 1.2;

/// Errors from rendering a single overlay.
#[derive(Debug, Error)]
pub enum OverlayRenderError {
    #[error("No text renderer available")]
    NoTextRenderer,

    #[error("Text rendering failed: {0}")]
    Text(#[from] TextError),
}

/// Draw every overlay onto `canvas`.
pub fn render_overlays(
    mut canvas: RgbaImage,
    overlays: &[Overlay],
    mapping: &SpaceMapping,
    text: Option<&dyn TextRenderer>,
) -> RgbaImage {
    for overlay in overlays {
        let rect = mapping.map_rect(&overlay.rect);
        let result = match &overlay.kind {
            OverlayKind::Blur { intensity } => {
                blur_region(&mut canvas, rect, *intensity);
                Ok(())
            }
            OverlayKind::Text(style) => match text {
                Some(renderer) => {
                    draw_text(&mut canvas, rect, style, mapping.uniform_scale(), renderer)
                }
                None => Err(OverlayRenderError::NoTextRenderer),
            },
        };
        if let Err(e) = result {
            tracing::warn!(id = %overlay.id, error = %e, "Overlay render failed");
        }
    }
    canvas
}

/// Gaussian-blur the part of `rect` that lands on the canvas.
///
/// Radius is `avg(width, height) * intensity / 100`, at least 1px.
pub fn blur_region(canvas: &mut RgbaImage, rect: PixelRect, intensity: u8) {
    let (cw, ch) = canvas.dimensions();
    let size = Size::new(cw, ch);
    if rect.is_degenerate() || rect.is_outside(size) {
        tracing::debug!(?rect, "Skipping blur overlay outside canvas");
        return;
    }
    let Some((x, y, w, h)) = rect.intersect(size) else {
        return;
    };

    let average = (rect.width + rect.height) as f32 / 2.0;
    let radius = (average * intensity as f32 / 100.0).max(1.0);

    let region = imageops::crop_imm(canvas, x, y, w, h).to_image();
    let blurred = imageops::blur(&region, radius);
    imageops::replace(canvas, &blurred, x as i64, y as i64);
}

/// Word-wrap and draw a text overlay clipped to `rect`.
pub fn draw_text(
    canvas: &mut RgbaImage,
    rect: PixelRect,
    style: &TextStyle,
    scale: f64,
    renderer: &dyn TextRenderer,
) -> Result<(), OverlayRenderError> {
    let (cw, ch) = canvas.dimensions();
    let size = Size::new(cw, ch);
    if rect.is_degenerate() || rect.is_outside(size) {
        return Ok(());
    }
    let Some(clip) = rect.intersect(size) else {
        return Ok(());
    };

    let font_size = ((style.font_size as f64 * scale) as f32).max(MIN_FONT_SIZE);
    let box_width = rect.width as f32;
    let lines = wrap_text(renderer, &style.font_family, font_size, &style.text, box_width)?;
    let line_height = (font_size * LINE_HEIGHT).round();
    let bottom = rect.bottom() as f32;

    let mut y = rect.y as f32;
    for line in &lines {
        if y >= bottom {
            break;
        }
        let x = match style.align {
            TextAlign::Left => rect.x as f32,
            TextAlign::Center | TextAlign::Right => {
                let width = renderer.measure(&style.font_family, font_size, line)?;
                if style.align == TextAlign::Center {
                    rect.x as f32 + (box_width - width) / 2.0
                } else {
                    rect.x as f32 + box_width - width
                }
            }
        };
        renderer.draw_line(
            canvas,
            &TextLine {
                text: line,
                family: &style.font_family,
                size: font_size,
                color: style.color,
                x,
                y,
                clip,
            },
        )?;
        y += line_height;
    }
    Ok(())
}
