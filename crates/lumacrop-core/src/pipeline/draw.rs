//! Stage 1: crop, scale and rounded-corner clip.

use image::imageops;
use image::{Rgba, RgbaImage};

use crate::decode::ImageView;
use crate::geometry::{Crop, Size};

use super::ResampleFilter;

/// Largest accepted rounding percent (a full ellipse).
pub const MAX_ROUNDING: f32 = 50.0;

/// Source rectangle for `crop`, clamped into the image. Falls back to the
/// whole image when the clamped rectangle is empty.
pub fn source_rect(crop: &Crop, image: Size) -> (u32, u32, u32, u32) {
    if crop.is_valid() {
        let x = crop.x.min(image.width);
        let y = crop.y.min(image.height);
        let w = crop.width.min(image.width - x);
        let h = crop.height.min(image.height - y);
        if w > 0 && h > 0 {
            return (x, y, w, h);
        }
    }
    (0, 0, image.width, image.height)
}

/// Draw the cropped source onto a fresh `target`-sized canvas.
pub fn crop_and_scale(
    source: &ImageView<'_>,
    crop: &Crop,
    target: Size,
    filter: ResampleFilter,
) -> RgbaImage {
    let (sw, sh) = source.dimensions();
    let (x, y, w, h) = source_rect(crop, Size::new(sw, sh));
    if w == 0 || h == 0 || target.is_empty() {
        tracing::debug!(?crop, ?target, "Skipping draw: empty geometry");
        return RgbaImage::new(target.width, target.height);
    }

    let region = copy_region(source, x, y, w, h);
    if (w, h) == (target.width, target.height) {
        return region;
    }
    imageops::resize(&region, target.width, target.height, filter.to_image_filter())
}

/// Owned copy of a sub-rectangle of a borrowed view.
fn copy_region(source: &ImageView<'_>, x: u32, y: u32, w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |dx, dy| *source.get_pixel(x + dx, y + dy))
}

/// Clip `image` to a rounded rectangle covering the whole canvas.
///
/// The corner radius is `min(w, h) / 2 * percent / 50`. Edge pixels get
/// fractional alpha from a one-pixel coverage ramp; pixels fully outside
/// become transparent black.
pub fn round_corners(mut image: RgbaImage, percent: f32) -> RgbaImage {
    let (w, h) = image.dimensions();
    if percent <= 0.0 || w == 0 || h == 0 {
        return image;
    }
    let pct = percent.min(MAX_ROUNDING) as f64;
    let (wf, hf) = (w as f64, h as f64);
    let radius = wf.min(hf) / 2.0 * pct / MAX_ROUNDING as f64;
    if radius <= 0.0 {
        return image;
    }

    let (cx, cy) = (wf / 2.0, hf / 2.0);
    let (inner_x, inner_y) = (cx - radius, cy - radius);

    for (x, y, px) in image.enumerate_pixels_mut() {
        let qx = ((x as f64 + 0.5) - cx).abs() - inner_x;
        let qy = ((y as f64 + 0.5) - cy).abs() - inner_y;
        // Only the corner regions can be outside
        if qx <= 0.0 || qy <= 0.0 {
            continue;
        }
        let distance = (qx * qx + qy * qy).sqrt() - radius;
        let coverage = (0.5 - distance).clamp(0.0, 1.0);
        if coverage <= 0.0 {
            *px = Rgba([0, 0, 0, 0]);
        } else if coverage < 1.0 {
            px[3] = (px[3] as f64 * coverage).round() as u8;
        }
    }
    image
}
