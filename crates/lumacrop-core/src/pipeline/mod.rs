//! The compositing pipeline.
//!
//! One deterministic pass turns a decoded image plus the editing state into
//! a bitmap of exactly the requested size. Stages run in a fixed order and
//! hand owned buffers to each other:
//!
//! 1. crop + scale + rounded-corner clip ([`draw`])
//! 2. filter and adjustments as one color matrix, or edge sketch
//! 3. sharpen or blur ([`convolve`])
//! 4. temperature and tint
//! 5. overlays ([`overlay`])
//!
//! The live preview and export both call [`composite`]; they differ only in
//! target size and [`ResampleFilter`].

pub mod convolve;
pub mod draw;
pub mod overlay;

pub use convolve::{edge_sketch, sharpen};
pub use draw::{crop_and_scale, round_corners, source_rect, MAX_ROUNDING};
pub use overlay::{render_overlays, OverlayRenderError};

use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::adjustments::{apply_white_balance, Adjustments};
use crate::decode::DecodedImage;
use crate::filter::{Filter, FilterOp};
use crate::geometry::{Crop, Size, SpaceMapping};
use crate::overlay::Overlay;
use crate::text::TextRenderer;

/// Blur sigma per unit of negative sharpness.
const SOFTEN_FACTOR: f32 = 0.03;

/// Resampling filter for the crop+scale stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleFilter {
    /// Nearest neighbor - fastest, pixelated
    Nearest,
    /// Bilinear - fast, used for the live preview
    #[default]
    Bilinear,
    /// Lanczos3 - slowest, used for export
    Lanczos3,
}

impl ResampleFilter {
    pub fn to_image_filter(self) -> FilterType {
        match self {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Bilinear => FilterType::Triangle,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Everything one compositing pass reads.
#[derive(Clone, Copy)]
pub struct CompositeRequest<'a> {
    pub image: &'a DecodedImage,
    pub crop: Crop,
    pub filter: Filter,
    pub adjustments: &'a Adjustments,
    pub overlays: &'a [Overlay],
    pub target: Size,
    /// Corner rounding percent, 0..=50
    pub rounding: f32,
    pub resample: ResampleFilter,
    /// Text overlays are skipped (and logged) without a renderer
    pub text: Option<&'a dyn TextRenderer>,
}

impl std::fmt::Debug for CompositeRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeRequest")
            .field("image", &self.image.size())
            .field("crop", &self.crop)
            .field("filter", &self.filter)
            .field("overlays", &self.overlays.len())
            .field("target", &self.target)
            .field("rounding", &self.rounding)
            .field("resample", &self.resample)
            .finish()
    }
}

/// Run every stage and return a `target`-sized RGBA bitmap.
///
/// Empty geometry never fails: the result is a transparent canvas of the
/// requested size (possibly 0x0).
#[tracing::instrument(
    skip_all,
    fields(
        target_w = request.target.width,
        target_h = request.target.height,
        filter = %request.filter,
        overlays = request.overlays.len(),
    )
)]
pub fn composite(request: &CompositeRequest<'_>) -> RgbaImage {
    let target = request.target;
    let Some(source) = request.image.view() else {
        tracing::debug!("Source buffer does not match its dimensions");
        return RgbaImage::new(target.width, target.height);
    };
    if target.is_empty() || request.image.is_empty() {
        tracing::debug!("Skipping composite: empty geometry");
        return RgbaImage::new(target.width, target.height);
    }

    // 1. Crop, scale, clip
    let canvas = crop_and_scale(&source, &request.crop, target, request.resample);
    let canvas = round_corners(canvas, request.rounding);

    // 2. Filter and adjustments
    let adjustments = request.adjustments.clamped();
    let canvas = match request.filter.operation() {
        FilterOp::EdgeSketch => edge_sketch(canvas),
        FilterOp::Color {
            matrix,
            blur_radius,
        } => {
            let canvas = match blur_radius {
                Some(sigma) => imageops::blur(&canvas, sigma),
                None => canvas,
            };
            matrix.then(&adjustments.color_matrix()).apply_image(canvas)
        }
    };

    // 3. Sharpness
    let canvas = soften_or_sharpen(canvas, adjustments.sharpness);

    // 4. Temperature and tint
    let mut canvas = canvas;
    apply_white_balance(&mut canvas, adjustments.temperature, adjustments.tint);

    // 5. Overlays
    if request.overlays.is_empty() {
        return canvas;
    }
    let crop = request.crop.clamp_to(request.image.size());
    match SpaceMapping::target(&crop, target) {
        Some(mapping) => render_overlays(canvas, request.overlays, &mapping, request.text),
        None => canvas,
    }
}

/// Positive sharpness runs the sharpen kernel; negative blurs.
fn soften_or_sharpen(image: RgbaImage, sharpness: f32) -> RgbaImage {
    if sharpness > 0.0 {
        sharpen(image, sharpness / 100.0)
    } else if sharpness < 0.0 {
        imageops::blur(&image, sharpness.abs() * SOFTEN_FACTOR)
    } else {
        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::overlay::{OverlayId, OverlayKind};
    use image::Rgba;

    /// Helper to create a horizontal gradient image
    fn gradient(width: u32, height: u32) -> DecodedImage {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 8 % 256) as u8, (y * 8 % 256) as u8, 128, 255])
        });
        DecodedImage::from_rgba_image(img)
    }

    fn solid(width: u32, height: u32, color: [u8; 4]) -> DecodedImage {
        DecodedImage::from_rgba_image(RgbaImage::from_pixel(width, height, Rgba(color)))
    }

    fn request<'a>(
        image: &'a DecodedImage,
        adjustments: &'a Adjustments,
        overlays: &'a [Overlay],
        target: Size,
    ) -> CompositeRequest<'a> {
        CompositeRequest {
            image,
            crop: Crop::full(image.size()),
            filter: Filter::None,
            adjustments,
            overlays,
            target,
            rounding: 0.0,
            resample: ResampleFilter::Bilinear,
            text: None,
        }
    }

    // ===== Resample Tests =====

    #[test]
    fn test_resample_mapping() {
        assert_eq!(ResampleFilter::Nearest.to_image_filter(), FilterType::Nearest);
        assert_eq!(ResampleFilter::Bilinear.to_image_filter(), FilterType::Triangle);
        assert_eq!(ResampleFilter::Lanczos3.to_image_filter(), FilterType::Lanczos3);
        assert_eq!(ResampleFilter::default(), ResampleFilter::Bilinear);
    }

    // ===== Composite Tests =====

    #[test]
    fn test_defaults_equal_plain_crop_and_scale() {
        let image = gradient(32, 16);
        let adjustments = Adjustments::default();
        let mut req = request(&image, &adjustments, &[], Size::new(16, 8));
        req.crop = Crop::new(4, 2, 20, 10);

        let out = composite(&req);
        let view = image.view().unwrap();
        let expected = crop_and_scale(&view, &req.crop, req.target, req.resample);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_output_has_target_size() {
        let image = gradient(40, 30);
        let adjustments = Adjustments::default();
        let out = composite(&request(&image, &adjustments, &[], Size::new(123, 7)));
        assert_eq!(out.dimensions(), (123, 7));
    }

    #[test]
    fn test_zero_target_is_empty() {
        let image = gradient(10, 10);
        let adjustments = Adjustments::default();
        let out = composite(&request(&image, &adjustments, &[], Size::new(0, 10)));
        assert_eq!(out.dimensions(), (0, 10));
    }

    #[test]
    fn test_mismatched_buffer_gives_blank_canvas() {
        let image = DecodedImage {
            width: 10,
            height: 10,
            pixels: vec![255; 12],
        };
        let adjustments = Adjustments::default();
        let out = composite(&request(&image, &adjustments, &[], Size::new(4, 4)));
        assert!(out.pixels().all(|p| *p == Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn test_sketch_on_flat_image_is_white() {
        let image = solid(12, 12, [90, 140, 30, 255]);
        let adjustments = Adjustments::default();
        let mut req = request(&image, &adjustments, &[], Size::new(12, 12));
        req.filter = Filter::Sketch;

        let out = composite(&req);
        for y in 1..11 {
            for x in 1..11 {
                assert_eq!(out.get_pixel(x, y), &Rgba([255, 255, 255, 255]));
            }
        }
    }

    #[test]
    fn test_sketch_ignores_adjustments() {
        let image = solid(8, 8, [90, 140, 30, 255]);
        let mut adjustments = Adjustments::default();
        adjustments.brightness = 50.0;
        let mut req = request(&image, &adjustments, &[], Size::new(8, 8));
        req.filter = Filter::Sketch;

        let out = composite(&req);
        assert_eq!(out.get_pixel(4, 4), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_invert_filter() {
        let image = solid(4, 4, [10, 20, 30, 255]);
        let adjustments = Adjustments::default();
        let mut req = request(&image, &adjustments, &[], Size::new(4, 4));
        req.filter = Filter::Invert;

        let out = composite(&req);
        assert_eq!(out.get_pixel(2, 2), &Rgba([245, 235, 225, 255]));
    }

    #[test]
    fn test_brightness_darkens() {
        let image = solid(4, 4, [200, 200, 200, 255]);
        let mut adjustments = Adjustments::default();
        adjustments.brightness = 50.0;
        let out = composite(&request(&image, &adjustments, &[], Size::new(4, 4)));
        assert_eq!(out.get_pixel(0, 0), &Rgba([100, 100, 100, 255]));
    }

    #[test]
    fn test_temperature_warms() {
        let image = solid(4, 4, [100, 100, 100, 255]);
        let mut adjustments = Adjustments::default();
        adjustments.temperature = 100.0;
        let out = composite(&request(&image, &adjustments, &[], Size::new(4, 4)));
        assert_eq!(out.get_pixel(1, 1), &Rgba([130, 100, 70, 255]));
    }

    #[test]
    fn test_negative_sharpness_blurs() {
        let image = gradient(32, 32);
        let adjustments = Adjustments::default();
        let sharp = composite(&request(&image, &adjustments, &[], Size::new(32, 32)));

        let mut soft_adjustments = Adjustments::default();
        soft_adjustments.sharpness = -100.0;
        let soft = composite(&request(&image, &soft_adjustments, &[], Size::new(32, 32)));
        assert_eq!(soft.dimensions(), (32, 32));
        assert_ne!(soft, sharp);
    }

    #[test]
    fn test_rounding_clears_corners() {
        let image = solid(20, 20, [255, 255, 255, 255]);
        let adjustments = Adjustments::default();
        let mut req = request(&image, &adjustments, &[], Size::new(20, 20));
        req.rounding = 50.0;

        let out = composite(&req);
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(10, 10)[3], 255);
    }

    #[test]
    fn test_overlay_outside_canvas_does_not_panic() {
        let image = gradient(20, 20);
        let adjustments = Adjustments::default();
        let overlays = vec![
            Overlay {
                id: OverlayId(1),
                rect: Rect::new(500.0, 500.0, 30.0, 30.0),
                kind: OverlayKind::Blur { intensity: 10 },
            },
            Overlay {
                id: OverlayId(2),
                rect: Rect::new(-40.0, -40.0, 30.0, 30.0),
                kind: OverlayKind::Blur { intensity: 10 },
            },
        ];
        let plain = composite(&request(&image, &adjustments, &[], Size::new(20, 20)));
        let out = composite(&request(&image, &adjustments, &overlays, Size::new(20, 20)));
        assert_eq!(out, plain);
    }

    #[test]
    fn test_overlay_maps_to_target_scale() {
        // Stripes so a blur is visible
        let img = RgbaImage::from_fn(40, 40, |x, _| {
            if x % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let image = DecodedImage::from_rgba_image(img);
        let adjustments = Adjustments::default();
        let overlays = vec![Overlay {
            id: OverlayId(1),
            rect: Rect::new(0.0, 0.0, 20.0, 20.0),
            kind: OverlayKind::Blur { intensity: 25 },
        }];
        let mut req = request(&image, &adjustments, &overlays, Size::new(80, 80));
        req.resample = ResampleFilter::Nearest;
        let out = composite(&req);

        let plain = {
            let mut r = req;
            r.overlays = &[];
            composite(&r)
        };
        // Overlay covers the top-left 40x40 of the 2x target
        assert_ne!(out.get_pixel(20, 20), plain.get_pixel(20, 20));
        assert_eq!(out.get_pixel(60, 60), plain.get_pixel(60, 60));
    }
}

// =============================================================================
// Property-Based Tests
// =============================================================================
