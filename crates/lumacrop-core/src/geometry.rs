//! Coordinate spaces and the conversions between them.
//!
//! Three pixel spaces are in play:
//!
//! - **Original**: absolute pixels of the decoded source image. Crops and
//!   overlays are always persisted here.
//! - **Display**: pixels of the interactive canvas. The crop is scaled
//!   isotropically to fit the container width.
//! - **Target**: pixels of a compositing pass (preview or export), sized
//!   independently of the display.
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner, x grows right, y grows down
//! - Display and target rectangles are relative to the crop origin
//! - Converting original → display → original reproduces a rectangle within
//!   rounding tolerance (±1px when the display scale is at least 1)

use serde::{Deserialize, Serialize};

/// Integer dimensions of an image or canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width / height, or `None` when the ratio is not usable.
    pub fn aspect_ratio(&self) -> Option<f64> {
        usable_ratio(self.width as f64, self.height as f64)
    }
}

/// A point in display space (pointer coordinates relative to the canvas).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Floating-point rectangle. Used for drafts (display space) and overlay
/// geometry (original space).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Axis-aligned rectangle spanned by two corner points, in any drag direction.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Inclusive containment test (edges count as inside).
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Round every component to the nearest integer.
    pub fn rounded(&self) -> Self {
        Self {
            x: self.x.round(),
            y: self.y.round(),
            width: self.width.round(),
            height: self.height.round(),
        }
    }
}

/// The persisted crop, in original-space integer pixels.
///
/// Invariant (maintained by [`Crop::clamp_to`]): fully inside the image and at
/// least 1x1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Crop {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Crop {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Crop covering the whole image.
    pub fn full(image: Size) -> Self {
        Self::new(0, 0, image.width, image.height)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn aspect_ratio(&self) -> Option<f64> {
        self.size().aspect_ratio()
    }

    pub fn as_rect(&self) -> Rect {
        Rect::new(
            self.x as f64,
            self.y as f64,
            self.width as f64,
            self.height as f64,
        )
    }

    /// Clamp into `image` bounds, keeping at least a 1x1 region.
    pub fn clamp_to(&self, image: Size) -> Self {
        if image.is_empty() {
            return *self;
        }
        let x = self.x.min(image.width - 1);
        let y = self.y.min(image.height - 1);
        let width = self.width.min(image.width - x).max(1);
        let height = self.height.min(image.height - y).max(1);
        Self::new(x, y, width, height)
    }
}

/// Size and scale of the interactive canvas for the current crop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayGeometry {
    pub width: u32,
    pub height: u32,
    /// Display pixels per original pixel (isotropic)
    pub scale: f64,
}

impl DisplayGeometry {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Compute the display canvas for `crop` shown in a container `container_width` wide.
///
/// The height follows the crop aspect ratio, falling back to the image aspect
/// ratio and then to 1:1 when the crop ratio is unusable. Returns `None` for a
/// non-positive container width.
pub fn display_geometry(crop: &Crop, image: Size, container_width: f64) -> Option<DisplayGeometry> {
    if !container_width.is_finite() || container_width <= 0.0 {
        return None;
    }

    let ratio = crop
        .aspect_ratio()
        .or_else(|| image.aspect_ratio())
        .unwrap_or(1.0);

    let width = container_width.round().max(1.0);
    let height = (width / ratio).round().max(1.0);

    let crop_width = if crop.width > 0 {
        crop.width as f64
    } else {
        image.width as f64
    };
    let scale = width / crop_width;
    let scale = if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    };

    Some(DisplayGeometry {
        width: width as u32,
        height: height as u32,
        scale,
    })
}

/// Integer rectangle in display or target space. May extend past the canvas
/// (negative origin or beyond the far edge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl PixelRect {
    pub fn right(&self) -> i64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i64 {
        self.y + self.height
    }

    /// True if the rectangle has no area.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// True if no part of the rectangle lands on a `canvas`-sized surface.
    pub fn is_outside(&self, canvas: Size) -> bool {
        self.right() <= 0
            || self.x >= canvas.width as i64
            || self.bottom() <= 0
            || self.y >= canvas.height as i64
    }

    /// The part of this rectangle that lies on the canvas, as `(x, y, w, h)`.
    pub fn intersect(&self, canvas: Size) -> Option<(u32, u32, u32, u32)> {
        let left = self.x.max(0);
        let top = self.y.max(0);
        let right = self.right().min(canvas.width as i64);
        let bottom = self.bottom().min(canvas.height as i64);
        if right <= left || bottom <= top {
            return None;
        }
        Some((
            left as u32,
            top as u32,
            (right - left) as u32,
            (bottom - top) as u32,
        ))
    }
}

/// Maps original-space rectangles into a scaled space anchored at a crop origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpaceMapping {
    pub origin_x: f64,
    pub origin_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl SpaceMapping {
    /// Mapping into display space (isotropic scale).
    pub fn display(crop: &Crop, scale: f64) -> Self {
        Self {
            origin_x: crop.x as f64,
            origin_y: crop.y as f64,
            scale_x: scale,
            scale_y: scale,
        }
    }

    /// Mapping into a `target`-sized compositing pass. Independent of any
    /// display scale. `None` for degenerate geometry.
    pub fn target(crop: &Crop, target: Size) -> Option<Self> {
        if !crop.is_valid() || target.is_empty() {
            return None;
        }
        Some(Self {
            origin_x: crop.x as f64,
            origin_y: crop.y as f64,
            scale_x: target.width as f64 / crop.width as f64,
            scale_y: target.height as f64 / crop.height as f64,
        })
    }

    /// `round((orig - origin) * scale)` per axis and dimension.
    pub fn map_rect(&self, rect: &Rect) -> PixelRect {
        PixelRect {
            x: ((rect.x - self.origin_x) * self.scale_x).round() as i64,
            y: ((rect.y - self.origin_y) * self.scale_y).round() as i64,
            width: (rect.width * self.scale_x).round() as i64,
            height: (rect.height * self.scale_y).round() as i64,
        }
    }

    /// Geometric mean of the two axis scales, used for font sizing.
    pub fn uniform_scale(&self) -> f64 {
        (self.scale_x * self.scale_y).sqrt()
    }
}

/// Original → display for a rectangle, given the current crop and scale.
pub fn original_to_display(rect: &Rect, crop: &Crop, scale: f64) -> PixelRect {
    SpaceMapping::display(crop, scale).map_rect(rect)
}

/// Display → original for an overlay rectangle, without rounding.
///
/// `origin` is the crop that was on screen when the rectangle was drawn.
pub fn display_to_original(draft: &Rect, origin: &Crop, scale: f64) -> Rect {
    Rect {
        x: origin.x as f64 + draft.x / scale,
        y: origin.y as f64 + draft.y / scale,
        width: draft.width / scale,
        height: draft.height / scale,
    }
}

/// Display → original for a crop draft: position clamped non-negative, size
/// at least 1, rounded, then clamped into the image.
///
/// Returns `None` when the scale is unusable or the draft is not finite.
pub fn crop_from_display(draft: &Rect, origin: &Crop, scale: f64, image: Size) -> Option<Crop> {
    if !scale.is_finite() || scale <= 0.0 || !draft.is_finite() {
        return None;
    }
    let rect = display_to_original(draft, origin, scale);
    let crop = Crop::new(
        rect.x.max(0.0).round() as u32,
        rect.y.max(0.0).round() as u32,
        rect.width.max(1.0).round() as u32,
        rect.height.max(1.0).round() as u32,
    );
    Some(crop.clamp_to(image))
}

/// Largest rectangle of `ratio` centered in a `width` x `height` canvas.
pub fn fit_centered(width: f64, height: f64, ratio: f64) -> Rect {
    let mut fit_w = width;
    let mut fit_h = height;
    if ratio > width / height {
        fit_h = fit_w / ratio;
    } else {
        fit_w = fit_h * ratio;
    }
    Rect::new((width - fit_w) / 2.0, (height - fit_h) / 2.0, fit_w, fit_h)
}

fn usable_ratio(width: f64, height: f64) -> Option<f64> {
    let ratio = width / height;
    (ratio.is_finite() && ratio > 0.0).then_some(ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_geometry_square() {
        let crop = Crop::new(0, 0, 100, 100);
        let geo = display_geometry(&crop, Size::new(400, 300), 200.0).unwrap();
        assert_eq!(geo.width, 200);
        assert_eq!(geo.height, 200);
        assert!((geo.scale - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_display_geometry_landscape() {
        let crop = Crop::new(10, 20, 300, 150);
        let geo = display_geometry(&crop, Size::new(1000, 1000), 600.0).unwrap();
        assert_eq!(geo.width, 600);
        assert_eq!(geo.height, 300);
        assert!((geo.scale - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_display_geometry_rejects_empty_container() {
        let crop = Crop::new(0, 0, 100, 100);
        assert!(display_geometry(&crop, Size::new(100, 100), 0.0).is_none());
        assert!(display_geometry(&crop, Size::new(100, 100), -5.0).is_none());
        assert!(display_geometry(&crop, Size::new(100, 100), f64::NAN).is_none());
    }

    #[test]
    fn test_display_geometry_falls_back_to_image_ratio() {
        let crop = Crop::new(0, 0, 50, 0);
        let geo = display_geometry(&crop, Size::new(200, 100), 400.0).unwrap();
        assert_eq!(geo.height, 200);
    }

    #[test]
    fn test_display_geometry_falls_back_to_square() {
        let crop = Crop::new(0, 0, 0, 0);
        let geo = display_geometry(&crop, Size::new(0, 0), 120.0).unwrap();
        assert_eq!(geo.width, 120);
        assert_eq!(geo.height, 120);
        assert!((geo.scale - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_crop_clamp_to_bounds() {
        let crop = Crop::new(90, 95, 50, 50).clamp_to(Size::new(100, 100));
        assert_eq!(crop, Crop::new(90, 95, 10, 5));

        let crop = Crop::new(200, 200, 10, 10).clamp_to(Size::new(100, 100));
        assert_eq!(crop, Crop::new(99, 99, 1, 1));
    }

    #[test]
    fn test_original_to_display() {
        let crop = Crop::new(100, 50, 200, 100);
        let rect = Rect::new(150.0, 75.0, 20.0, 10.0);
        let d = original_to_display(&rect, &crop, 2.0);
        assert_eq!(
            d,
            PixelRect {
                x: 100,
                y: 50,
                width: 40,
                height: 20
            }
        );
    }

    #[test]
    fn test_crop_from_display_offsets_from_session_origin() {
        let origin = Crop::new(100, 100, 400, 400);
        let draft = Rect::new(50.0, 20.0, 100.0, 60.0);
        let crop = crop_from_display(&draft, &origin, 0.5, Size::new(1000, 1000)).unwrap();
        assert_eq!(crop, Crop::new(200, 140, 200, 120));
    }

    #[test]
    fn test_crop_from_display_rejects_bad_scale() {
        let origin = Crop::new(0, 0, 10, 10);
        let draft = Rect::new(0.0, 0.0, 5.0, 5.0);
        assert!(crop_from_display(&draft, &origin, 0.0, Size::new(10, 10)).is_none());
        assert!(crop_from_display(&draft, &origin, f64::INFINITY, Size::new(10, 10)).is_none());
    }

    #[test]
    fn test_crop_from_display_stays_in_image() {
        let origin = Crop::new(0, 0, 100, 100);
        let draft = Rect::new(180.0, 180.0, 100.0, 100.0);
        let crop = crop_from_display(&draft, &origin, 2.0, Size::new(100, 100)).unwrap();
        assert!(crop.x + crop.width <= 100);
        assert!(crop.y + crop.height <= 100);
        assert!(crop.width >= 1 && crop.height >= 1);
    }

    #[test]
    fn test_rect_from_corners_any_direction() {
        let r = Rect::from_corners(Point::new(50.0, 40.0), Point::new(10.0, 80.0));
        assert_eq!(r, Rect::new(10.0, 40.0, 40.0, 40.0));
    }

    #[test]
    fn test_pixel_rect_intersection() {
        let canvas = Size::new(100, 50);
        let r = PixelRect {
            x: -10,
            y: 40,
            width: 30,
            height: 30,
        };
        assert_eq!(r.intersect(canvas), Some((0, 40, 20, 10)));
        assert!(!r.is_outside(canvas));

        let off = PixelRect {
            x: 100,
            y: 0,
            width: 10,
            height: 10,
        };
        assert!(off.is_outside(canvas));
        assert_eq!(off.intersect(canvas), None);
    }

    #[test]
    fn test_target_mapping_uses_target_width() {
        let crop = Crop::new(100, 0, 200, 100);
        let mapping = SpaceMapping::target(&crop, Size::new(800, 400)).unwrap();
        assert!((mapping.scale_x - 4.0).abs() < f64::EPSILON);
        assert!((mapping.scale_y - 4.0).abs() < f64::EPSILON);
        let r = mapping.map_rect(&Rect::new(110.0, 10.0, 5.0, 5.0));
        assert_eq!((r.x, r.y, r.width, r.height), (40, 40, 20, 20));
    }

    #[test]
    fn test_target_mapping_rejects_degenerate() {
        let crop = Crop::new(0, 0, 0, 10);
        assert!(SpaceMapping::target(&crop, Size::new(10, 10)).is_none());
        let crop = Crop::new(0, 0, 10, 10);
        assert!(SpaceMapping::target(&crop, Size::new(0, 10)).is_none());
    }

    #[test]
    fn test_fit_centered_wide_ratio() {
        let r = fit_centered(200.0, 200.0, 2.0);
        assert_eq!(r, Rect::new(0.0, 50.0, 200.0, 100.0));
    }

    #[test]
    fn test_fit_centered_tall_ratio() {
        let r = fit_centered(200.0, 100.0, 0.5);
        assert_eq!(r, Rect::new(75.0, 0.0, 50.0, 100.0));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
