//! Interactive crop rectangle.
//!
//! The draft lives in display space. It can be dragged by its body or resized
//! from a single bottom-right handle, and stays inside the canvas at all
//! times. Confirming converts it back to original space relative to the crop
//! that was on screen when the session started.

use crate::config::EditorConfig;
use crate::geometry::{crop_from_display, fit_centered, Crop, DisplayGeometry, Point, Rect, Size};

/// The gesture currently driving the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropGesture {
    Drag,
    Resize,
}

#[derive(Debug, Clone, Copy)]
struct ActiveGesture {
    kind: CropGesture,
    start: Point,
    start_draft: Rect,
}

/// A live crop session.
#[derive(Debug, Clone)]
pub struct CropSession {
    origin: Crop,
    scale: f64,
    canvas_width: f64,
    canvas_height: f64,
    /// Target ratio when the aspect is locked
    locked_ratio: Option<f64>,
    draft: Rect,
    gesture: Option<ActiveGesture>,
    handle_size: f64,
    min_size: f64,
}

impl CropSession {
    /// Begin cropping `crop`, currently shown at `display`.
    ///
    /// `locked_ratio` is the target aspect ratio when the lock is on. Returns
    /// `None` if the canvas has no area or the scale is unusable.
    pub fn start(
        crop: Crop,
        display: &DisplayGeometry,
        locked_ratio: Option<f64>,
        config: &EditorConfig,
    ) -> Option<Self> {
        if display.width == 0 || display.height == 0 {
            tracing::warn!("Cannot start crop: canvas size is invalid");
            return None;
        }
        let scale = display.scale;
        if !scale.is_finite() || scale <= 0.0 {
            tracing::warn!(scale, "Cannot start crop: invalid scale");
            return None;
        }

        let mut session = Self {
            origin: crop,
            scale,
            canvas_width: display.width as f64,
            canvas_height: display.height as f64,
            locked_ratio: locked_ratio.filter(|r| r.is_finite() && *r > 0.0),
            draft: Rect::default(),
            gesture: None,
            handle_size: config.crop_handle_size,
            min_size: config.min_crop_size,
        };
        session.draft = session.seed();
        Some(session)
    }

    /// Initial draft: the largest centered rectangle of the locked ratio, or
    /// the full canvas.
    fn seed(&self) -> Rect {
        let raw = match self.locked_ratio {
            Some(ratio) => fit_centered(self.canvas_width, self.canvas_height, ratio),
            None => Rect::new(0.0, 0.0, self.canvas_width, self.canvas_height),
        };
        let x = raw.x.round();
        let y = raw.y.round();
        let width = raw
            .width
            .min(self.canvas_width - x)
            .max(self.min_size)
            .min(self.canvas_width)
            .round();
        let height = raw
            .height
            .min(self.canvas_height - y)
            .max(self.min_size)
            .min(self.canvas_height)
            .round();
        Rect::new(
            x.min(self.canvas_width - width).max(0.0),
            y.min(self.canvas_height - height).max(0.0),
            width,
            height,
        )
    }

    /// Change the locked ratio mid-session. The draft is re-seeded and any
    /// gesture in flight is dropped.
    pub fn set_locked_ratio(&mut self, locked_ratio: Option<f64>) {
        self.locked_ratio = locked_ratio.filter(|r| r.is_finite() && *r > 0.0);
        self.gesture = None;
        self.draft = self.seed();
    }

    pub fn draft(&self) -> Rect {
        self.draft
    }

    /// The crop that was on screen when the session began.
    pub fn origin(&self) -> Crop {
        self.origin
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn gesture(&self) -> Option<CropGesture> {
        self.gesture.map(|g| g.kind)
    }

    pub fn is_capturing(&self) -> bool {
        self.gesture.is_some()
    }

    /// Hit box of the resize handle: `2 * handle_size` square, centered
    /// `handle_size / 2` inside the bottom-right corner.
    pub fn handle_hit_box(&self) -> Rect {
        let cx = self.draft.right() - self.handle_size / 2.0;
        let cy = self.draft.bottom() - self.handle_size / 2.0;
        Rect::new(
            cx - self.handle_size,
            cy - self.handle_size,
            self.handle_size * 2.0,
            self.handle_size * 2.0,
        )
    }

    /// Start a resize (handle) or drag (body). Returns the gesture started,
    /// or `None` when the point misses both.
    pub fn pointer_down(&mut self, point: Point) -> Option<CropGesture> {
        let kind = if self.handle_hit_box().contains(point) {
            CropGesture::Resize
        } else if self.draft.contains(point) {
            CropGesture::Drag
        } else {
            return None;
        };
        self.gesture = Some(ActiveGesture {
            kind,
            start: point,
            start_draft: self.draft,
        });
        Some(kind)
    }

    /// Update the draft for the current gesture. Returns false when no
    /// gesture is active.
    pub fn pointer_move(&mut self, point: Point) -> bool {
        let Some(gesture) = self.gesture else {
            return false;
        };
        let dx = point.x - gesture.start.x;
        let dy = point.y - gesture.start.y;
        let next = match gesture.kind {
            CropGesture::Drag => self.dragged(&gesture.start_draft, dx, dy),
            CropGesture::Resize => self.resized(&gesture.start_draft, dx, dy),
        };
        self.draft = next.rounded();
        true
    }

    /// End the current gesture. Returns true if one was active.
    pub fn pointer_up(&mut self) -> bool {
        self.gesture.take().is_some()
    }

    fn dragged(&self, start: &Rect, dx: f64, dy: f64) -> Rect {
        let max_x = (self.canvas_width - start.width).max(0.0);
        let max_y = (self.canvas_height - start.height).max(0.0);
        Rect::new(
            (start.x + dx).clamp(0.0, max_x),
            (start.y + dy).clamp(0.0, max_y),
            start.width,
            start.height,
        )
    }

    fn resized(&self, start: &Rect, dx: f64, dy: f64) -> Rect {
        let min = self.min_size;
        let avail_w = self.canvas_width - start.x;
        let avail_h = self.canvas_height - start.y;

        let (width, height) = match self.locked_ratio {
            Some(ratio) => {
                // Width drives; the floor applies to both axes.
                let min_w = min.max(min * ratio);
                let mut w = (start.width + dx).max(min_w);
                let mut h = w / ratio;
                if h > avail_h {
                    h = avail_h;
                    w = h * ratio;
                }
                if w > avail_w {
                    w = avail_w;
                    h = w / ratio;
                }
                if w < min_w {
                    w = min_w;
                    h = w / ratio;
                }
                (w, h)
            }
            None => (
                (start.width + dx).min(avail_w).max(min),
                (start.height + dy).min(avail_h).max(min),
            ),
        };

        // The floor may not fit beside the anchor; never exceed the canvas.
        let width = width.min(self.canvas_width);
        let height = height.min(self.canvas_height);
        let x = start.x.min(self.canvas_width - width).max(0.0);
        let y = start.y.min(self.canvas_height - height).max(0.0);
        Rect::new(x, y, width, height)
    }

    /// Convert the draft to an original-space crop clamped into `image`.
    ///
    /// Returns `None` (equivalent to cancelling) when the draft or scale is
    /// unusable.
    pub fn confirm(self, image: Size) -> Option<Crop> {
        if self.draft.width <= 0.0 || self.draft.height <= 0.0 {
            return None;
        }
        let crop = crop_from_display(&self.draft, &self.origin, self.scale, image);
        match crop {
            Some(crop) => tracing::debug!(?crop, "Crop confirmed"),
            None => tracing::debug!("Crop confirm rejected"),
        }
        crop
    }

    /// Discard the draft.
    pub fn cancel(self) {
        tracing::debug!("Crop cancelled");
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
